//! The process-wide application object.
//!
//! An [`Application`] binds the windowing driver, settings engine,
//! preference store, storage roots and platform services together and owns
//! the run/quit lifecycle. It is created once per process; construction
//! registers it as the current application for the rest of the toolkit to
//! look up via [`current`].
//!
//! # Example
//!
//! ```ignore
//! use atrium_app::Application;
//!
//! let app = Application::new(driver, "org.example.editor");
//! app.new_window("Editor");
//! app.run(); // blocks until quit
//! ```

use std::process::Command;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use atrium_core::logging::targets;
use atrium_core::{Driver, Notification, Resource, ThemeVariant, Window};
use parking_lot::{Mutex, RwLock};

use crate::platform::{self, PlatformError, PlatformShim, ThemeWatchHandle};
use crate::preferences::Preferences;
use crate::settings::{Settings, SettingsSnapshot};
use crate::storage::Storage;

/// Builds the `Command` used for platform subprocess launches. Injectable
/// so tests can substitute the real openers and script hosts.
pub type CommandFactory = Arc<dyn Fn(&str, &[&str]) -> Command + Send + Sync>;

/// The current application for this process, last writer wins.
static CURRENT: RwLock<Option<Arc<Application>>> = RwLock::new(None);

/// The application most recently constructed in this process, if any.
///
/// Prefer passing the [`Application`] to the code that needs it; this
/// registry exists for toolkit components without an injection path.
pub fn current() -> Option<Arc<Application>> {
    CURRENT.read().clone()
}

fn set_current(app: &Arc<Application>) {
    *CURRENT.write() = Some(Arc::clone(app));
}

/// The run/quit lifecycle. Transitions only happen under the lifecycle
/// mutex; anything outside the two defined edges is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
}

/// The process-wide application object.
pub struct Application {
    name: RwLock<String>,
    icon: RwLock<Option<Resource>>,
    unique_id: RwLock<String>,
    lifecycle: Mutex<Lifecycle>,
    driver: Arc<dyn Driver>,
    settings: Arc<Settings>,
    preferences: Arc<Preferences>,
    storage: Storage,
    shim: Box<dyn PlatformShim>,
    exec: CommandFactory,
    theme_watch: Mutex<Option<ThemeWatchHandle>>,
}

impl Application {
    /// Create the application for this process.
    ///
    /// `id` should be a stable reverse-domain identifier; preferences only
    /// persist when it is non-empty. The new application is registered as
    /// the process-wide current application, its settings listener is
    /// started, and on non-mobile devices the settings file watcher and the
    /// platform theme watcher come up.
    pub fn new(driver: Arc<dyn Driver>, id: impl Into<String>) -> Arc<Self> {
        Self::build(
            driver,
            id.into(),
            platform::native_shim(),
            default_command_factory(),
        )
    }

    /// Create an application without a unique identifier.
    ///
    /// Preferences will not persist; prefer [`Application::new`] with a
    /// stable id.
    pub fn new_default(driver: Arc<dyn Driver>) -> Arc<Self> {
        tracing::info!(
            target: targets::APP,
            "applications should be created with a unique ID, preferences will not persist"
        );
        Self::new(driver, "")
    }

    /// Create the application with a custom subprocess command factory.
    /// Used to mock URL openers and script hosts.
    pub fn with_command_factory(
        driver: Arc<dyn Driver>,
        id: impl Into<String>,
        exec: CommandFactory,
    ) -> Arc<Self> {
        Self::build(driver, id.into(), platform::native_shim(), exec)
    }

    fn build(
        driver: Arc<dyn Driver>,
        id: String,
        shim: Box<dyn PlatformShim>,
        exec: CommandFactory,
    ) -> Arc<Self> {
        let settings = Arc::new(Settings::load());
        let preferences = Arc::new(Preferences::new(&id));
        if !id.is_empty() {
            preferences.load();
        }

        let app = Arc::new_cyclic(|weak: &Weak<Application>| Application {
            name: RwLock::new(String::new()),
            icon: RwLock::new(None),
            unique_id: RwLock::new(id),
            lifecycle: Mutex::new(Lifecycle::Idle),
            storage: Storage::new(weak.clone()),
            driver,
            settings,
            preferences,
            shim,
            exec,
            theme_watch: Mutex::new(None),
        });
        set_current(&app);

        // The settings listener runs for the life of the process and is
        // never joined. Its rendezvous channel stays registered so every
        // reload blocks until the snapshot has been applied.
        let (sender, receiver) = crossbeam_channel::bounded(0);
        let _ = app.settings.add_change_listener(sender);
        let weak = Arc::downgrade(&app);
        let spawned = thread::Builder::new()
            .name("atrium-settings-apply".into())
            .spawn(move || {
                while let Ok(snapshot) = receiver.recv() {
                    let Some(app) = weak.upgrade() else { break };
                    app.apply_settings(&snapshot);
                }
            });
        if let Err(err) = spawned {
            tracing::error!(
                target: targets::APP,
                %err,
                "could not start the settings listener thread"
            );
        }

        if !app.driver.device().is_mobile() {
            Arc::clone(&app.settings).watch();
            *app.theme_watch.lock() = app.shim.watch_theme(&app.settings);
        }

        app
    }

    /// The application display name.
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Set the application display name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// The application icon, if one was set.
    pub fn icon(&self) -> Option<Resource> {
        self.icon.read().clone()
    }

    /// Set the application icon.
    pub fn set_icon(&self, icon: Resource) {
        *self.icon.write() = Some(icon);
    }

    /// The unique application identifier.
    ///
    /// If none was configured a stand-in is synthesized from the current
    /// unix timestamp, logged as an error, and cached, so repeated calls
    /// return the same value for the life of this application.
    pub fn unique_id(&self) -> String {
        {
            let id = self.unique_id.read();
            if !id.is_empty() {
                return id.clone();
            }
        }
        let mut id = self.unique_id.write();
        if id.is_empty() {
            tracing::error!(
                target: targets::APP,
                "the preferences API requires a unique ID, construct the application with one"
            );
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default();
            // A stand-in, not globally unique; it only has to avoid reuse.
            *id = format!("missing-id-{timestamp}");
        }
        id.clone()
    }

    /// Create a new window through the driver.
    pub fn new_window(&self, title: &str) -> Arc<dyn Window> {
        self.driver.create_window(title)
    }

    /// Run the application.
    ///
    /// Blocks in the driver's event loop until [`Application::quit`] is
    /// called. Calling `run` while already running returns immediately.
    pub fn run(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle == Lifecycle::Running {
                tracing::debug!(target: targets::APP, "run called while already running");
                return;
            }
            *lifecycle = Lifecycle::Running;
        }
        tracing::info!(target: targets::APP, "entering the driver event loop");
        self.driver.run();
    }

    /// Quit the application.
    ///
    /// Every open window is closed before the driver's event loop is
    /// stopped, so window close hooks still observe a running application.
    /// The settings and theme watchers are then stopped and the lifecycle
    /// returns to idle.
    pub fn quit(&self) {
        for window in self.driver.all_windows() {
            window.close();
        }
        self.driver.quit();
        self.settings.stop_watching();
        if let Some(watch) = self.theme_watch.lock().take() {
            watch.stop();
        }
        *self.lifecycle.lock() = Lifecycle::Idle;
        tracing::info!(target: targets::APP, "application quit");
    }

    /// The windowing driver.
    pub fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }

    /// The application settings.
    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    /// The application storage roots.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The application preference store.
    pub fn preferences(&self) -> Arc<Preferences> {
        if self.unique_id.read().is_empty() {
            tracing::error!(
                target: targets::APP,
                "the preferences API requires a unique ID, construct the application with one"
            );
        }
        Arc::clone(&self.preferences)
    }

    /// Open `url` with the OS-appropriate opener.
    ///
    /// Only a failure to launch the opener is returned; its exit status is
    /// not observed.
    pub fn open_url(&self, url: &str) -> Result<(), PlatformError> {
        self.shim.open_url(self, url)
    }

    /// Deliver a notification through the platform's native mechanism.
    ///
    /// Fire and forget: delivery happens on its own thread and failures are
    /// logged, never surfaced.
    pub fn send_notification(&self, notification: &Notification) {
        self.shim.send_notification(self, notification);
    }

    /// The theme variant windows should currently render with: the
    /// configured variant, or the OS preference when following the system.
    pub fn effective_theme_variant(&self) -> ThemeVariant {
        self.resolve_variant(self.settings.theme_variant())
    }

    pub(crate) fn command_factory(&self) -> &CommandFactory {
        &self.exec
    }

    fn resolve_variant(&self, variant: ThemeVariant) -> ThemeVariant {
        match variant {
            ThemeVariant::UseSystem => self.shim.default_variant(),
            configured => configured,
        }
    }

    fn apply_settings(&self, snapshot: &SettingsSnapshot) {
        let variant = self.resolve_variant(snapshot.theme_variant);
        for window in self.driver.all_windows() {
            window.apply_appearance(variant, snapshot.scale);
        }
        tracing::debug!(
            target: targets::APP,
            %variant,
            scale = %snapshot.scale,
            "applied settings to open windows"
        );
    }
}

fn default_command_factory() -> CommandFactory {
    Arc::new(|program, args| {
        let mut command = Command::new(program);
        command.args(args);
        command
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use atrium_core::Device;
    use crossbeam_channel::{unbounded, Receiver, Sender};

    /// Construction mutates the process-wide registry, so tests that build
    /// applications run one at a time.
    fn app_guard() -> parking_lot::MutexGuard<'static, ()> {
        static GUARD: Mutex<()> = Mutex::new(());
        GUARD.lock()
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum DriverEvent {
        WindowClosed(String),
        Quit,
    }

    struct MockDevice {
        mobile: bool,
    }

    impl Device for MockDevice {
        fn is_mobile(&self) -> bool {
            self.mobile
        }
    }

    struct MockWindow {
        title: Mutex<String>,
        log: Arc<Mutex<Vec<DriverEvent>>>,
        appearance: Mutex<Option<(ThemeVariant, f32)>>,
    }

    impl Window for MockWindow {
        fn title(&self) -> String {
            self.title.lock().clone()
        }

        fn set_title(&self, title: &str) {
            *self.title.lock() = title.to_string();
        }

        fn close(&self) {
            self.log
                .lock()
                .push(DriverEvent::WindowClosed(self.title()));
        }

        fn apply_appearance(&self, variant: ThemeVariant, scale: f32) {
            *self.appearance.lock() = Some((variant, scale));
        }
    }

    struct MockDriver {
        windows: Mutex<Vec<Arc<MockWindow>>>,
        log: Arc<Mutex<Vec<DriverEvent>>>,
        device: MockDevice,
        run_calls: AtomicUsize,
        quit_tx: Sender<()>,
        quit_rx: Receiver<()>,
    }

    impl MockDriver {
        /// A driver reporting a mobile device, so construction does not
        /// start watchers against the real user config directory.
        fn mobile() -> Arc<Self> {
            let (quit_tx, quit_rx) = unbounded();
            Arc::new(Self {
                windows: Mutex::new(Vec::new()),
                log: Arc::new(Mutex::new(Vec::new())),
                device: MockDevice { mobile: true },
                run_calls: AtomicUsize::new(0),
                quit_tx,
                quit_rx,
            })
        }
    }

    impl Driver for MockDriver {
        fn create_window(&self, title: &str) -> Arc<dyn Window> {
            let window = Arc::new(MockWindow {
                title: Mutex::new(title.to_string()),
                log: Arc::clone(&self.log),
                appearance: Mutex::new(None),
            });
            self.windows.lock().push(Arc::clone(&window));
            window
        }

        fn all_windows(&self) -> Vec<Arc<dyn Window>> {
            self.windows
                .lock()
                .iter()
                .map(|window| Arc::clone(window) as Arc<dyn Window>)
                .collect()
        }

        fn run(&self) {
            self.run_calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.quit_rx.recv();
        }

        fn quit(&self) {
            self.log.lock().push(DriverEvent::Quit);
            let _ = self.quit_tx.send(());
        }

        fn device(&self) -> &dyn Device {
            &self.device
        }
    }

    #[test]
    fn name_and_icon_accessors() {
        let _guard = app_guard();
        let app = Application::new(MockDriver::mobile() as Arc<dyn Driver>, "accessor-test");

        assert_eq!(app.name(), "");
        app.set_name("My Editor");
        assert_eq!(app.name(), "My Editor");

        assert!(app.icon().is_none());
        app.set_icon(Resource::new("icon.png", vec![1, 2, 3]));
        assert_eq!(app.icon().unwrap().name(), "icon.png");
    }

    #[test]
    fn missing_unique_id_is_synthesized_once() {
        let _guard = app_guard();
        let app = Application::new(MockDriver::mobile() as Arc<dyn Driver>, "");

        let first = app.unique_id();
        let second = app.unique_id();
        assert!(first.starts_with("missing-id-"));
        assert_eq!(first, second);
    }

    #[test]
    fn configured_unique_id_is_returned_verbatim() {
        let _guard = app_guard();
        let app = Application::new(MockDriver::mobile() as Arc<dyn Driver>, "org.example.app");
        assert_eq!(app.unique_id(), "org.example.app");
    }

    #[test]
    fn construction_registers_the_current_application() {
        let _guard = app_guard();
        let app = Application::new(MockDriver::mobile() as Arc<dyn Driver>, "registry-test");
        let registered = current().expect("an application was just constructed");
        assert!(Arc::ptr_eq(&app, &registered));
    }

    #[test]
    fn run_twice_enters_the_driver_loop_once() {
        let _guard = app_guard();
        let driver = MockDriver::mobile();
        let app = Application::new(Arc::clone(&driver) as Arc<dyn Driver>, "run-twice-test");

        let runner = {
            let app = Arc::clone(&app);
            thread::spawn(move || app.run())
        };
        while driver.run_calls.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        // The loop is live, so this must be a silent no-op.
        app.run();
        assert_eq!(driver.run_calls.load(Ordering::SeqCst), 1);

        app.quit();
        runner.join().unwrap();
        assert_eq!(driver.run_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_after_quit_enters_the_loop_again() {
        let _guard = app_guard();
        let driver = MockDriver::mobile();
        let app = Application::new(Arc::clone(&driver) as Arc<dyn Driver>, "rerun-test");

        // quit() returns the lifecycle to idle and leaves a buffered quit
        // for the mock loop, so run() starts and returns immediately.
        app.quit();
        app.run();
        assert_eq!(driver.run_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quit_closes_windows_before_stopping_the_driver() {
        let _guard = app_guard();
        let driver = MockDriver::mobile();
        let app = Application::new(Arc::clone(&driver) as Arc<dyn Driver>, "quit-order-test");
        app.new_window("one");
        app.new_window("two");

        app.quit();

        let log = driver.log.lock().clone();
        assert_eq!(
            log,
            vec![
                DriverEvent::WindowClosed("one".to_string()),
                DriverEvent::WindowClosed("two".to_string()),
                DriverEvent::Quit,
            ]
        );
    }

    #[test]
    fn preferences_without_id_stay_in_memory() {
        let _guard = app_guard();
        let app = Application::new(MockDriver::mobile() as Arc<dyn Driver>, "");

        let prefs = app.preferences();
        prefs.set_bool("flag", true);
        assert!(prefs.bool("flag"));
    }

    #[test]
    fn settings_changes_reach_open_windows() {
        let _guard = app_guard();
        let driver = MockDriver::mobile();
        let app = Application::new(Arc::clone(&driver) as Arc<dyn Driver>, "fanout-test");
        app.new_window("main");

        app.settings().reload();

        let window = Arc::clone(&driver.windows.lock()[0]);
        let deadline = Instant::now() + Duration::from_secs(5);
        while window.appearance.lock().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        let applied = (*window.appearance.lock()).expect("settings were applied");
        assert!(applied.1 > 0.0);
    }

    #[test]
    fn storage_paths_include_the_application_id() {
        let _guard = app_guard();
        let app = Application::new(MockDriver::mobile() as Arc<dyn Driver>, "storage-test");

        let documents = app.storage().documents_path().unwrap();
        assert!(documents.ends_with(Path::new("storage/storage-test/documents")));

        let cache = app.storage().cache_path().unwrap();
        assert!(cache.ends_with(Path::new("atrium/storage-test")));
    }

    #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
    #[test]
    fn open_url_goes_through_the_command_factory() {
        let _guard = app_guard();
        let recorded: Arc<Mutex<Vec<(String, Vec<String>)>>> = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::clone(&recorded);
        let factory: CommandFactory = Arc::new(move |program, args| {
            calls.lock().push((
                program.to_string(),
                args.iter().map(|arg| arg.to_string()).collect(),
            ));
            if cfg!(windows) {
                let mut command = Command::new("cmd");
                command.args(["/C", "exit 0"]);
                command
            } else {
                let mut command = Command::new("sh");
                command.args(["-c", "true"]);
                command
            }
        });

        let app = Application::with_command_factory(
            MockDriver::mobile() as Arc<dyn Driver>,
            "url-test",
            factory,
        );
        app.open_url("https://example.org").unwrap();

        let calls = recorded.lock();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.iter().any(|arg| arg == "https://example.org"));
    }

    #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
    #[test]
    fn open_url_surfaces_launch_failure() {
        let _guard = app_guard();
        let factory: CommandFactory =
            Arc::new(|_, _| Command::new("atrium-test-missing-opener"));
        let app = Application::with_command_factory(
            MockDriver::mobile() as Arc<dyn Driver>,
            "url-failure-test",
            factory,
        );

        let err = app.open_url("https://example.org").unwrap_err();
        assert!(!err.is_unsupported_platform());
    }
}
