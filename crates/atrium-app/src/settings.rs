//! The global settings engine.
//!
//! Settings are loaded from a per-user JSON config file and exposed as a
//! typed snapshot: theme variant, UI scale, icon theme and build type. A
//! missing, unreadable or corrupt file is never an error; it is equivalent
//! to the defaults and logged.
//!
//! Components interested in live changes register a rendezvous channel with
//! [`Settings::add_change_listener`]; every successful reload sends exactly
//! one snapshot per registered listener. [`Settings::watch`] starts a
//! debounced file watcher over the config file so external edits are picked
//! up while the application runs.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs, thread};

use atrium_core::logging::targets;
use atrium_core::{BuildType, ThemeVariant};
use crossbeam_channel::Sender;
use directories::BaseDirs;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, Debouncer};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Debounce window for coalescing rapid config file writes.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(100);

/// The per-user root for Atrium configuration files.
///
/// Resolves under the platform's conventional config directory (on the
/// Windows family this lands in `AppData\Roaming`). Falls back to the
/// system temp dir when no home directory can be determined.
pub fn config_root() -> PathBuf {
    match BaseDirs::new() {
        Some(dirs) => dirs.config_dir().join("atrium"),
        None => {
            tracing::warn!(
                target: targets::SETTINGS,
                "no home directory could be determined, falling back to the temp dir"
            );
            env::temp_dir().join("atrium")
        }
    }
}

/// Identifies a registered settings change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An immutable view of the settings at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot {
    /// The configured theme preference. `UseSystem` is resolved against the
    /// OS preference by the application when applied to windows.
    pub theme_variant: ThemeVariant,
    /// The UI scale factor.
    pub scale: f32,
    /// The preferred icon theme name, if the user configured one.
    pub icon_theme: Option<String>,
    /// How the running binary was built.
    pub build_type: BuildType,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            theme_variant: ThemeVariant::UseSystem,
            scale: 1.0,
            icon_theme: None,
            build_type: BuildType::current(),
        }
    }
}

/// On-disk schema of the settings file. Unknown fields are ignored so that
/// newer toolkit versions can extend the file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    scale: Option<f32>,
    #[serde(default)]
    icon_theme: Option<String>,
}

/// The settings engine owned by the application object.
pub struct Settings {
    data: RwLock<SettingsSnapshot>,
    path: PathBuf,
    listeners: Mutex<HashMap<u64, Sender<SettingsSnapshot>>>,
    next_listener: AtomicU64,
    watcher: Mutex<Option<Debouncer<RecommendedWatcher>>>,
}

impl Settings {
    /// Load settings from the default per-user config file.
    pub(crate) fn load() -> Self {
        Self::with_path(config_root().join("settings.json"))
    }

    /// Load settings backed by an explicit file path.
    pub(crate) fn with_path(path: PathBuf) -> Self {
        let snapshot = Self::read_snapshot(&path);
        Self {
            data: RwLock::new(snapshot),
            path,
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
            watcher: Mutex::new(None),
        }
    }

    /// The configured theme preference.
    pub fn theme_variant(&self) -> ThemeVariant {
        self.data.read().theme_variant
    }

    /// The UI scale factor.
    pub fn scale(&self) -> f32 {
        self.data.read().scale
    }

    /// The preferred icon theme name, if any.
    pub fn icon_theme(&self) -> Option<String> {
        self.data.read().icon_theme.clone()
    }

    /// How the running binary was built.
    pub fn build_type(&self) -> BuildType {
        self.data.read().build_type
    }

    /// A copy of the current settings.
    pub fn snapshot(&self) -> SettingsSnapshot {
        self.data.read().clone()
    }

    /// Register a channel to receive a full snapshot on every reload.
    ///
    /// Sends are synchronous: the reloader blocks until the listener's
    /// thread receives, so listeners must always be ready. A listener whose
    /// receiving side has been dropped is removed at the next dispatch.
    pub fn add_change_listener(&self, listener: Sender<SettingsSnapshot>) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, listener);
        ListenerId(id)
    }

    /// Unregister a previously added change listener.
    ///
    /// Listeners that stop receiving must unregister, otherwise dispatch
    /// would keep a dead channel alive. Unknown ids are a silent no-op.
    pub fn remove_change_listener(&self, id: ListenerId) {
        if self.listeners.lock().remove(&id.0).is_none() {
            tracing::debug!(
                target: targets::SETTINGS,
                listener = id.0,
                "remove_change_listener called with an unknown listener"
            );
        }
    }

    /// Start watching the backing file for external changes.
    ///
    /// A detected change re-parses the file and pushes the new snapshot to
    /// every registered listener. Calling this while already watching is a
    /// no-op. Watcher setup failures are logged and leave settings
    /// functional without live reload.
    pub fn watch(self: Arc<Self>) {
        let mut guard = self.watcher.lock();
        if guard.is_some() {
            return;
        }

        let Some(root) = self.path.parent().map(Path::to_path_buf) else {
            return;
        };
        if let Err(err) = fs::create_dir_all(&root) {
            tracing::warn!(
                target: targets::SETTINGS,
                path = %root.display(),
                %err,
                "could not create the config directory, settings will not be watched"
            );
            return;
        }

        let (tx, rx) = mpsc::channel();
        let mut debouncer = match new_debouncer(WATCH_DEBOUNCE, tx) {
            Ok(debouncer) => debouncer,
            Err(err) => {
                tracing::warn!(
                    target: targets::SETTINGS,
                    %err,
                    "could not create the settings file watcher"
                );
                return;
            }
        };
        // Watch the directory rather than the file so the watch survives the
        // file being replaced or not existing yet.
        if let Err(err) = debouncer.watcher().watch(&root, RecursiveMode::NonRecursive) {
            tracing::warn!(
                target: targets::SETTINGS,
                path = %root.display(),
                %err,
                "could not watch the config directory"
            );
            return;
        }
        *guard = Some(debouncer);
        drop(guard);

        let settings = Arc::clone(&self);
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let spawned = thread::Builder::new()
            .name("atrium-settings-watch".into())
            .spawn(move || {
                // Exits when stop_watching drops the debouncer and with it
                // the sending half of the channel.
                while let Ok(result) = rx.recv() {
                    match result {
                        Ok(events) => {
                            let relevant = events.iter().any(|event| {
                                event.path == settings.path
                                    || event.path.file_name() == file_name.as_deref()
                            });
                            if relevant {
                                settings.reload();
                            }
                        }
                        Err(err) => {
                            tracing::warn!(
                                target: targets::SETTINGS,
                                ?err,
                                "settings file watcher reported an error"
                            );
                        }
                    }
                }
            });
        if let Err(err) = spawned {
            tracing::error!(
                target: targets::SETTINGS,
                %err,
                "could not start the settings watch thread"
            );
            self.watcher.lock().take();
        }
    }

    /// Release the file watcher. Safe to call when watching was never
    /// started.
    pub fn stop_watching(&self) {
        if self.watcher.lock().take().is_some() {
            tracing::debug!(target: targets::SETTINGS, "stopped watching the settings file");
        }
    }

    /// Re-read the backing file and push the resulting snapshot to every
    /// registered listener.
    pub(crate) fn reload(&self) {
        let snapshot = Self::read_snapshot(&self.path);
        *self.data.write() = snapshot.clone();
        self.broadcast(snapshot);
    }

    /// Push the current snapshot to every registered listener without
    /// touching the file. Used when the OS theme changes under a
    /// `UseSystem` configuration.
    pub(crate) fn broadcast_current(&self) {
        let snapshot = self.snapshot();
        self.broadcast(snapshot);
    }

    fn broadcast(&self, snapshot: SettingsSnapshot) {
        // Senders are cloned out of the map so listeners can register or
        // unregister while dispatch is blocked on a send.
        let senders: Vec<(u64, Sender<SettingsSnapshot>)> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        let mut disconnected = Vec::new();
        for (id, sender) in senders {
            if sender.send(snapshot.clone()).is_err() {
                disconnected.push(id);
            }
        }

        if !disconnected.is_empty() {
            let mut listeners = self.listeners.lock();
            for id in disconnected {
                listeners.remove(&id);
                tracing::debug!(
                    target: targets::SETTINGS,
                    listener = id,
                    "dropped settings listener whose receiver went away"
                );
            }
        }
    }

    fn read_snapshot(path: &Path) -> SettingsSnapshot {
        let file = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<SettingsFile>(&raw) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(
                        target: targets::SETTINGS,
                        path = %path.display(),
                        %err,
                        "settings file is not valid JSON, using defaults"
                    );
                    SettingsFile::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => SettingsFile::default(),
            Err(err) => {
                tracing::warn!(
                    target: targets::SETTINGS,
                    path = %path.display(),
                    %err,
                    "settings file could not be read, using defaults"
                );
                SettingsFile::default()
            }
        };

        let theme_variant = match file.theme.as_deref() {
            Some("light") => ThemeVariant::Light,
            Some("dark") => ThemeVariant::Dark,
            Some(other) => {
                tracing::debug!(
                    target: targets::SETTINGS,
                    theme = other,
                    "unknown theme name, following the system preference"
                );
                ThemeVariant::UseSystem
            }
            None => ThemeVariant::UseSystem,
        };

        // Zero and negative scales mean "automatic".
        let scale = match file.scale {
            Some(scale) if scale > 0.0 => scale,
            _ => 1.0,
        };

        SettingsSnapshot {
            theme_variant,
            scale,
            icon_theme: file.icon_theme,
            build_type: BuildType::current(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn settings_in(dir: &tempfile::TempDir) -> Arc<Settings> {
        Arc::new(Settings::with_path(dir.path().join("settings.json")))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        assert_eq!(settings.snapshot(), SettingsSnapshot::default());
        assert_eq!(settings.theme_variant(), ThemeVariant::UseSystem);
        assert_eq!(settings.scale(), 1.0);
        assert_eq!(settings.icon_theme(), None);
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{not json at all").unwrap();
        let settings = settings_in(&dir);

        assert_eq!(settings.snapshot(), SettingsSnapshot::default());
    }

    #[test]
    fn configured_values_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": "dark", "scale": 1.5, "icon_theme": "papirus"}"#,
        )
        .unwrap();
        let settings = settings_in(&dir);

        assert_eq!(settings.theme_variant(), ThemeVariant::Dark);
        assert_eq!(settings.scale(), 1.5);
        assert_eq!(settings.icon_theme(), Some("papirus".to_string()));
    }

    #[test]
    fn unknown_theme_and_bad_scale_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": "solarized", "scale": -2.0}"#,
        )
        .unwrap();
        let settings = settings_in(&dir);

        assert_eq!(settings.theme_variant(), ThemeVariant::UseSystem);
        assert_eq!(settings.scale(), 1.0);
    }

    #[test]
    fn reload_delivers_exactly_once_per_listener() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = bounded(0);
            settings.add_change_listener(tx);
            receivers.push(rx);
        }

        let handles: Vec<_> = receivers
            .into_iter()
            .map(|rx| {
                thread::spawn(move || {
                    let mut count = 0;
                    while rx.recv().is_ok() {
                        count += 1;
                    }
                    count
                })
            })
            .collect();

        settings.reload();
        settings.reload();

        // Dropping the engine drops the registered senders, ending the
        // receiver loops.
        drop(settings);
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let (tx, rx) = bounded(0);
        let id = settings.add_change_listener(tx);
        settings.remove_change_listener(id);

        settings.reload();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn removing_unknown_listener_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let (tx, _rx) = bounded(0);
        let id = settings.add_change_listener(tx);
        settings.remove_change_listener(id);
        settings.remove_change_listener(id);
    }

    #[test]
    fn dispatch_prunes_disconnected_listeners() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let (tx, rx) = bounded(0);
        settings.add_change_listener(tx);
        drop(rx);

        // Must not block on the dead rendezvous channel.
        settings.reload();
        assert!(settings.listeners.lock().is_empty());
    }

    #[test]
    fn stop_watching_without_watching_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        settings.stop_watching();
    }

    #[test]
    fn watching_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let (tx, rx) = bounded(0);
        settings.add_change_listener(tx);
        Arc::clone(&settings).watch();

        fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": "dark", "scale": 2.0}"#,
        )
        .unwrap();

        let snapshot = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("watcher should deliver the edited settings");
        assert_eq!(snapshot.theme_variant, ThemeVariant::Dark);
        assert_eq!(snapshot.scale, 2.0);
        assert_eq!(settings.theme_variant(), ThemeVariant::Dark);

        settings.stop_watching();
    }
}
