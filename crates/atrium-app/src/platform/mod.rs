//! Platform services.
//!
//! Each target OS implements the same contract behind [`PlatformShim`]:
//! opening URLs, delivering native notifications, querying the system
//! dark/light preference and watching for live theme changes. The
//! implementation is selected at compile time; OS-specific details such as
//! script-host escaping stay inside the per-OS modules.

use std::fmt;
use std::io;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
#[cfg(any(target_os = "linux", target_os = "macos"))]
use std::time::Duration;

use atrium_core::logging::targets;
use atrium_core::{Notification, ThemeVariant};

use crate::application::Application;
use crate::settings::Settings;

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) mod script;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
mod fallback;

/// How often the theme poll loop samples the OS preference.
#[cfg(any(target_os = "linux", target_os = "macos"))]
const THEME_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Error type for platform operations.
#[derive(Debug)]
pub struct PlatformError {
    kind: PlatformErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)] // Some variants only used on certain platforms
enum PlatformErrorKind {
    /// A subprocess could not be launched.
    Launch,
    /// Operation not supported on this platform.
    UnsupportedPlatform,
}

impl PlatformError {
    #[allow(dead_code)]
    pub(crate) fn launch(message: impl Into<String>) -> Self {
        Self {
            kind: PlatformErrorKind::Launch,
            message: message.into(),
        }
    }

    #[allow(dead_code)]
    pub(crate) fn unsupported_platform(message: impl Into<String>) -> Self {
        Self {
            kind: PlatformErrorKind::UnsupportedPlatform,
            message: message.into(),
        }
    }

    /// Returns true if this error indicates the operation is not supported.
    pub fn is_unsupported_platform(&self) -> bool {
        self.kind == PlatformErrorKind::UnsupportedPlatform
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PlatformErrorKind::Launch => write!(f, "launch error: {}", self.message),
            PlatformErrorKind::UnsupportedPlatform => {
                write!(f, "unsupported platform: {}", self.message)
            }
        }
    }
}

impl std::error::Error for PlatformError {}

/// The per-OS service contract consumed by the application object.
pub(crate) trait PlatformShim: Send + Sync {
    /// Launch the OS URL opener for `url` through the application's command
    /// factory. Launch failure is surfaced; the opener's exit status is not.
    fn open_url(&self, app: &Application, url: &str) -> Result<(), PlatformError>;

    /// Deliver a notification on a background thread. Never blocks the
    /// caller; delivery failures are logged.
    fn send_notification(&self, app: &Application, notification: &Notification);

    /// The OS dark/light preference, `Light` when the OS has no opinion or
    /// the query fails.
    fn default_variant(&self) -> ThemeVariant;

    /// Start watching for live OS theme changes, where supported.
    fn watch_theme(&self, settings: &Arc<Settings>) -> Option<ThemeWatchHandle>;
}

/// The shim for the OS this binary was compiled for.
pub(crate) fn native_shim() -> Box<dyn PlatformShim> {
    #[cfg(target_os = "windows")]
    return Box::new(windows::WindowsShim);
    #[cfg(target_os = "macos")]
    return Box::new(macos::MacosShim);
    #[cfg(target_os = "linux")]
    return Box::new(linux::LinuxShim);
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    return Box::new(fallback::FallbackShim);
}

/// Stops a running theme watch loop.
pub struct ThemeWatchHandle {
    stop: Arc<AtomicBool>,
}

impl ThemeWatchHandle {
    /// Ask the watch loop to exit at its next poll.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Translate the OS preference reported by `dark-light`, defaulting to
/// light when the OS has no opinion.
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub(crate) fn detect_system_variant() -> ThemeVariant {
    match dark_light::detect() {
        dark_light::Mode::Dark => ThemeVariant::Dark,
        dark_light::Mode::Light | dark_light::Mode::Default => ThemeVariant::Light,
    }
}

/// Poll the OS theme and rebroadcast the current settings snapshot when it
/// changes, so windows re-resolve their effective variant.
#[cfg(any(target_os = "linux", target_os = "macos"))]
pub(crate) fn spawn_theme_poll(
    settings: Arc<Settings>,
    detect: fn() -> ThemeVariant,
) -> Option<ThemeWatchHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let spawned = thread::Builder::new()
        .name("atrium-theme-watch".into())
        .spawn(move || {
            let mut previous = detect();
            while !flag.load(Ordering::SeqCst) {
                thread::sleep(THEME_POLL_INTERVAL);
                let current = detect();
                if current != previous {
                    previous = current;
                    tracing::debug!(
                        target: targets::PLATFORM,
                        variant = %current,
                        "system theme changed"
                    );
                    settings.broadcast_current();
                }
            }
        });
    match spawned {
        Ok(_) => Some(ThemeWatchHandle { stop }),
        Err(err) => {
            tracing::warn!(
                target: targets::PLATFORM,
                %err,
                "could not start the theme watch thread"
            );
            None
        }
    }
}

/// Launch a subprocess and reap it on a background thread. Only the launch
/// itself can fail; the child's exit status is deliberately ignored.
#[allow(dead_code)] // Unused on platforms without a subprocess URL opener
pub(crate) fn spawn_and_reap(mut command: Command) -> io::Result<()> {
    let mut child = command.spawn()?;
    let reaper = thread::Builder::new()
        .name("atrium-child-reap".into())
        .spawn(move || {
            let _ = child.wait();
        });
    if let Err(err) = reaper {
        tracing::warn!(
            target: targets::PLATFORM,
            %err,
            "could not start the child reaper thread"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_display() {
        let err = PlatformError::launch("no such program");
        assert!(!err.is_unsupported_platform());
        assert!(err.to_string().contains("no such program"));

        let err = PlatformError::unsupported_platform("no opener here");
        assert!(err.is_unsupported_platform());
    }

    #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
    #[test]
    fn system_variant_detection_does_not_panic() {
        let variant = detect_system_variant();
        assert_ne!(variant, ThemeVariant::UseSystem);
    }

    #[test]
    fn spawn_and_reap_surfaces_launch_failure() {
        let command = Command::new("atrium-test-program-that-does-not-exist");
        assert!(spawn_and_reap(command).is_err());
    }
}
