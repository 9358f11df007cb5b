//! Application lifecycle and OS integration for the Atrium toolkit.
//!
//! This crate owns the process-wide [`Application`] object and everything it
//! binds together:
//!
//! - **Lifecycle**: run/quit over the windowing driver, safe against
//!   concurrent calls
//! - **Settings**: the per-user config file, typed accessors and live
//!   propagation of theme/scale changes to open windows
//! - **Preferences**: typed key-value persistence keyed by the application's
//!   unique identifier
//! - **Storage**: document and cache root resolution
//! - **Platform services**: native notifications, URL opening and dark-mode
//!   detection, implemented per OS behind one contract
//!
//! # Example
//!
//! ```ignore
//! use atrium_app::Application;
//! use atrium_core::Notification;
//!
//! let app = Application::new(driver, "org.example.editor");
//! app.set_name("Example Editor");
//!
//! let window = app.new_window("Example");
//! app.send_notification(&Notification::new("Ready", "The editor is up."));
//!
//! app.run(); // blocks until app.quit()
//! ```

mod application;
mod platform;
mod preferences;
mod settings;
mod storage;

pub use application::{current, Application, CommandFactory};
pub use platform::{PlatformError, ThemeWatchHandle};
pub use preferences::{PreferenceValue, Preferences};
pub use settings::{config_root, ListenerId, Settings, SettingsSnapshot};
pub use storage::Storage;

pub use atrium_core::logging;
pub use atrium_core::{BuildType, Device, Driver, Notification, Resource, ThemeVariant, Window};
