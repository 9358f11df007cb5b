//! Logging facilities for Atrium.
//!
//! Atrium uses the `tracing` crate for instrumentation. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Application lifecycle target.
    pub const APP: &str = "atrium::app";
    /// Settings engine target.
    pub const SETTINGS: &str = "atrium::settings";
    /// Preferences store target.
    pub const PREFERENCES: &str = "atrium::preferences";
    /// Storage root resolution target.
    pub const STORAGE: &str = "atrium::storage";
    /// Platform services target.
    pub const PLATFORM: &str = "atrium::platform";
}
