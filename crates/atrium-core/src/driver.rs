//! Contracts implemented by the rendering/windowing backend.
//!
//! The application layer never talks to the OS windowing system directly; it
//! drives one of these trait objects. The real desktop driver lives in its
//! own crate, and tests substitute recording fakes.

use std::sync::Arc;

use crate::theme::ThemeVariant;

/// The windowing backend consumed by the application object.
///
/// `run` blocks the calling thread for the lifetime of the UI; `quit` asks
/// the event loop to exit and may be called from any thread.
pub trait Driver: Send + Sync {
    /// Create a new window with the given title.
    fn create_window(&self, title: &str) -> Arc<dyn Window>;

    /// Every window currently known to the driver, open or hidden.
    fn all_windows(&self) -> Vec<Arc<dyn Window>>;

    /// Run the event loop. Blocks until [`Driver::quit`] is called.
    fn run(&self);

    /// Ask the event loop to exit.
    fn quit(&self);

    /// Information about the device the driver is presenting on.
    fn device(&self) -> &dyn Device;
}

/// A single window managed by the driver.
pub trait Window: Send + Sync {
    /// The current window title.
    fn title(&self) -> String;

    /// Update the window title.
    fn set_title(&self, title: &str);

    /// Close the window, running any close hooks it has registered.
    fn close(&self);

    /// Apply a resolved theme variant and scale factor to the window
    /// contents. Called by the application whenever settings change.
    fn apply_appearance(&self, variant: ThemeVariant, scale: f32);
}

/// Capabilities of the device the toolkit is running on.
pub trait Device: Send + Sync {
    /// True on handheld platforms where the OS owns window lifecycle and
    /// config files cannot be watched.
    fn is_mobile(&self) -> bool;
}
