//! Core contracts for the Atrium GUI toolkit.
//!
//! This crate defines the interfaces the application layer consumes and the
//! small value types shared across the toolkit:
//!
//! - **Driver contracts**: the [`Driver`], [`Window`] and [`Device`] traits
//!   implemented by the rendering/windowing backend
//! - **Themes**: the [`ThemeVariant`] preference and [`BuildType`]
//! - **Resources**: named byte blobs used for application icons
//! - **Notifications**: the transient [`Notification`] value object
//! - **Logging**: [`logging::targets`] constants for `tracing` filtering
//!
//! The application object, settings engine and platform services that bind
//! these contracts together live in the `atrium-app` crate.
//!
//! # Example
//!
//! ```
//! use atrium_core::{Notification, ThemeVariant};
//!
//! let n = Notification::new("Download complete", "3 files were saved.");
//! assert_eq!(n.title, "Download complete");
//! assert!(!ThemeVariant::UseSystem.is_dark());
//! ```

mod driver;
mod notification;
mod resource;
mod theme;

pub mod logging;

pub use driver::{Device, Driver, Window};
pub use notification::Notification;
pub use resource::Resource;
pub use theme::{BuildType, ThemeVariant};
