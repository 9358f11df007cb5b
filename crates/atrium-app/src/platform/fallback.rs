//! Platform services for targets without desktop integration, including
//! the mobile platforms.

use std::sync::Arc;

use atrium_core::logging::targets;
use atrium_core::{Notification, ThemeVariant};

use super::{PlatformError, PlatformShim, ThemeWatchHandle};
use crate::application::Application;
use crate::settings::Settings;

pub(crate) struct FallbackShim;

impl PlatformShim for FallbackShim {
    fn open_url(&self, _app: &Application, _url: &str) -> Result<(), PlatformError> {
        Err(PlatformError::unsupported_platform(
            "no URL opener on this platform",
        ))
    }

    fn send_notification(&self, _app: &Application, notification: &Notification) {
        tracing::warn!(
            target: targets::PLATFORM,
            title = %notification.title,
            "notifications are not supported on this platform"
        );
    }

    fn default_variant(&self) -> ThemeVariant {
        ThemeVariant::Light
    }

    fn watch_theme(&self, _settings: &Arc<Settings>) -> Option<ThemeWatchHandle> {
        None
    }
}
