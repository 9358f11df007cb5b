//! Windows platform services.

use std::sync::Arc;
use std::thread;

use atrium_core::logging::targets;
use atrium_core::{Notification, ThemeVariant};

use super::{detect_system_variant, script, spawn_and_reap, PlatformError, PlatformShim, ThemeWatchHandle};
use crate::application::Application;
use crate::settings::Settings;

pub(crate) struct WindowsShim;

impl PlatformShim for WindowsShim {
    fn open_url(&self, app: &Application, url: &str) -> Result<(), PlatformError> {
        let command =
            (app.command_factory())("rundll32", &["url.dll,FileProtocolHandler", url]);
        spawn_and_reap(command)
            .map_err(|err| PlatformError::launch(format!("rundll32: {err}")))
    }

    fn send_notification(&self, app: &Application, notification: &Notification) {
        let body = script::notification_script(
            &app.name(),
            &notification.title,
            &notification.content,
        );
        let exec = app.command_factory().clone();
        let app_id = app.unique_id();
        let spawned = thread::Builder::new()
            .name("atrium-notify".into())
            .spawn(move || {
                script::run_script(&exec, &app_id, "notify", &body);
            });
        if let Err(err) = spawned {
            tracing::error!(
                target: targets::PLATFORM,
                %err,
                "could not start the notification thread"
            );
        }
    }

    fn default_variant(&self) -> ThemeVariant {
        detect_system_variant()
    }

    fn watch_theme(&self, _settings: &Arc<Settings>) -> Option<ThemeWatchHandle> {
        // TODO: monitor WM_SETTINGCHANGE for live theme changes
        None
    }
}
