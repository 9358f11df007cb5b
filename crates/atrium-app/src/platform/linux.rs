//! Linux platform services.

use std::sync::Arc;
use std::thread;

use atrium_core::logging::targets;
use atrium_core::{Notification, ThemeVariant};

use super::{
    detect_system_variant, spawn_and_reap, spawn_theme_poll, PlatformError, PlatformShim,
    ThemeWatchHandle,
};
use crate::application::Application;
use crate::settings::Settings;

pub(crate) struct LinuxShim;

impl PlatformShim for LinuxShim {
    fn open_url(&self, app: &Application, url: &str) -> Result<(), PlatformError> {
        let command = (app.command_factory())("xdg-open", &[url]);
        spawn_and_reap(command)
            .map_err(|err| PlatformError::launch(format!("xdg-open: {err}")))
    }

    fn send_notification(&self, app: &Application, notification: &Notification) {
        let app_name = app.name();
        let title = notification.title.clone();
        let content = notification.content.clone();
        let spawned = thread::Builder::new()
            .name("atrium-notify".into())
            .spawn(move || {
                let mut notification = notify_rust::Notification::new();
                notification.summary(&title);
                notification.body(&content);
                if !app_name.is_empty() {
                    notification.appname(&app_name);
                }
                if let Err(err) = notification.show() {
                    tracing::error!(
                        target: targets::PLATFORM,
                        %err,
                        "could not deliver the notification"
                    );
                }
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

    fn watch_theme(&self, settings: &Arc<Settings>) -> Option<ThemeWatchHandle> {
        spawn_theme_poll(Arc::clone(settings), detect_system_variant)
    }
}
