//! Script-host notification delivery for the Windows family.
//!
//! Notifications are shown by generating a small PowerShell script from a
//! template, writing it to a uniquely named temp file and running it in a
//! hidden script host through the application's command factory. The temp
//! file is removed once the host returns, whatever the outcome.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use atrium_core::logging::targets;

use crate::application::CommandFactory;

/// Distinguishes script files written by concurrent notifications from the
/// same process.
static SCRIPT_COUNTER: AtomicU64 = AtomicU64::new(0);

const NOTIFICATION_TEMPLATE: &str = r#"$app = "__APP__"
$title = "__TITLE__"
$content = "__CONTENT__"

[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] > $null
$template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02)
$text = $template.GetElementsByTagName("text")
$text.Item(0).AppendChild($template.CreateTextNode($title)) > $null
$text.Item(1).AppendChild($template.CreateTextNode($content)) > $null
$toast = [Windows.UI.Notifications.ToastNotification]::new($template)
[Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier($app).Show($toast)
"#;

/// Escape a string for interpolation into a double-quoted PowerShell
/// string: backticks are doubled, double quotes get a backtick prefix.
pub(crate) fn escape_for_script(input: &str) -> String {
    input.replace('`', "``").replace('"', "`\"")
}

/// Build the notification script with the three escaped parameters.
pub(crate) fn notification_script(app_name: &str, title: &str, content: &str) -> String {
    NOTIFICATION_TEMPLATE
        .replace("__APP__", &escape_for_script(app_name))
        .replace("__TITLE__", &escape_for_script(title))
        .replace("__CONTENT__", &escape_for_script(content))
}

/// A unique temp path for one script run. The name carries the application
/// id, a role tag and a process-wide counter so rapid notifications never
/// collide.
pub(crate) fn script_path(app_id: &str, role: &str) -> PathBuf {
    let sequence = SCRIPT_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
    std::env::temp_dir().join(format!("atrium-{app_id}-{role}-{sequence}.ps1"))
}

/// Write `script` to a temp file, run it in a hidden script host and remove
/// the file after the host returns. Failures are logged, never returned.
pub(crate) fn run_script(exec: &CommandFactory, app_id: &str, role: &str, script: &str) {
    let path = script_path(app_id, role);
    if let Err(err) = fs::write(&path, script) {
        tracing::error!(
            target: targets::PLATFORM,
            path = %path.display(),
            %err,
            "could not write the notification script"
        );
        return;
    }
    let _cleanup = ScriptFile { path: path.clone() };

    let launch = format!(
        "(Get-Content -Encoding UTF8 -Path {} -Raw) | Invoke-Expression",
        path.display()
    );
    let mut command = exec("PowerShell", &["-ExecutionPolicy", "Bypass", launch.as_str()]);
    hide_window(&mut command);
    if let Err(err) = command.status() {
        tracing::error!(
            target: targets::PLATFORM,
            %err,
            "failed to launch the notification script host"
        );
    }
}

/// Removes the script file when the run is over, error or not.
struct ScriptFile {
    path: PathBuf,
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(target_os = "windows")]
fn hide_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(target_os = "windows"))]
fn hide_window(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn succeeding_factory() -> CommandFactory {
        Arc::new(|_, _| {
            if cfg!(windows) {
                let mut command = Command::new("cmd");
                command.args(["/C", "exit 0"]);
                command
            } else {
                let mut command = Command::new("sh");
                command.args(["-c", "true"]);
                command
            }
        })
    }

    fn scripts_for(app_id: &str) -> Vec<PathBuf> {
        let prefix = format!("atrium-{app_id}-");
        fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .collect()
    }

    #[test]
    fn escaping_doubles_backticks_and_prefixes_quotes() {
        let escaped = escape_for_script("He said \"hi\" `ok`");
        assert_eq!(escaped, "He said `\"hi`\" ``ok``");
    }

    #[test]
    fn escaping_leaves_plain_text_alone() {
        assert_eq!(escape_for_script("plain text"), "plain text");
    }

    #[test]
    fn script_contains_escaped_parameters() {
        let script = notification_script("My App", "He said \"hi\" `ok`", "body \"text\"");
        assert!(script.contains("$app = \"My App\""));
        assert!(script.contains("He said `\"hi`\" ``ok``"));
        assert!(script.contains("body `\"text`\""));
        assert!(!script.contains("__TITLE__"));
    }

    #[test]
    fn script_paths_never_repeat() {
        let first = script_path("demo", "notify");
        let second = script_path("demo", "notify");
        assert_ne!(first, second);

        let name = first.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("atrium-demo-notify-"));
        assert!(name.ends_with(".ps1"));
    }

    #[test]
    fn script_file_is_removed_after_a_successful_run() {
        let app_id = "script-cleanup-ok";
        let exec = succeeding_factory();
        run_script(&exec, app_id, "notify", "Write-Output hello");
        assert!(scripts_for(app_id).is_empty());
    }

    #[test]
    fn script_file_is_removed_when_the_host_cannot_launch() {
        let app_id = "script-cleanup-fail";
        let exec: CommandFactory =
            Arc::new(|_, _| Command::new("atrium-test-missing-script-host"));
        run_script(&exec, app_id, "notify", "Write-Output hello");
        assert!(scripts_for(app_id).is_empty());
    }
}
