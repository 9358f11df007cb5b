//! User notification value object.

/// A notification to be delivered through the platform's native mechanism.
///
/// Notifications are created by the caller and consumed immediately by the
/// platform services; they are never stored by the toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The notification heading.
    pub title: String,
    /// The notification body text.
    pub content: String,
}

impl Notification {
    /// Create a new notification with the given title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_fields() {
        let n = Notification::new("Reminder", "Meeting in 5 minutes");
        assert_eq!(n.title, "Reminder");
        assert_eq!(n.content, "Meeting in 5 minutes");
    }
}
