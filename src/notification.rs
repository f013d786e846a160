//! Notifications collected while decoding.
//!
//! Failures that do not stop the read (a corrupt record, a section with a bad
//! checksum, a release that is only partly supported) are reported here so
//! the caller can inspect them next to the decoded drawing.

use std::fmt;

use crate::error::{DwgError, Severity};

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// Part of the file is not decoded by this library.
    NotImplemented,
    /// Informational.
    None,
    /// Recoverable problem; decoded data may be incomplete.
    Warning,
    /// A record or section was abandoned.
    Error,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationType::NotImplemented => "not implemented",
            NotificationType::None => "info",
            NotificationType::Warning => "warning",
            NotificationType::Error => "error",
        };
        f.write_str(name)
    }
}

/// A single report.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.notification_type, self.message)
    }
}

/// Ordered list of notifications owned by a decoded drawing.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, mirroring it as a `tracing` event.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        let message = message.into();
        match notification_type {
            NotificationType::Error => tracing::error!("{message}"),
            NotificationType::Warning => tracing::warn!("{message}"),
            NotificationType::NotImplemented | NotificationType::None => {
                tracing::info!("{message}")
            }
        }
        self.items.push(Notification::new(notification_type, message));
    }

    /// Record a decode error, picking the type from its severity.
    pub fn notify_error(&mut self, error: &DwgError) {
        let notification_type = match error {
            DwgError::NotImplemented(_) => NotificationType::NotImplemented,
            other if other.severity() == Severity::Warning => NotificationType::Warning,
            _ => NotificationType::Error,
        };
        self.notify(notification_type, error.to_string());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    /// Notifications of one kind.
    pub fn of_type(&self, notification_type: NotificationType) -> impl Iterator<Item = &Notification> {
        self.items
            .iter()
            .filter(move |n| n.notification_type == notification_type)
    }

    /// `true` when any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|n| n.message.contains(needle))
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_maps_severity() {
        let mut notifications = NotificationCollection::new();
        notifications.notify_error(&DwgError::UnclassifiableGroupCode { code: 150, offset: 4 });
        notifications.notify_error(&DwgError::NotImplemented("AC1021 objects".into()));
        notifications.notify_error(&DwgError::Parse("bad".into()));

        let kinds: Vec<_> = notifications.iter().map(|n| n.notification_type).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationType::Warning,
                NotificationType::NotImplemented,
                NotificationType::Error
            ]
        );
        assert!(notifications.contains("group code 150"));
        assert_eq!(notifications.of_type(NotificationType::Error).count(), 1);
    }
}
