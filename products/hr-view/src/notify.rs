use std::time::{Duration, Instant};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    shown_at: Instant,
}

/// Holds at most one toast. Showing a new one replaces the old one at once.
#[derive(Debug)]
pub struct Notifier {
    current: Option<Notification>,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }
}

impl Notifier {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.show_at(kind, message, Instant::now());
    }

    pub fn show_at(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::debug!(?kind, %message, "notification");
        self.current = Some(Notification {
            kind,
            message,
            shown_at: now,
        });
    }

    /// The visible notification at `now`; expired ones are dropped.
    pub fn current_at(&mut self, now: Instant) -> Option<&Notification> {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|n| now.saturating_duration_since(n.shown_at) >= self.ttl);
        if expired {
            self.current = None;
        }
        self.current.as_ref()
    }

    pub fn current(&mut self) -> Option<&Notification> {
        self.current_at(Instant::now())
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
