use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::{result::Result, setting::MessengerConfig, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSeverity {
    #[default]
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub content: String,
    pub severity: MessageSeverity,
    pub requested_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, duration: Duration) -> bool {
        Instant::now().duration_since(self.requested_at) > duration
    }
}

/// Holds at most one transient notice for the user. A newer message replaces
/// the current one; a notice older than the configured duration is gone.
#[derive(Clone)]
pub struct Messenger {
    message: Arc<Mutex<Option<Notice>>>,
    duration: Duration,
}

impl Messenger {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: Arc::new(Mutex::new(None)),
            duration,
        }
    }

    pub fn from_config(config: &MessengerConfig) -> Self {
        Self::new(config.notice_duration())
    }

    pub fn send_message(&self, msg: String, severity: Option<MessageSeverity>) -> Result<()> {
        let severity = severity.unwrap_or_default();
        match severity {
            MessageSeverity::Info => tracing::info!("notice: {}", msg),
            MessageSeverity::Warning => tracing::warn!("notice: {}", msg),
            MessageSeverity::Error => tracing::error!("notice: {}", msg),
        }
        *self.message.lock().map_err(Error::as_guard_error)? = Some(Notice {
            content: msg,
            severity,
            requested_at: Instant::now(),
        });
        Ok(())
    }

    pub fn current(&self) -> Option<Notice> {
        let mut message = self.message.lock().ok()?;
        if message
            .as_ref()
            .is_some_and(|notice| notice.is_expired(self.duration))
        {
            *message = None;
        }
        message.clone()
    }

    pub fn dismiss(&self) {
        if let Ok(mut message) = self.message.lock() {
            *message = None;
        }
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("duration", &self.duration)
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn latest_message_replaces_previous() {
        let messenger = Messenger::new(Duration::from_secs(5));
        messenger.send_message("first".into(), None).unwrap();
        messenger
            .send_message("second".into(), Some(MessageSeverity::Warning))
            .unwrap();

        let notice = messenger.current().unwrap();
        assert_eq!(notice.content, "second");
        assert_eq!(notice.severity, MessageSeverity::Warning);
    }

    #[test]
    fn notice_expires_after_duration() {
        let messenger = Messenger::new(Duration::from_millis(10));
        messenger
            .send_message("scan failed".into(), Some(MessageSeverity::Warning))
            .unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(messenger.current(), None);
    }

    #[test]
    fn dismiss_clears_for_every_clone() {
        let messenger = Messenger::new(Duration::from_secs(5));
        let shared = messenger.clone();
        shared
            .send_message("camera unavailable".into(), Some(MessageSeverity::Error))
            .unwrap();
        assert!(messenger.current().is_some());

        messenger.dismiss();
        assert_eq!(shared.current(), None);
    }
}
