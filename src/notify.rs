//! Outbound messages to the chat platform.

use derive_more::Display;
use tracing::{error, info};

#[derive(Debug, Display)]
#[display(fmt = "failed to post to {}: {}", channel, reason)]
pub struct NotifyError {
    pub channel: String,
    pub reason: String,
}

impl std::error::Error for NotifyError {}

#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Posts `text` to a channel, or to a user's direct messages when the
    /// channel is a user id.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

/// Writes every outbound message to the log. Used when no chat workspace is
/// wired in.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        info!(channel, text, "Outbound message");
        Ok(())
    }
}

/// Delivery failures never undo the step that triggered them.
pub async fn deliver<N: Notifier>(notifier: &N, channel: &str, text: &str) {
    if let Err(e) = notifier.post_message(channel, text).await {
        error!(error = %e, channel, "Notification failed");
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every message for assertions; can be told to fail.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn messages_to(&self, channel: &str) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| c == channel)
                .map(|(_, text)| text.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError {
                    channel: channel.to_string(),
                    reason: "offline".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((channel.to_string(), text.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[actix_web::test]
    async fn deliver_swallows_failures_after_logging() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        deliver(&notifier, "U1", "hello").await;
        assert!(notifier.messages_to("U1").is_empty());
    }

    #[actix_web::test]
    async fn log_notifier_accepts_everything() {
        assert!(LogNotifier.post_message("#general", "hi").await.is_ok());
    }
}
