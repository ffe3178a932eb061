use std::sync::Arc;

use roost_core::{Email, EmailClient, EmailError};
use secrecy::ExposeSecret;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub content: String,
}

/// Email client that keeps messages in memory instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct MockEmailClient {
    sent: Arc<RwLock<Vec<SentEmail>>>,
}

impl MockEmailClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.read().await.clone()
    }

    /// The latest message sent to `recipient`, if any.
    pub async fn last_sent_to(&self, recipient: &str) -> Option<SentEmail> {
        let recipient = recipient.trim().to_lowercase();
        self.sent
            .read()
            .await
            .iter()
            .rev()
            .find(|email| email.recipient == recipient)
            .cloned()
    }
}

#[async_trait::async_trait]
impl EmailClient for MockEmailClient {
    #[tracing::instrument(name = "Recording email", skip_all)]
    async fn send_email(
        &self,
        recipient: &Email,
        subject: &str,
        content: &str,
    ) -> Result<(), EmailError> {
        self.sent.write().await.push(SentEmail {
            recipient: recipient.as_ref().expose_secret().clone(),
            subject: subject.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}
