use async_trait::async_trait;

use crate::errors::AppError;

/// Outbound mail boundary. Delivery mechanics live behind this trait so
/// the account-recovery flow can be driven without a provider account.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), AppError>;
}

/// Logs the reset link instead of delivering it. Good enough for local
/// development; a real deployment swaps in a provider-backed impl.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), AppError> {
        tracing::info!(%to, %reset_url, "password reset requested");
        Ok(())
    }
}

#[cfg(test)]
pub struct RecordingMailer {
    pub sent: parking_lot::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn last_reset_url(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, url)| url.clone())
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .push((to.to_string(), reset_url.to_string()));
        Ok(())
    }
}
