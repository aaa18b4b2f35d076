//! Invite email delivery.
//!
//! Delivery is delegated to an external backend function that accepts
//! `{ "to", "firstName", "lastName" }` as JSON. [`HttpEmailDelivery`]
//! calls it with `reqwest`; [`DisabledEmailDelivery`] is used when no
//! function URL is configured and fails every call, so invites created
//! without a mail backend end up as `email_failed`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Payload sent to the email-delivery function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteEmail {
    /// Recipient address.
    pub to: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
}

/// Sends invite emails.
#[async_trait]
pub trait EmailDelivery: Send + Sync + fmt::Debug {
    /// Delivers one invite email.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EmailDelivery`] if the backend rejected the
    /// message or could not be reached.
    async fn deliver(&self, email: &InviteEmail) -> Result<(), NetworkError>;
}

/// Delivers through an HTTP backend function.
#[derive(Debug, Clone)]
pub struct HttpEmailDelivery {
    client: reqwest::Client,
    url: String,
    key: Option<String>,
}

impl HttpEmailDelivery {
    /// Builds a client for the function at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Internal`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        url: impl Into<String>,
        key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Internal(format!("email client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            key,
        })
    }
}

#[async_trait]
impl EmailDelivery for HttpEmailDelivery {
    async fn deliver(&self, email: &InviteEmail) -> Result<(), NetworkError> {
        let mut request = self.client.post(&self.url).json(email);
        if let Some(key) = &self.key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| NetworkError::EmailDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::EmailDelivery(format!(
                "function returned {status}: {body}"
            )));
        }
        tracing::debug!(to = %email.to, "invite email accepted by function");
        Ok(())
    }
}

/// Stand-in used when no email function is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEmailDelivery;

#[async_trait]
impl EmailDelivery for DisabledEmailDelivery {
    async fn deliver(&self, _email: &InviteEmail) -> Result<(), NetworkError> {
        Err(NetworkError::EmailDelivery(
            "email delivery is not configured".to_string(),
        ))
    }
}
