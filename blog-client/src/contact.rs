use blog_core::ContactRequest;
use blog_core::validation::validate_contact;
use reqwest::Client;
use tracing::info;

use crate::api::ensure_success;
use crate::error::BlogClientError;

/// Posts contact messages to an external webhook.
#[derive(Clone)]
pub struct ContactClient {
    http: Client,
    webhook_url: String,
}

impl ContactClient {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, BlogClientError> {
        Ok(Self {
            http: Client::builder().build()?,
            webhook_url: webhook_url.into(),
        })
    }

    pub async fn send(&self, message: &ContactRequest) -> Result<(), BlogClientError> {
        validate_contact(message).into_result()?;

        let resp = self.http.post(&self.webhook_url).json(message).send().await?;
        ensure_success(resp).await?;
        info!(email = %message.email, "contact message sent");
        Ok(())
    }
}
