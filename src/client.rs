//! Email provider trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    ApiReceipt, OutboundMessage, OutboundStats, SendReceipt, StatsQuery, TemplateDraft,
    TemplateList, TemplatePushRequest, TemplatePushResult, TemplateRecord, TemplatedMessage,
};

/// Errors that can occur while talking to the email provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Postmark API error (HTTP {status}, code {error_code}): {message}")]
    Api {
        status: u16,
        error_code: i64,
        message: String,
    },

    #[error("Postmark API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// HTTP status of the failed call, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } | ProviderError::Status { status, .. } => {
                Some(*status)
            }
            ProviderError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Operations the tool handlers need from the email provider.
///
/// Implemented by [`crate::api::postmark::PostmarkClient`]; tests substitute a
/// recording mock.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, message: &OutboundMessage) -> Result<SendReceipt, ProviderError>;

    async fn send_email_with_template(
        &self,
        message: &TemplatedMessage,
    ) -> Result<SendReceipt, ProviderError>;

    async fn list_templates(&self) -> Result<TemplateList, ProviderError>;

    async fn create_template(&self, draft: &TemplateDraft) -> Result<TemplateRecord, ProviderError>;

    async fn edit_template(
        &self,
        id_or_alias: &str,
        draft: &TemplateDraft,
    ) -> Result<TemplateRecord, ProviderError>;

    async fn delete_template(&self, id_or_alias: &str) -> Result<ApiReceipt, ProviderError>;

    async fn outbound_stats(&self, query: &StatsQuery) -> Result<OutboundStats, ProviderError>;

    /// Push templates between servers. Requires an account-level token.
    async fn push_templates(
        &self,
        account_token: &str,
        request: &TemplatePushRequest,
    ) -> Result<TemplatePushResult, ProviderError>;
}
