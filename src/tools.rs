//! Tool registry: typed handlers for every Postmark and template-library tool.
//!
//! [`PostmarkTools`] owns the long-lived collaborators (email provider, template
//! library, configuration) and turns a [`ToolCall`] into rendered text.
//!
//! Two failure tiers:
//! - expected conditions (a missing category, an unknown content format) are
//!   rendered as ordinary text results;
//! - validation, provider and unexpected failures are returned as [`ToolError`]
//!   and surfaced to the caller as a failed invocation.

pub mod params;
pub mod render;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::{EmailProvider, ProviderError};
use crate::config::Config;
use crate::library::{ContentFormat, ErrorCode, TemplateLibrary};
use crate::model::{
    LinkTracking, OutboundMessage, StatsQuery, TemplateDraft, TemplatePushRequest,
    TemplatedMessage,
};

pub use params::*;

/// Error type for tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{}: An unexpected error occurred while running {tool}", ErrorCode::UnexpectedError)]
    Unexpected { tool: String },
}

impl ToolError {
    fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation(message.into())
    }

    fn unexpected(tool: &str) -> Self {
        ToolError::Unexpected {
            tool: tool.to_string(),
        }
    }
}

/// The registered tool set.
#[derive(Clone)]
pub struct PostmarkTools {
    provider: Arc<dyn EmailProvider>,
    library: TemplateLibrary,
    config: Arc<Config>,
}

impl PostmarkTools {
    pub fn new(provider: Arc<dyn EmailProvider>, config: Arc<Config>) -> Self {
        Self {
            provider,
            library: TemplateLibrary::new(config.templates_dir.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Single dispatch entry point: tool name plus raw JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let call = ToolCall::parse(name, args).inspect_err(|e| {
            warn!(tool = %name, error = %e, "Rejected tool call");
        })?;
        self.invoke(call).await
    }

    /// Run a typed call inside its own span, converting panics into
    /// [`ToolError::Unexpected`].
    pub async fn invoke(&self, call: ToolCall) -> Result<String, ToolError> {
        let tool = call.name();
        let span = info_span!("tool", tool, invocation = %Uuid::new_v4());

        async move {
            info!("Tool call requested");
            match AssertUnwindSafe(self.dispatch(call)).catch_unwind().await {
                Ok(Ok(text)) => {
                    debug!(bytes = text.len(), "Tool call succeeded");
                    Ok(text)
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Tool call failed");
                    Err(e)
                }
                Err(panic) => {
                    let detail = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic payload".to_string());
                    error!(panic = %detail, "Tool handler panicked");
                    Err(ToolError::unexpected(tool))
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn dispatch(&self, call: ToolCall) -> Result<String, ToolError> {
        match call {
            ToolCall::SendEmail(args) => self.send_email(args).await,
            ToolCall::SendEmailWithTemplate(args) => self.send_email_with_template(args).await,
            ToolCall::ListTemplates => self.list_templates().await,
            ToolCall::GetDeliveryStats(args) => self.get_delivery_stats(args).await,
            ToolCall::ListTemplateCategories => Ok(self.list_template_categories().await),
            ToolCall::ListTemplatesInCategory(args) => {
                Ok(self.list_templates_in_category(args).await)
            }
            ToolCall::GetTemplateContent(args) => Ok(self.get_template_content(args).await),
            ToolCall::GetTemplateIdeas(args) => Ok(self.get_template_ideas(args).await),
            ToolCall::CreateTemplate(args) => self.create_template(args).await,
            ToolCall::UpdateTemplate(args) => self.update_template(args).await,
            ToolCall::DeleteTemplate(args) => self.delete_template(args).await,
            ToolCall::SimulateTemplatePush(args) => self.push_templates(args, false).await,
            ToolCall::ExecuteTemplatePush(args) => self.push_templates(args, true).await,
        }
    }

    // --- Sending ---

    async fn send_email(&self, args: SendEmailArgs) -> Result<String, ToolError> {
        let message = OutboundMessage {
            from: self.sender(args.from),
            to: args.to,
            subject: args.subject,
            text_body: args.text_body,
            html_body: args.html_body,
            tag: args.tag,
            message_stream: self.config.message_stream.clone(),
            track_opens: true,
            track_links: LinkTracking::HtmlAndText,
        };

        let receipt = self.provider.send_email(&message).await?;
        info!(message_id = %receipt.message_id, "Email sent");
        Ok(render::email_sent(&receipt, &message.to, &message.subject))
    }

    async fn send_email_with_template(
        &self,
        args: SendEmailWithTemplateArgs,
    ) -> Result<String, ToolError> {
        let message = TemplatedMessage {
            from: self.sender(args.from),
            to: args.to,
            template_id: args.template_id,
            template_alias: if args.template_id.is_some() {
                None
            } else {
                args.template_alias.filter(|a| !a.trim().is_empty())
            },
            template_model: args.template_model,
            tag: args.tag,
            message_stream: self.config.message_stream.clone(),
            track_opens: true,
            track_links: LinkTracking::HtmlAndText,
        };
        let template = message.template_ref().ok_or_else(|| {
            ToolError::validation("Either templateId or templateAlias must be provided")
        })?;

        let receipt = self.provider.send_email_with_template(&message).await?;
        info!(message_id = %receipt.message_id, %template, "Template email sent");
        Ok(render::template_email_sent(&receipt, &message.to, &template))
    }

    fn sender(&self, from: Option<String>) -> String {
        from.filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| self.config.default_sender.clone())
    }

    // --- Server templates and statistics ---

    async fn list_templates(&self) -> Result<String, ToolError> {
        let list = self.provider.list_templates().await?;
        Ok(render::templates(&list))
    }

    async fn get_delivery_stats(&self, args: GetDeliveryStatsArgs) -> Result<String, ToolError> {
        let query = StatsQuery {
            tag: args.tag,
            from_date: parse_date("fromDate", args.from_date.as_deref())?,
            to_date: parse_date("toDate", args.to_date.as_deref())?,
        };
        if let (Some(from), Some(to)) = (query.from_date, query.to_date) {
            if from > to {
                return Err(ToolError::validation(format!(
                    "fromDate ({}) must not be after toDate ({})",
                    from, to
                )));
            }
        }

        let stats = self.provider.outbound_stats(&query).await?;
        Ok(render::delivery_stats(&stats, &query))
    }

    async fn create_template(&self, args: CreateTemplateArgs) -> Result<String, ToolError> {
        if args.html_body.is_none() && args.text_body.is_none() {
            return Err(ToolError::validation(
                "Either htmlBody or textBody must be provided",
            ));
        }

        let draft = TemplateDraft {
            name: Some(args.name),
            subject: Some(args.subject.clone()),
            html_body: args.html_body,
            text_body: args.text_body,
            alias: args.alias,
        };
        let record = self.provider.create_template(&draft).await?;
        info!(template_id = record.template_id, "Template created");
        Ok(render::template_created(&record, &args.subject))
    }

    async fn update_template(&self, args: UpdateTemplateArgs) -> Result<String, ToolError> {
        let draft = TemplateDraft {
            name: args.name,
            subject: args.subject,
            html_body: args.html_body,
            text_body: args.text_body,
            alias: args.alias,
        };
        if draft.is_empty() {
            return Err(ToolError::validation(
                "At least one of name, subject, htmlBody, textBody or alias must be provided",
            ));
        }

        let updated_fields: Vec<&str> = [
            ("name", draft.name.is_some()),
            ("subject", draft.subject.is_some()),
            ("htmlBody", draft.html_body.is_some()),
            ("textBody", draft.text_body.is_some()),
            ("alias", draft.alias.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect();

        let record = self
            .provider
            .edit_template(&args.template_id_or_alias, &draft)
            .await?;
        Ok(render::template_updated(&record, &updated_fields))
    }

    async fn delete_template(&self, args: DeleteTemplateArgs) -> Result<String, ToolError> {
        let receipt = self
            .provider
            .delete_template(&args.template_id_or_alias)
            .await?;
        Ok(render::template_deleted(&args.template_id_or_alias, &receipt))
    }

    async fn push_templates(
        &self,
        args: TemplatePushArgs,
        perform_changes: bool,
    ) -> Result<String, ToolError> {
        let account_token = self.config.account_token.as_deref().ok_or_else(|| {
            ToolError::validation(
                "POSTMARK_ACCOUNT_TOKEN is required for template push operations",
            )
        })?;

        let request = TemplatePushRequest {
            source_server_id: args.source_server_id,
            destination_server_id: args.destination_server_id,
            perform_changes,
        };
        let result = self.provider.push_templates(account_token, &request).await?;
        Ok(render::template_push(
            &result,
            args.source_server_id,
            args.destination_server_id,
            perform_changes,
        ))
    }

    // --- Local template library ---

    async fn list_template_categories(&self) -> String {
        match self.library.list_categories().await {
            Ok(categories) => render::categories(&categories),
            Err(e) => {
                warn!(code = %e.code, "Listing template categories failed");
                render::store_failure("list template categories", &e)
            }
        }
    }

    async fn list_templates_in_category(&self, args: ListTemplatesInCategoryArgs) -> String {
        match self
            .library
            .list_templates_in_category(&args.category_name)
            .await
        {
            Ok(templates) => render::category_templates(&args.category_name, &templates),
            Err(e) => {
                warn!(category = %args.category_name, code = %e.code, "Listing templates failed");
                render::store_failure(
                    &format!("list templates in category '{}'", args.category_name),
                    &e,
                )
            }
        }
    }

    async fn get_template_content(&self, args: GetTemplateContentArgs) -> String {
        let format = match args.format.as_deref().map(str::parse::<ContentFormat>) {
            None => ContentFormat::default(),
            Some(Ok(format)) => format,
            Some(Err(message)) => return message,
        };

        match self
            .library
            .get_template_content(&args.category_name, &args.template_name, format)
            .await
        {
            Ok(content) => render::template_content(format, &content),
            Err(e) => {
                warn!(
                    category = %args.category_name,
                    template = %args.template_name,
                    code = %e.code,
                    "Reading template content failed"
                );
                render::store_failure(
                    &format!(
                        "read {} content of template '{}/{}'",
                        format.as_str(),
                        args.category_name,
                        args.template_name
                    ),
                    &e,
                )
            }
        }
    }

    async fn get_template_ideas(&self, args: GetTemplateIdeasArgs) -> String {
        match self.library.get_template_ideas(&args.topic).await {
            Ok(ideas) => render::ideas(&args.topic, &ideas),
            Err(e) => {
                warn!(code = %e.code, "Searching template ideas failed");
                render::store_failure("search template ideas", &e)
            }
        }
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ToolError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                ToolError::validation(format!(
                    "{} must be a date in YYYY-MM-DD format, got '{}'",
                    field, v
                ))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("fromDate", None).unwrap(), None);
        assert_eq!(
            parse_date("fromDate", Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        for bad in ["2024-13-01", "01/02/2024", "yesterday", "2023-02-29"] {
            let err = parse_date("toDate", Some(bad)).unwrap_err();
            assert!(matches!(err, ToolError::Validation(ref m) if m.contains("toDate")));
        }
    }

    #[test]
    fn test_unexpected_error_message() {
        let err = ToolError::unexpected(SEND_EMAIL);
        assert_eq!(
            err.to_string(),
            "UNEXPECTED_ERROR: An unexpected error occurred while running sendEmail"
        );
    }
}
