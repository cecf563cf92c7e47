//! Argument structs for every tool, and the [`ToolCall`] sum type used for dispatch.
//!
//! All structs reject unknown fields so a misspelled argument fails before the
//! handler runs instead of being silently dropped.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::ToolError;

pub const SEND_EMAIL: &str = "sendEmail";
pub const SEND_EMAIL_WITH_TEMPLATE: &str = "sendEmailWithTemplate";
pub const LIST_TEMPLATES: &str = "listTemplates";
pub const GET_DELIVERY_STATS: &str = "getDeliveryStats";
pub const LIST_TEMPLATE_CATEGORIES: &str = "listTemplateCategories";
pub const LIST_TEMPLATES_IN_CATEGORY: &str = "listTemplatesInCategory";
pub const GET_TEMPLATE_CONTENT: &str = "getTemplateContent";
pub const GET_TEMPLATE_IDEAS: &str = "getTemplateIdeas";
pub const CREATE_TEMPLATE: &str = "createTemplate";
pub const UPDATE_TEMPLATE: &str = "updateTemplate";
pub const DELETE_TEMPLATE: &str = "deleteTemplate";
pub const SIMULATE_TEMPLATE_PUSH: &str = "simulateTemplatePush";
pub const EXECUTE_TEMPLATE_PUSH: &str = "executeTemplatePush";

/// Every registered tool name, in registration order.
pub const TOOL_NAMES: [&str; 13] = [
    SEND_EMAIL,
    SEND_EMAIL_WITH_TEMPLATE,
    LIST_TEMPLATES,
    GET_DELIVERY_STATS,
    LIST_TEMPLATE_CATEGORIES,
    LIST_TEMPLATES_IN_CATEGORY,
    GET_TEMPLATE_CONTENT,
    GET_TEMPLATE_IDEAS,
    CREATE_TEMPLATE,
    UPDATE_TEMPLATE,
    DELETE_TEMPLATE,
    SIMULATE_TEMPLATE_PUSH,
    EXECUTE_TEMPLATE_PUSH,
];

// ── sendEmail ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendEmailArgs {
    #[schemars(description = "Recipient email address")]
    pub to: String,
    #[schemars(description = "Email subject line")]
    pub subject: String,
    #[schemars(description = "Plain text body")]
    pub text_body: String,
    #[schemars(description = "HTML body (optional)")]
    pub html_body: Option<String>,
    #[schemars(description = "Sender address. Defaults to the configured sender")]
    pub from: Option<String>,
    #[schemars(description = "Tag for categorizing the message")]
    pub tag: Option<String>,
}

// ── sendEmailWithTemplate ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendEmailWithTemplateArgs {
    #[schemars(description = "Recipient email address")]
    pub to: String,
    #[schemars(description = "Numeric template id. Required unless templateAlias is given")]
    pub template_id: Option<u64>,
    #[schemars(description = "Template alias. Required unless templateId is given")]
    pub template_alias: Option<String>,
    #[schemars(description = "Values substituted into the template")]
    pub template_model: Map<String, Value>,
    #[schemars(description = "Sender address. Defaults to the configured sender")]
    pub from: Option<String>,
    #[schemars(description = "Tag for categorizing the message")]
    pub tag: Option<String>,
}

// ── getDeliveryStats ──

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetDeliveryStatsArgs {
    #[schemars(description = "Only count messages with this tag")]
    pub tag: Option<String>,
    #[schemars(description = "Start date, YYYY-MM-DD")]
    pub from_date: Option<String>,
    #[schemars(description = "End date, YYYY-MM-DD")]
    pub to_date: Option<String>,
}

// ── listTemplatesInCategory ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListTemplatesInCategoryArgs {
    #[schemars(description = "Category directory name, as returned by listTemplateCategories")]
    pub category_name: String,
}

// ── getTemplateContent ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetTemplateContentArgs {
    #[schemars(description = "Category directory name")]
    pub category_name: String,
    #[schemars(description = "Template directory name")]
    pub template_name: String,
    #[schemars(description = "Content format: 'html' (default) or 'text'")]
    pub format: Option<String>,
}

// ── getTemplateIdeas ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetTemplateIdeasArgs {
    #[schemars(description = "Keyword matched against template names, case-insensitive")]
    pub topic: String,
}

// ── createTemplate ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTemplateArgs {
    #[schemars(description = "Template name")]
    pub name: String,
    #[schemars(description = "Subject line, may contain template placeholders")]
    pub subject: String,
    #[schemars(description = "HTML body. Required unless textBody is given")]
    pub html_body: Option<String>,
    #[schemars(description = "Plain text body. Required unless htmlBody is given")]
    pub text_body: Option<String>,
    #[schemars(description = "Optional unique alias")]
    pub alias: Option<String>,
}

// ── updateTemplate ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTemplateArgs {
    #[schemars(description = "Template id or alias to update")]
    pub template_id_or_alias: String,
    #[schemars(description = "New template name")]
    pub name: Option<String>,
    #[schemars(description = "New subject line")]
    pub subject: Option<String>,
    #[schemars(description = "New HTML body")]
    pub html_body: Option<String>,
    #[schemars(description = "New plain text body")]
    pub text_body: Option<String>,
    #[schemars(description = "New alias")]
    pub alias: Option<String>,
}

// ── deleteTemplate ──

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteTemplateArgs {
    #[schemars(description = "Template id or alias to delete")]
    pub template_id_or_alias: String,
}

// ── simulateTemplatePush / executeTemplatePush ──

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TemplatePushArgs {
    #[serde(rename = "sourceServerID")]
    #[schemars(description = "Server id to copy templates from")]
    pub source_server_id: u64,
    #[serde(rename = "destinationServerID")]
    #[schemars(description = "Server id to copy templates to")]
    pub destination_server_id: u64,
}

/// Arguments for tools that take none.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

/// One validated tool invocation.
#[derive(Debug, Clone)]
pub enum ToolCall {
    SendEmail(SendEmailArgs),
    SendEmailWithTemplate(SendEmailWithTemplateArgs),
    ListTemplates,
    GetDeliveryStats(GetDeliveryStatsArgs),
    ListTemplateCategories,
    ListTemplatesInCategory(ListTemplatesInCategoryArgs),
    GetTemplateContent(GetTemplateContentArgs),
    GetTemplateIdeas(GetTemplateIdeasArgs),
    CreateTemplate(CreateTemplateArgs),
    UpdateTemplate(UpdateTemplateArgs),
    DeleteTemplate(DeleteTemplateArgs),
    SimulateTemplatePush(TemplatePushArgs),
    ExecuteTemplatePush(TemplatePushArgs),
}

impl ToolCall {
    /// Resolve a tool name and raw JSON arguments into a typed call.
    ///
    /// A missing (`null`) argument object is treated as `{}`.
    pub fn parse(name: &str, args: Value) -> Result<Self, ToolError> {
        let args = match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let call = match name {
            SEND_EMAIL => Self::SendEmail(decode(name, args)?),
            SEND_EMAIL_WITH_TEMPLATE => Self::SendEmailWithTemplate(decode(name, args)?),
            LIST_TEMPLATES => {
                decode::<NoArgs>(name, args)?;
                Self::ListTemplates
            }
            GET_DELIVERY_STATS => Self::GetDeliveryStats(decode(name, args)?),
            LIST_TEMPLATE_CATEGORIES => {
                decode::<NoArgs>(name, args)?;
                Self::ListTemplateCategories
            }
            LIST_TEMPLATES_IN_CATEGORY => Self::ListTemplatesInCategory(decode(name, args)?),
            GET_TEMPLATE_CONTENT => Self::GetTemplateContent(decode(name, args)?),
            GET_TEMPLATE_IDEAS => Self::GetTemplateIdeas(decode(name, args)?),
            CREATE_TEMPLATE => Self::CreateTemplate(decode(name, args)?),
            UPDATE_TEMPLATE => Self::UpdateTemplate(decode(name, args)?),
            DELETE_TEMPLATE => Self::DeleteTemplate(decode(name, args)?),
            SIMULATE_TEMPLATE_PUSH => Self::SimulateTemplatePush(decode(name, args)?),
            EXECUTE_TEMPLATE_PUSH => Self::ExecuteTemplatePush(decode(name, args)?),
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };

        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SendEmail(_) => SEND_EMAIL,
            Self::SendEmailWithTemplate(_) => SEND_EMAIL_WITH_TEMPLATE,
            Self::ListTemplates => LIST_TEMPLATES,
            Self::GetDeliveryStats(_) => GET_DELIVERY_STATS,
            Self::ListTemplateCategories => LIST_TEMPLATE_CATEGORIES,
            Self::ListTemplatesInCategory(_) => LIST_TEMPLATES_IN_CATEGORY,
            Self::GetTemplateContent(_) => GET_TEMPLATE_CONTENT,
            Self::GetTemplateIdeas(_) => GET_TEMPLATE_IDEAS,
            Self::CreateTemplate(_) => CREATE_TEMPLATE,
            Self::UpdateTemplate(_) => UPDATE_TEMPLATE,
            Self::DeleteTemplate(_) => DELETE_TEMPLATE,
            Self::SimulateTemplatePush(_) => SIMULATE_TEMPLATE_PUSH,
            Self::ExecuteTemplatePush(_) => EXECUTE_TEMPLATE_PUSH,
        }
    }
}

fn decode<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}
