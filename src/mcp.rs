//! MCP server exposing the Postmark tools.
//!
//! Each `#[tool]` method only builds the matching [`ToolCall`]; argument schemas come
//! from the typed argument structs and all behavior lives in [`PostmarkTools`].
//! A [`ToolError`] becomes an error result (`isError: true`) carrying the
//! human-readable message; it never tears down the session.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};

use crate::tools::*;

const INSTRUCTIONS: &str = "Postmark email tools.\n\
Sending: sendEmail for plain messages, sendEmailWithTemplate for stored templates \
(templateId or templateAlias). The sender defaults to the configured address and \
open/link tracking is always enabled.\n\
Server templates: listTemplates, createTemplate, updateTemplate, deleteTemplate. \
Use simulateTemplatePush before executeTemplatePush to preview cross-server copies.\n\
Statistics: getDeliveryStats with optional tag and YYYY-MM-DD dates.\n\
Local template library: listTemplateCategories → listTemplatesInCategory → \
getTemplateContent, or getTemplateIdeas to search template names by keyword.";

/// MCP handler wrapping the tool registry.
#[derive(Clone)]
pub struct PostmarkMcpServer {
    tool_router: ToolRouter<Self>,
    tools: PostmarkTools,
}

impl PostmarkMcpServer {
    pub fn new(tools: PostmarkTools) -> Self {
        Self {
            tool_router: Self::tool_router(),
            tools,
        }
    }

    async fn run(&self, call: ToolCall) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.tools.invoke(call).await))
    }
}

/// Map a registry outcome onto an MCP tool result.
pub fn into_call_result(outcome: Result<String, ToolError>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for PostmarkMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("Postmark MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Send email, manage templates and read delivery statistics through \
                     Postmark, and browse a local template library"
                        .to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[tool_router(router = tool_router)]
impl PostmarkMcpServer {
    // ── Sending ──

    #[tool(
        name = "sendEmail",
        description = "Send a single email. Requires to, subject and textBody; htmlBody, from and tag are optional. The sender defaults to the configured address."
    )]
    pub async fn send_email(
        &self,
        Parameters(args): Parameters<SendEmailArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::SendEmail(args)).await
    }

    #[tool(
        name = "sendEmailWithTemplate",
        description = "Send an email rendered from a stored template. Requires to, templateModel and either templateId or templateAlias."
    )]
    pub async fn send_email_with_template(
        &self,
        Parameters(args): Parameters<SendEmailWithTemplateArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::SendEmailWithTemplate(args)).await
    }

    // ── Server templates ──

    #[tool(
        name = "listTemplates",
        description = "List the templates stored on the Postmark server with their ids, aliases and subjects."
    )]
    pub async fn list_templates(
        &self,
        Parameters(_): Parameters<NoArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::ListTemplates).await
    }

    #[tool(
        name = "createTemplate",
        description = "Create a template on the Postmark server. Requires name, subject and at least one of htmlBody or textBody."
    )]
    pub async fn create_template(
        &self,
        Parameters(args): Parameters<CreateTemplateArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::CreateTemplate(args)).await
    }

    #[tool(
        name = "updateTemplate",
        description = "Update an existing template by id or alias. Provide at least one of name, subject, htmlBody, textBody or alias."
    )]
    pub async fn update_template(
        &self,
        Parameters(args): Parameters<UpdateTemplateArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::UpdateTemplate(args)).await
    }

    #[tool(
        name = "deleteTemplate",
        description = "Delete a template from the Postmark server by id or alias."
    )]
    pub async fn delete_template(
        &self,
        Parameters(args): Parameters<DeleteTemplateArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::DeleteTemplate(args)).await
    }

    #[tool(
        name = "simulateTemplatePush",
        description = "Preview copying templates from one server to another without changing anything. Requires the account token."
    )]
    pub async fn simulate_template_push(
        &self,
        Parameters(args): Parameters<TemplatePushArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::SimulateTemplatePush(args)).await
    }

    #[tool(
        name = "executeTemplatePush",
        description = "Copy templates from one server to another. Run simulateTemplatePush first. Requires the account token."
    )]
    pub async fn execute_template_push(
        &self,
        Parameters(args): Parameters<TemplatePushArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::ExecuteTemplatePush(args)).await
    }

    // ── Statistics ──

    #[tool(
        name = "getDeliveryStats",
        description = "Outbound delivery statistics: sent count, open rate and click rate. Optional tag, fromDate and toDate (YYYY-MM-DD)."
    )]
    pub async fn get_delivery_stats(
        &self,
        Parameters(args): Parameters<GetDeliveryStatsArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::GetDeliveryStats(args)).await
    }

    // ── Local template library ──

    #[tool(
        name = "listTemplateCategories",
        description = "List the categories of the local template library."
    )]
    pub async fn list_template_categories(
        &self,
        Parameters(_): Parameters<NoArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::ListTemplateCategories).await
    }

    #[tool(
        name = "listTemplatesInCategory",
        description = "List the templates in one category of the local template library."
    )]
    pub async fn list_templates_in_category(
        &self,
        Parameters(args): Parameters<ListTemplatesInCategoryArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::ListTemplatesInCategory(args)).await
    }

    #[tool(
        name = "getTemplateContent",
        description = "Read the HTML (default) or plain text content of a local template."
    )]
    pub async fn get_template_content(
        &self,
        Parameters(args): Parameters<GetTemplateContentArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::GetTemplateContent(args)).await
    }

    #[tool(
        name = "getTemplateIdeas",
        description = "Search local template names for a keyword (case-insensitive) and list matching templates with their categories."
    )]
    pub async fn get_template_ideas(
        &self,
        Parameters(args): Parameters<GetTemplateIdeasArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.run(ToolCall::GetTemplateIdeas(args)).await
    }
}
