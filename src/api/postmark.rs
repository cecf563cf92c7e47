//! Postmark REST API client.
//!
//! Server-scoped calls authenticate with `X-Postmark-Server-Token`; the template
//! push endpoint is account-scoped and uses `X-Postmark-Account-Token`.
//! See: <https://postmarkapp.com/developer/api/overview>

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::client::{EmailProvider, ProviderError};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::model::{
    ApiReceipt, OutboundMessage, OutboundStats, SendReceipt, StatsQuery, TemplateDraft,
    TemplateList, TemplatePushRequest, TemplatePushResult, TemplateRecord, TemplatedMessage,
};
use crate::options::TransportOptions;

pub const POSTMARK_API_BASE: &str = "https://api.postmarkapp.com";

const SERVER_TOKEN_HEADER: &str = "x-postmark-server-token";
const ACCOUNT_TOKEN_HEADER: &str = "x-postmark-account-token";

/// Largest page the template listing endpoint accepts.
const TEMPLATE_PAGE_SIZE: u32 = 500;

/// Postmark client bound to one server token.
#[derive(Debug, Clone)]
pub struct PostmarkClient {
    server_token: String,
    base_url: Url,
    transport_options: TransportOptions,
    http: reqwest::Client,
}

impl PostmarkClient {
    pub fn new(
        server_token: String,
        base_url: &str,
        transport_options: TransportOptions,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ProviderError::Config(format!("Invalid API base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Config(format!(
                "Invalid API base URL '{}'",
                base_url
            )));
        }
        let http = build_http_client(&transport_options)?;

        Ok(Self {
            server_token,
            base_url,
            transport_options,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        token_header: &'static str,
        token: &str,
    ) -> Result<RequestBuilder, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            token_header,
            HeaderValue::from_str(token)
                .map_err(|_| ProviderError::Config("Invalid API token".to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let req = self.http.request(method, url).headers(headers);
        Ok(add_extra_headers(req, &self.transport_options))
    }

    fn server_request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ProviderError> {
        self.request(
            method,
            self.endpoint(segments),
            SERVER_TOKEN_HEADER,
            &self.server_token,
        )
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ProviderError> {
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        response.json_logged().await
    }

    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ProviderError {
        match serde_json::from_str::<PostmarkErrorResponse>(body) {
            Ok(error_resp) => ProviderError::Api {
                status: status.as_u16(),
                error_code: error_resp.error_code,
                message: error_resp.message,
            },
            Err(_) => ProviderError::Status {
                status: status.as_u16(),
                body: body.to_string(),
            },
        }
    }
}

#[async_trait]
impl EmailProvider for PostmarkClient {
    async fn send_email(&self, message: &OutboundMessage) -> Result<SendReceipt, ProviderError> {
        info!(to = %message.to, stream = %message.message_stream, "Sending email");
        let req = self.server_request(Method::POST, &["email"])?.json_logged(message);
        self.execute(req).await
    }

    async fn send_email_with_template(
        &self,
        message: &TemplatedMessage,
    ) -> Result<SendReceipt, ProviderError> {
        info!(to = %message.to, stream = %message.message_stream, "Sending templated email");
        let req = self
            .server_request(Method::POST, &["email", "withTemplate"])?
            .json_logged(message);
        self.execute(req).await
    }

    async fn list_templates(&self) -> Result<TemplateList, ProviderError> {
        let req = self
            .server_request(Method::GET, &["templates"])?
            .query(&[("count", TEMPLATE_PAGE_SIZE), ("offset", 0)]);
        self.execute(req).await
    }

    async fn create_template(&self, draft: &TemplateDraft) -> Result<TemplateRecord, ProviderError> {
        info!(name = ?draft.name, "Creating template");
        let req = self
            .server_request(Method::POST, &["templates"])?
            .json_logged(draft);
        self.execute(req).await
    }

    async fn edit_template(
        &self,
        id_or_alias: &str,
        draft: &TemplateDraft,
    ) -> Result<TemplateRecord, ProviderError> {
        info!(template = %id_or_alias, "Editing template");
        let req = self
            .server_request(Method::PUT, &["templates", id_or_alias])?
            .json_logged(draft);
        self.execute(req).await
    }

    async fn delete_template(&self, id_or_alias: &str) -> Result<ApiReceipt, ProviderError> {
        info!(template = %id_or_alias, "Deleting template");
        let req = self.server_request(Method::DELETE, &["templates", id_or_alias])?;
        self.execute(req).await
    }

    async fn outbound_stats(&self, query: &StatsQuery) -> Result<OutboundStats, ProviderError> {
        let req = self
            .server_request(Method::GET, &["stats", "outbound"])?
            .query(&query.to_query());
        self.execute(req).await
    }

    async fn push_templates(
        &self,
        account_token: &str,
        request: &TemplatePushRequest,
    ) -> Result<TemplatePushResult, ProviderError> {
        info!(
            source = request.source_server_id,
            destination = request.destination_server_id,
            perform_changes = request.perform_changes,
            "Pushing templates"
        );
        let req = self
            .request(
                Method::PUT,
                self.endpoint(&["templates", "push"]),
                ACCOUNT_TOKEN_HEADER,
                account_token,
            )?
            .json_logged(request);
        self.execute(req).await
    }
}

// --- Response Types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkErrorResponse {
    #[serde(default)]
    error_code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> PostmarkClient {
        PostmarkClient::new("server-token".to_string(), base, TransportOptions::default()).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let c = client(POSTMARK_API_BASE);
        assert_eq!(
            c.endpoint(&["email", "withTemplate"]).as_str(),
            "https://api.postmarkapp.com/email/withTemplate"
        );

        let c = client("http://127.0.0.1:9000/");
        assert_eq!(
            c.endpoint(&["stats", "outbound"]).as_str(),
            "http://127.0.0.1:9000/stats/outbound"
        );
    }

    #[test]
    fn test_endpoint_escapes_aliases() {
        let c = client(POSTMARK_API_BASE);
        assert_eq!(
            c.endpoint(&["templates", "a/b c"]).as_str(),
            "https://api.postmarkapp.com/templates/a%2Fb%20c"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = PostmarkClient::new("t".to_string(), "not a url", TransportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn test_handle_error_response() {
        let err = PostmarkClient::handle_error_response(
            reqwest::StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"ErrorCode": 1101, "Message": "Template not found"}"#,
        );
        match err {
            ProviderError::Api {
                status,
                error_code,
                ref message,
            } => {
                assert_eq!(status, 422);
                assert_eq!(error_code, 1101);
                assert_eq!(message, "Template not found");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert_eq!(err.status(), Some(422));

        let err = PostmarkClient::handle_error_response(
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream unavailable",
        );
        assert!(matches!(err, ProviderError::Status { status: 502, .. }));
        assert!(err.to_string().contains("upstream unavailable"));
    }
}
