//! HTTP client utilities for talking to the provider API.

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::client::ProviderError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ProviderError> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(t) = transport_options.timeout {
        builder = builder.timeout(t);
    }
    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ProviderError::Config(format!("Invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    transport_options: &TransportOptions,
) -> RequestBuilder {
    if let Some(headers) = &transport_options.headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Message content fields replaced by their size in debug logs.
const REDACTED_FIELDS: [&str; 3] = ["HtmlBody", "TextBody", "TemplateModel"];

/// Logged bodies are cut after this many characters.
const LOGGED_BODY_LIMIT: usize = 2048;

/// Render a JSON body for the debug log with message content redacted.
pub fn loggable_json(value: &Value) -> String {
    let mut value = value.clone();
    if let Value::Object(map) = &mut value {
        for field in REDACTED_FIELDS {
            if let Some(v) = map.get_mut(field) {
                let len = v.to_string().len();
                *v = Value::String(format!("<redacted, {} bytes>", len));
            }
        }
    }
    let pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
    truncate_for_log(&pretty)
}

/// Cut `text` to the logging limit on a char boundary.
pub fn truncate_for_log(text: &str) -> String {
    match text.char_indices().nth(LOGGED_BODY_LIMIT) {
        Some((cut, _)) => format!("{}... ({} bytes total)", &text[..cut], text.len()),
        None => text.to_string(),
    }
}

/// Extension trait for RequestBuilder that logs the request body.
pub trait RequestBuilderExt {
    /// Set JSON request body and log a redacted copy. Returns the RequestBuilder for chaining.
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        if let Ok(value) = serde_json::to_value(json) {
            let body = loggable_json(&value);
            tracing::debug!("API request body ({} bytes):\n{}", body.len(), body);
        }

        self.json(json)
    }
}

/// Extension trait for Response that logs the response body.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Get response text and log it. Consumes the response.
    async fn text_logged(self) -> Result<String, reqwest::Error>;

    /// Parse response as JSON and log it. Consumes the response.
    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, ProviderError>;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn text_logged(self) -> Result<String, reqwest::Error> {
        let status = self.status();
        let text = self.text().await?;
        tracing::debug!(%status, "API response ({} bytes):\n{}", text.len(), truncate_for_log(&text));
        Ok(text)
    }

    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, ProviderError> {
        let status = self.status();
        let bytes = self.bytes().await?;

        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            tracing::debug!(%status, "API response ({} bytes):\n{}", bytes.len(), loggable_json(&value));
        }

        serde_json::from_slice(&bytes).map_err(ProviderError::from)
    }
}
