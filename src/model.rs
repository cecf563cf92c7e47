//! Request and response types exchanged with the email provider.
//!
//! Field names follow the Postmark REST API (PascalCase on the wire).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Link tracking mode for outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTracking {
    None,
    HtmlAndText,
    HtmlOnly,
    TextOnly,
}

/// A plain (non-templated) outgoing email.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
    pub tag: Option<String>,
    pub message_stream: String,
    pub track_opens: bool,
    pub track_links: LinkTracking,
}

/// Reference to a stored template, by numeric id or by alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Id(u64),
    Alias(String),
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRef::Id(id) => write!(f, "{}", id),
            TemplateRef::Alias(alias) => f.write_str(alias),
        }
    }
}

/// An outgoing email rendered server-side from a stored template.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplatedMessage {
    pub from: String,
    pub to: String,
    pub template_id: Option<u64>,
    pub template_alias: Option<String>,
    pub template_model: serde_json::Map<String, serde_json::Value>,
    pub tag: Option<String>,
    pub message_stream: String,
    pub track_opens: bool,
    pub track_links: LinkTracking,
}

impl TemplatedMessage {
    /// The template this message is rendered from.
    pub fn template_ref(&self) -> Option<TemplateRef> {
        match (self.template_id, &self.template_alias) {
            (Some(id), _) => Some(TemplateRef::Id(id)),
            (None, Some(alias)) => Some(TemplateRef::Alias(alias.clone())),
            (None, None) => None,
        }
    }
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendReceipt {
    #[serde(rename = "MessageID")]
    pub message_id: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
}

/// One entry of the server's template listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateSummary {
    pub template_id: u64,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub template_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateList {
    pub total_count: u64,
    #[serde(default)]
    pub templates: Vec<TemplateSummary>,
}

/// Body of a template create or edit call. Absent fields are left untouched on edit.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateDraft {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub html_body: Option<String>,
    pub text_body: Option<String>,
    pub alias: Option<String>,
}

impl TemplateDraft {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.subject.is_none()
            && self.html_body.is_none()
            && self.text_body.is_none()
            && self.alias.is_none()
    }
}

/// A template as returned by create and edit calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateRecord {
    pub template_id: u64,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Generic `{ErrorCode, Message}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiReceipt {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
}

/// Filters for the outbound statistics overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    pub tag: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl StatsQuery {
    /// Query string pairs in the form the stats endpoint expects.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from_date {
            pairs.push(("fromdate", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to_date {
            pairs.push(("todate", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(tag) = &self.tag {
            pairs.push(("tag", tag.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OutboundStats {
    pub sent: u64,
    pub bounced: u64,
    pub spam_complaints: u64,
    pub tracked: u64,
    pub unique_opens: u64,
    pub total_tracked_links_sent: u64,
    pub unique_links_clicked: u64,
}

impl OutboundStats {
    pub fn open_rate(&self) -> f64 {
        percentage(self.unique_opens, self.tracked)
    }

    pub fn click_rate(&self) -> f64 {
        percentage(self.unique_links_clicked, self.total_tracked_links_sent)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Copy templates from one server to another, optionally as a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplatePushRequest {
    #[serde(rename = "SourceServerID")]
    pub source_server_id: u64,
    #[serde(rename = "DestinationServerID")]
    pub destination_server_id: u64,
    #[serde(rename = "PerformChanges")]
    pub perform_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PushedTemplate {
    pub action: String,
    #[serde(default)]
    pub template_id: Option<u64>,
    #[serde(default)]
    pub alias: Option<String>,
    pub name: String,
    #[serde(default)]
    pub template_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplatePushResult {
    pub total_count: u64,
    #[serde(default)]
    pub templates: Vec<PushedTemplate>,
}
