//! PostmarkClient against an in-process fake of the Postmark REST API.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use postmark_mcp::client::{EmailProvider, ProviderError};
use postmark_mcp::model::{
    LinkTracking, OutboundMessage, StatsQuery, TemplateDraft, TemplatePushRequest,
    TemplatedMessage,
};
use postmark_mcp::options::TransportOptions;
use postmark_mcp::PostmarkClient;

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Value,
}

impl Seen {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn record(log: &Log, method: Method, uri: &Uri, headers: HeaderMap, body: &str) {
    log.lock().unwrap().push(Seen {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_str(body).unwrap_or(Value::Null),
    });
}

fn receipt() -> Json<Value> {
    Json(json!({
        "To": "user@example.com",
        "SubmittedAt": "2024-01-01T00:00:00Z",
        "MessageID": "b7bc2f4a-e38e-4336-af7d-e6c392c2f817",
        "ErrorCode": 0,
        "Message": "OK"
    }))
}

async fn send_email(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    record(&log, method, &uri, headers, &body);
    receipt()
}

async fn list_templates(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    record(&log, method, &uri, headers, "");
    Json(json!({
        "TotalCount": 2,
        "Templates": [
            {"TemplateId": 1, "Name": "Welcome", "Alias": "welcome", "Subject": "Hi", "Active": true, "TemplateType": "Standard"},
            {"TemplateId": 2, "Name": "Layout", "Alias": null, "Active": true, "TemplateType": "Layout"}
        ]
    }))
}

async fn create_template(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    record(&log, method, &uri, headers, &body);
    Json(json!({"TemplateId": 99, "Name": "Welcome", "Alias": "welcome", "Active": true}))
}

async fn edit_template(
    State(log): State<Log>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    record(&log, method, &uri, headers, &body);
    if id == "missing" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"ErrorCode": 1101, "Message": "The template 'missing' was not found."})),
        )
            .into_response();
    }
    Json(json!({"TemplateId": 5, "Name": id, "Alias": id, "Active": true})).into_response()
}

async fn delete_template(
    State(log): State<Log>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&log, method, &uri, headers, "");
    if id == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    Json(json!({"ErrorCode": 0, "Message": format!("Template {} removed.", id)})).into_response()
}

async fn outbound_stats(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    record(&log, method, &uri, headers, "");
    Json(json!({
        "Sent": 615,
        "Bounced": 64,
        "SpamComplaints": 10,
        "Tracked": 277,
        "UniqueOpens": 166,
        "TotalTrackedLinksSent": 60,
        "UniqueLinksClicked": 30
    }))
}

async fn push_templates(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    record(&log, method, &uri, headers, &body);
    Json(json!({
        "TotalCount": 1,
        "Templates": [
            {"Action": "Create", "TemplateId": null, "Alias": "welcome", "Name": "Welcome", "TemplateType": "Standard"}
        ]
    }))
}

async fn spawn_fake_postmark() -> (String, Log) {
    let log = Log::default();
    let app = Router::new()
        .route("/email", post(send_email))
        .route("/email/withTemplate", post(send_email))
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/push", put(push_templates))
        .route("/templates/{id}", put(edit_template).delete(delete_template))
        .route("/stats/outbound", get(outbound_stats))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), log)
}

fn client(base: &str) -> PostmarkClient {
    PostmarkClient::new(
        "server-token".to_string(),
        base,
        TransportOptions::new().with_header("x-request-source", "tests"),
    )
    .unwrap()
}

fn last(log: &Log) -> Seen {
    log.lock().unwrap().last().cloned().unwrap()
}

#[tokio::test]
async fn test_send_email_request_shape() {
    let (base, log) = spawn_fake_postmark().await;
    let message = OutboundMessage {
        from: "sender@example.com".to_string(),
        to: "user@example.com".to_string(),
        subject: "Hi".to_string(),
        text_body: "Hello".to_string(),
        html_body: None,
        tag: Some("welcome".to_string()),
        message_stream: "outbound".to_string(),
        track_opens: true,
        track_links: LinkTracking::HtmlAndText,
    };

    let receipt = client(&base).send_email(&message).await.unwrap();
    assert_eq!(receipt.message_id, "b7bc2f4a-e38e-4336-af7d-e6c392c2f817");

    let seen = last(&log);
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/email");
    assert_eq!(seen.header("x-postmark-server-token"), Some("server-token"));
    assert_eq!(seen.header("x-postmark-account-token"), None);
    assert_eq!(seen.header("x-request-source"), Some("tests"));
    assert!(seen
        .header("user-agent")
        .is_some_and(|ua| ua.starts_with("postmark-mcp/")));
    assert_eq!(
        seen.body,
        json!({
            "From": "sender@example.com",
            "To": "user@example.com",
            "Subject": "Hi",
            "TextBody": "Hello",
            "Tag": "welcome",
            "MessageStream": "outbound",
            "TrackOpens": true,
            "TrackLinks": "HtmlAndText"
        })
    );
}

#[tokio::test]
async fn test_send_email_with_template_request_shape() {
    let (base, log) = spawn_fake_postmark().await;
    let mut model = Map::new();
    model.insert("name".to_string(), json!("Ada"));
    let message = TemplatedMessage {
        from: "sender@example.com".to_string(),
        to: "user@example.com".to_string(),
        template_id: None,
        template_alias: Some("welcome".to_string()),
        template_model: model,
        tag: None,
        message_stream: "outbound".to_string(),
        track_opens: true,
        track_links: LinkTracking::HtmlAndText,
    };

    client(&base)
        .send_email_with_template(&message)
        .await
        .unwrap();

    let seen = last(&log);
    assert_eq!(seen.path, "/email/withTemplate");
    assert_eq!(seen.body["TemplateAlias"], "welcome");
    assert_eq!(seen.body["TemplateModel"]["name"], "Ada");
    assert!(seen.body.get("TemplateId").is_none());
}

#[tokio::test]
async fn test_list_templates_paging() {
    let (base, log) = spawn_fake_postmark().await;
    let list = client(&base).list_templates().await.unwrap();

    assert_eq!(list.total_count, 2);
    assert_eq!(list.templates[0].alias.as_deref(), Some("welcome"));
    assert_eq!(list.templates[1].alias, None);
    assert_eq!(list.templates[1].subject, None);

    let seen = last(&log);
    assert_eq!(seen.query.as_deref(), Some("count=500&offset=0"));
}

#[tokio::test]
async fn test_create_and_edit_template() {
    let (base, log) = spawn_fake_postmark().await;
    let client = client(&base);

    let draft = TemplateDraft {
        name: Some("Welcome".to_string()),
        subject: Some("Hi {{name}}".to_string()),
        html_body: Some("<p>Hi</p>".to_string()),
        text_body: None,
        alias: Some("welcome".to_string()),
    };
    let record = client.create_template(&draft).await.unwrap();
    assert_eq!(record.template_id, 99);
    let seen = last(&log);
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/templates");
    assert!(seen.body.get("TextBody").is_none());

    let edit = TemplateDraft {
        subject: Some("New".to_string()),
        ..Default::default()
    };
    let record = client.edit_template("a/b c", &edit).await.unwrap();
    assert_eq!(record.name, "a/b c");
    let seen = last(&log);
    assert_eq!(seen.method, Method::PUT);
    assert_eq!(seen.path, "/templates/a%2Fb%20c");
    assert_eq!(seen.body, json!({"Subject": "New"}));
}

#[tokio::test]
async fn test_api_error_mapping() {
    let (base, _log) = spawn_fake_postmark().await;
    let client = client(&base);

    let err = client
        .edit_template("missing", &TemplateDraft::default())
        .await
        .unwrap_err();
    match err {
        ProviderError::Api {
            status,
            error_code,
            ref message,
        } => {
            assert_eq!(status, 422);
            assert_eq!(error_code, 1101);
            assert!(message.contains("not found"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }

    let err = client.delete_template("boom").await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 500, ref body } if body == "upstream exploded"));
}

#[tokio::test]
async fn test_delete_template() {
    let (base, log) = spawn_fake_postmark().await;
    let receipt = client(&base).delete_template("12345").await.unwrap();

    assert_eq!(receipt.message, "Template 12345 removed.");
    let seen = last(&log);
    assert_eq!(seen.method, Method::DELETE);
    assert_eq!(seen.path, "/templates/12345");
}

#[tokio::test]
async fn test_outbound_stats_query() {
    let (base, log) = spawn_fake_postmark().await;
    let query = StatsQuery {
        tag: Some("welcome".to_string()),
        from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        to_date: NaiveDate::from_ymd_opt(2024, 1, 31),
    };

    let stats = client(&base).outbound_stats(&query).await.unwrap();
    assert_eq!(stats.sent, 615);
    assert_eq!(stats.unique_opens, 166);
    assert!((stats.click_rate() - 50.0).abs() < f64::EPSILON);

    let seen = last(&log);
    assert_eq!(seen.path, "/stats/outbound");
    assert_eq!(
        seen.query.as_deref(),
        Some("fromdate=2024-01-01&todate=2024-01-31&tag=welcome")
    );
}

#[tokio::test]
async fn test_push_templates_uses_account_token() {
    let (base, log) = spawn_fake_postmark().await;
    let request = TemplatePushRequest {
        source_server_id: 1,
        destination_server_id: 2,
        perform_changes: false,
    };

    let result = client(&base)
        .push_templates("account-token", &request)
        .await
        .unwrap();
    assert_eq!(result.total_count, 1);
    assert_eq!(result.templates[0].template_id, None);

    let seen = last(&log);
    assert_eq!(seen.method, Method::PUT);
    assert_eq!(seen.path, "/templates/push");
    assert_eq!(seen.header("x-postmark-account-token"), Some("account-token"));
    assert_eq!(seen.header("x-postmark-server-token"), None);
    assert_eq!(
        seen.body,
        json!({"SourceServerID": 1, "DestinationServerID": 2, "PerformChanges": false})
    );
}

#[tokio::test]
async fn test_unreachable_server() {
    // Nothing listens on the discard port.
    let client = client("http://127.0.0.1:9");
    let err = client.list_templates().await.unwrap_err();
    assert!(matches!(err, ProviderError::Http(_)));
    assert_eq!(err.status(), None);
}
