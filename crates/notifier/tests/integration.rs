//! Integration tests for the comment notification pipeline.
//!
//! Provider endpoints run on `wiremock` mock servers; documents come from an
//! in-memory store. No external services are needed:
//!
//! ```bash
//! cargo test -p comment-push-notifier --test integration
//! ```

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use comment_push_common::error::AppError;
use comment_push_common::firestore::{Document, InMemoryStore, Value};
use comment_push_common::types::{
    CommentEvent, OWNER_ID_FIELD, PUSH_TOKENS_FIELD, SOLUTIONS_COLLECTION, USERS_COLLECTION,
};
use comment_push_notifier::dispatcher::{DispatchOutcome, NotificationDispatcher, SkipReason};
use comment_push_notifier::oauth::OAuthClient;
use comment_push_notifier::push::PushSender;

const CLIENT_ID: &str = "108123";
const TOKEN_PATH: &str = "/oauth2/v3/token";
const SEND_PATH: &str = "/v1/108123/messages:send";

// ============================================================
// Helpers
// ============================================================

fn comment(author_user_id: &str, text: &str) -> CommentEvent {
    CommentEvent {
        solution_id: "S1".to_string(),
        comment_id: "C1".to_string(),
        author_user_id: author_user_id.to_string(),
        author_username: "Bob".to_string(),
        text: text.to_string(),
    }
}

fn solution_owned_by(owner_id: &str) -> Document {
    Document::new("solutions/S1").with_field(OWNER_ID_FIELD, Value::string(owner_id))
}

fn user_with_tokens(tokens: &[&str]) -> Document {
    Document::new("users/U1").with_field(PUSH_TOKENS_FIELD, Value::string_array(tokens.to_vec()))
}

/// Store with solution S1 owned by U1, who has the given tokens.
fn seeded_store(tokens: &[&str]) -> InMemoryStore {
    InMemoryStore::new()
        .with_document(SOLUTIONS_COLLECTION, "S1", solution_owned_by("U1"))
        .with_document(USERS_COLLECTION, "U1", user_with_tokens(tokens))
}

fn dispatcher(store: InMemoryStore, server: &MockServer) -> NotificationDispatcher<InMemoryStore> {
    let http = reqwest::Client::new();
    NotificationDispatcher::new(
        store,
        OAuthClient::new(
            http.clone(),
            format!("{}{}", server.uri(), TOKEN_PATH),
            CLIENT_ID,
            "s3cret",
        ),
        PushSender::new(http, format!("{}{}", server.uri(), SEND_PATH)),
        "app://e_repairkit",
    )
}

async fn mock_token(server: &MockServer, status: u16, body: serde_json::Value, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

async fn mock_push(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

async fn push_requests(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == SEND_PATH)
        .map(|r| r.body_json().unwrap())
        .collect()
}

// ============================================================
// Successful delivery
// ============================================================

#[tokio::test]
async fn test_comment_from_other_user_is_sent() {
    let server = MockServer::start().await;
    mock_token(&server, 200, json!({ "access_token": "abc", "expires_in": 3600 }), 1).await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "80000000",
            "msg": "Success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher(seeded_store(&["tokA", "tokB"]), &server)
        .dispatch(&comment("U2", "Great fix!"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Sent { recipients: 2 });

    let sent = push_requests(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["message"]["token"], json!(["tokA", "tokB"]));
    assert_eq!(
        sent[0]["message"]["notification"]["title"],
        "Bob commented on your post!"
    );
    assert_eq!(sent[0]["message"]["notification"]["body"], "\"Great fix!...\"");
    assert_eq!(
        sent[0]["message"]["android"]["notification"]["click_action"],
        json!({ "type": 1, "intent": "app://e_repairkit/post_detail?postId=S1" })
    );
}

#[tokio::test]
async fn test_tokens_forwarded_unmodified_and_in_order() {
    let server = MockServer::start().await;
    mock_token(&server, 200, json!({ "access_token": "abc" }), 1).await;
    mock_push(&server, ResponseTemplate::new(200), 1).await;

    let tokens = ["z-last", "a-first", "", "z-last"];
    dispatcher(seeded_store(&tokens), &server)
        .dispatch(&comment("U2", "hi"))
        .await
        .unwrap();

    let sent = push_requests(&server).await;
    assert_eq!(sent[0]["message"]["token"], json!(tokens));
}

#[tokio::test]
async fn test_long_comment_truncated_in_body() {
    let server = MockServer::start().await;
    mock_token(&server, 200, json!({ "access_token": "abc" }), 1).await;
    mock_push(&server, ResponseTemplate::new(200), 1).await;

    let text = format!("{}{}", "a".repeat(50), "b".repeat(30));
    dispatcher(seeded_store(&["tokA"]), &server)
        .dispatch(&comment("U2", &text))
        .await
        .unwrap();

    let sent = push_requests(&server).await;
    assert_eq!(
        sent[0]["message"]["notification"]["body"],
        format!("\"{}...\"", "a".repeat(50))
    );
}

// ============================================================
// Quiet skips
// ============================================================

#[tokio::test]
async fn test_self_comment_makes_no_provider_calls() {
    let server = MockServer::start().await;
    mock_token(&server, 200, json!({ "access_token": "abc" }), 0).await;
    mock_push(&server, ResponseTemplate::new(200), 0).await;

    let outcome = dispatcher(seeded_store(&["tokA", "tokB"]), &server)
        .dispatch(&comment("U1", "Great fix!"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::SelfComment));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_solution_is_not_an_error() {
    let server = MockServer::start().await;
    mock_push(&server, ResponseTemplate::new(200), 0).await;

    let store = InMemoryStore::new().with_document(USERS_COLLECTION, "U1", user_with_tokens(&["tokA"]));
    let outcome = dispatcher(store, &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::OwnerNotFound));
}

#[tokio::test]
async fn test_solution_without_owner_is_skipped() {
    let server = MockServer::start().await;
    mock_push(&server, ResponseTemplate::new(200), 0).await;

    let store = InMemoryStore::new().with_document(
        SOLUTIONS_COLLECTION,
        "S1",
        Document::new("solutions/S1").with_field("title", Value::string("Broken hinge")),
    );
    let outcome = dispatcher(store, &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::OwnerNotFound));
}

#[tokio::test]
async fn test_owner_without_tokens_is_skipped() {
    let server = MockServer::start().await;
    mock_token(&server, 200, json!({ "access_token": "abc" }), 0).await;
    mock_push(&server, ResponseTemplate::new(200), 0).await;

    let outcome = dispatcher(seeded_store(&[]), &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::NoPushTokens));
}

#[tokio::test]
async fn test_owner_without_token_field_or_profile_is_skipped() {
    let server = MockServer::start().await;
    mock_push(&server, ResponseTemplate::new(200), 0).await;

    let no_field = InMemoryStore::new()
        .with_document(SOLUTIONS_COLLECTION, "S1", solution_owned_by("U1"))
        .with_document(USERS_COLLECTION, "U1", Document::new("users/U1"));
    let outcome = dispatcher(no_field, &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::NoPushTokens));

    let no_profile =
        InMemoryStore::new().with_document(SOLUTIONS_COLLECTION, "S1", solution_owned_by("U1"));
    let outcome = dispatcher(no_profile, &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::NoPushTokens));
}

// ============================================================
// Hard failures
// ============================================================

#[tokio::test]
async fn test_token_rejection_fails_without_push() {
    let server = MockServer::start().await;
    mock_token(
        &server,
        401,
        json!({ "error": 1101, "error_description": "invalid client secret" }),
        1,
    )
    .await;
    mock_push(&server, ResponseTemplate::new(200), 0).await;

    let err = dispatcher(seeded_store(&["tokA"]), &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap_err();
    match err {
        AppError::TokenAcquisition { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid client secret"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_push_server_error_surfaces_body() {
    let server = MockServer::start().await;
    mock_token(&server, 200, json!({ "access_token": "abc" }), 1).await;
    mock_push(
        &server,
        ResponseTemplate::new(500).set_body_string("gateway exploded"),
        1,
    )
    .await;

    let err = dispatcher(seeded_store(&["tokA"]), &server)
        .dispatch(&comment("U2", "hello"))
        .await
        .unwrap_err();
    match err {
        AppError::PushRejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "gateway exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_transport_error() {
    let dead_uri = "http://127.0.0.1:1";
    let http = reqwest::Client::new();
    let dispatcher = NotificationDispatcher::new(
        seeded_store(&["tokA"]),
        OAuthClient::new(http.clone(), format!("{}{}", dead_uri, TOKEN_PATH), CLIENT_ID, "s3cret"),
        PushSender::new(http, format!("{}{}", dead_uri, SEND_PATH)),
        "app://e_repairkit",
    );

    let err = dispatcher.dispatch(&comment("U2", "hello")).await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_)));
}
