mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{ScriptedDriver, state_with, test_config};
use prompt_optimizer::AppState;
use prompt_optimizer::conversation::DEFAULT_CONVERSATION_ID;
use prompt_optimizer::normalized::StreamPayload;
use prompt_optimizer::server::build_router;

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, String) {
    let req = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, text) = send(app, req).await;
    (status, text)
}

fn payloads(body: &str) -> Vec<StreamPayload> {
    body.split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

fn setup(driver: ScriptedDriver) -> (Router, AppState, Arc<ScriptedDriver>) {
    let driver = Arc::new(driver);
    let state = state_with(Arc::clone(&driver), test_config());
    (build_router(state.clone()), state, driver)
}

#[tokio::test]
async fn test_pages_are_served() {
    let (app, _, _) = setup(ScriptedDriver::replying(&[]));

    for uri in ["/", "/chat"] {
        let (status, headers, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(body.contains("PEO.AI"));
    }
}

#[tokio::test]
async fn test_generate_streams_tokens_then_done() {
    let (app, state, driver) = setup(ScriptedDriver::replying(&["Improved", " prompt"]));

    let (status, headers, body) = get(&app, "/generate?prompt=Write%20a%20poem&is_followup=false").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers["x-accel-buffering"], "no");
    assert_eq!(
        payloads(&body),
        vec![
            StreamPayload::token("Improved"),
            StreamPayload::token(" prompt"),
            StreamPayload::done(),
        ]
    );
    assert!(body.starts_with("data: {\"token\":\"Improved\"}\n\n"));

    let conversation = state.conversations.default_conversation();
    let transcript = conversation.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "Here's my prompt:\n\nWrite a poem");
    assert_eq!(transcript[1].content, "Improved prompt");

    assert_eq!(driver.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_followup_flag_is_case_insensitive() {
    let (app, state, _) = setup(ScriptedDriver::replying(&["ok"]));

    get(&app, "/generate?prompt=Shorter%20please&is_followup=TRUE").await;
    get(&app, "/generate?prompt=again&is_followup=yes").await;

    let transcript = state.conversations.default_conversation().transcript();
    assert_eq!(transcript[0].content, "Shorter please");
    assert_eq!(transcript[2].content, "Here's my prompt:\n\nagain");
}

#[tokio::test]
async fn test_generate_error_still_ends_with_done() {
    let (app, state, _) = setup(ScriptedDriver::failing(&["par"], "quota exceeded"));

    let (status, _, body) = get(&app, "/generate?prompt=x").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payloads(&body),
        vec![
            StreamPayload::token("par"),
            StreamPayload::error("quota exceeded"),
            StreamPayload::done(),
        ]
    );
    let conversation = state.conversations.default_conversation();
    assert_eq!(conversation.message_count(), 1);
    assert!(conversation.last_model_reply().is_none());
}

#[tokio::test]
async fn test_generate_with_session_id_is_isolated() {
    let (app, state, _) = setup(ScriptedDriver::replying(&["reply"]));

    get(&app, "/generate?prompt=x&session_id=alpha").await;

    assert_eq!(state.conversations.default_conversation().message_count(), 0);
    let alpha = state.conversations.get("alpha").unwrap();
    assert_eq!(alpha.message_count(), 2);
}

#[tokio::test]
async fn test_generate_complete() {
    let (app, state, _) = setup(ScriptedDriver::replying(&["Better", " prompt"]));

    let (status, body) = post_json(
        &app,
        "/generate_complete",
        &json!({"prompt": "Write a poem", "is_followup": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"response": "Better prompt"}));

    // Missing fields default to an empty first-turn prompt
    let (status, _) = post_json(&app, "/generate_complete", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let transcript = state.conversations.default_conversation().transcript();
    assert_eq!(transcript[2].content, "Here's my prompt:\n\n");
}

#[tokio::test]
async fn test_generate_complete_empty_and_invalid_body() {
    let (app, _, _) = setup(ScriptedDriver::replying(&[]));

    let req = Request::post("/generate_complete").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["response"], "No response generated yet.");

    let req = Request::post("/generate_complete")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_complete_upstream_failure() {
    let (app, _, _) = setup(ScriptedDriver::failing(&[], "upstream down"));

    let (status, body) = post_json(&app, "/generate_complete", &json!({"prompt": "x"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "upstream down");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (app, _, _) = setup(ScriptedDriver::replying(&["Here:\n```\nOptimized\n```\n"]));

    let (status, body) = post_json(&app, "/api/sessions", &json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["message_count"], 0);

    let (_, _, body) = get(&app, "/api/sessions").await;
    let list: Value = serde_json::from_str(&body).unwrap();
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&id.as_str()));
    assert!(ids.contains(&DEFAULT_CONVERSATION_ID));

    get(&app, &format!("/generate?prompt=p&session_id={id}")).await;

    let (status, _, body) = get(&app, &format!("/api/sessions/{id}/messages")).await;
    assert_eq!(status, StatusCode::OK);
    let messages: Value = serde_json::from_str(&body).unwrap();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "model");
    let sections = messages[1]["sections"].as_array().unwrap();
    assert_eq!(sections[0], json!({"kind": "text", "content": "Here:\n"}));
    assert_eq!(sections[1], json!({"kind": "code", "content": "Optimized\n"}));
    assert!(messages[1]["html"].as_str().unwrap().contains("code-block"));

    let (status, _, body) = get(&app, &format!("/api/sessions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["message_count"], 2);

    let req = Request::post(format!("/api/sessions/{id}/reset")).body(Body::empty()).unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::NO_CONTENT);
    let (_, _, body) = get(&app, &format!("/api/sessions/{id}/messages")).await;
    assert_eq!(body, "[]");

    let delete = || Request::delete(format!("/api/sessions/{id}")).body(Body::empty()).unwrap();
    assert_eq!(send(&app, delete()).await.0, StatusCode::NO_CONTENT);
    assert_eq!(send(&app, delete()).await.0, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&app, "/api/sessions/missing/messages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_default_session_resets_it() {
    let (app, state, _) = setup(ScriptedDriver::replying(&["r"]));

    get(&app, "/generate?prompt=x").await;
    assert_eq!(state.conversations.default_conversation().message_count(), 2);

    let req = Request::delete("/api/sessions/default").body(Body::empty()).unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::NO_CONTENT);
    assert_eq!(state.conversations.default_conversation().message_count(), 0);
}

#[tokio::test]
async fn test_render_endpoint() {
    let (app, _, _) = setup(ScriptedDriver::replying(&[]));

    let (status, body) = post_json(
        &app,
        "/api/render",
        &json!({"content": "**Bold**\n```rust\nfn main() {}\n```"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["html"].as_str().unwrap().contains("<strong>Bold</strong>"));
    assert!(body["html"].as_str().unwrap().contains("language-rust"));
    assert_eq!(body["sections"][1]["language"], "rust");
}

#[tokio::test]
async fn test_rate_limit_applies_to_generation_only() {
    let driver = Arc::new(ScriptedDriver::replying(&["r"]));
    let mut config = test_config();
    config.resilience.rate_limit_enabled = true;
    config.resilience.requests_per_second = 1;
    config.resilience.burst_size = 1;
    let app = build_router(state_with(driver, config));

    let (status, _, _) = get(&app, "/generate?prompt=a").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = get(&app, "/generate?prompt=b").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _, _) = get(&app, "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _, _) = setup(ScriptedDriver::replying(&[]));

    let req = Request::get("/api/sessions")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, req).await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
