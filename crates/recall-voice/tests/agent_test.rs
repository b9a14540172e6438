mod common;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::{identity, MockStore, BASE};
use recall_memory::{DisabledStore, DEFAULT_MEMORY_HEADER};
use recall_types::{ChatMessage, MemoryCategory, Role};
use recall_voice::{ChatClient, LlmConfig, SessionEvent, VoiceAgent, VoiceError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn bootstrap_folds_existing_memories_into_instructions() {
    let store = MockStore {
        default_categories: vec![
            MemoryCategory::new("Profile", Some("爱好编程")),
            MemoryCategory::new("Events", None),
        ],
        ..MockStore::default()
    };

    let agent = VoiceAgent::bootstrap(identity(), BASE, DEFAULT_MEMORY_HEADER, &store).await;
    let prompt = agent.instructions().current();
    assert_eq!(prompt.base, BASE);
    assert_eq!(
        prompt.text(),
        format!("{BASE}\n\n以下是关于用户的信息：\n\n**Profile:** 爱好编程\n\n")
    );
}

#[tokio::test]
async fn bootstrap_without_memories_uses_base() {
    let agent = VoiceAgent::bootstrap(identity(), BASE, DEFAULT_MEMORY_HEADER, &DisabledStore).await;
    assert_eq!(agent.instructions().text(), BASE);
    assert!(!agent.instructions().current().has_memories());
}

#[tokio::test]
async fn published_events_reach_subscribers() {
    let agent = VoiceAgent::bootstrap(identity(), BASE, DEFAULT_MEMORY_HEADER, &DisabledStore).await;
    let mut rx = agent.subscribe_events();
    agent.publish(SessionEvent::user_item("你好"));
    assert_eq!(rx.recv().await.unwrap(), SessionEvent::user_item("你好"));
}

async fn spawn_llm(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

fn llm_config(base_url: String) -> LlmConfig {
    LlmConfig {
        base_url,
        api_key: "sk-test".to_string(),
        model: "gpt-test".to_string(),
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn chat_client_sends_instructions_and_history() {
    let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
    let recorder = seen.clone();
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                recorder.lock().unwrap().push((auth, body));
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": " 你好！ "}}]
                }))
            }
        }),
    );
    let client = ChatClient::new(&llm_config(spawn_llm(router).await)).unwrap();

    let history = vec![ChatMessage::new(Role::User, "你好")];
    let reply = client
        .complete("system prompt", &history, Some("greet the user"))
        .await
        .unwrap();
    assert_eq!(reply, "你好！");

    let seen = seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth, "Bearer sk-test");
    assert_eq!(body["model"], "gpt-test");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], "system prompt");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[2]["content"], "greet the user");
}

#[tokio::test]
async fn chat_client_reports_api_errors() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let client = ChatClient::new(&llm_config(spawn_llm(router).await)).unwrap();

    match client.complete("p", &[], None).await {
        Err(VoiceError::Llm(message)) => assert!(message.contains("429")),
        other => panic!("expected LLM error, got {:?}", other),
    }
}

#[tokio::test]
async fn chat_client_rejects_empty_replies() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let client = ChatClient::new(&llm_config(spawn_llm(router).await)).unwrap();

    assert!(matches!(
        client.complete("p", &[], None).await,
        Err(VoiceError::Llm(_))
    ));
}
