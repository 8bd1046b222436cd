use std::time::Duration;

use hermes_core::domain::{Answer, Credential, HistoryEntry, QuestionRequest};
use hermes_core::ports::ChatService;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use client_lib::adapters::{BackendClient, HttpChatAdapter};

fn adapter(server: &MockServer) -> HttpChatAdapter {
    HttpChatAdapter::new(BackendClient::new(
        Url::parse(&server.uri()).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap())
}

fn question() -> QuestionRequest {
    QuestionRequest {
        question: "What is the summary?".to_string(),
        document_id: "a".to_string(),
        answer_format: "points".to_string(),
        response_language: "English".to_string(),
    }
}

#[tokio::test]
async fn question_is_sent_as_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_string_contains("name=\"question\""))
        .and(body_string_contains("What is the summary?"))
        .and(body_string_contains("name=\"file_id\""))
        .and(body_string_contains("name=\"answer_format\""))
        .and(body_string_contains("name=\"response_language\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "A short summary."})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = adapter(&server)
        .ask(&Credential::new("tok-1"), &question())
        .await
        .unwrap();

    assert_eq!(reply.answer, Answer::Single("A short summary.".to_string()));
    assert!(reply.images.is_empty());
    server.verify().await;
}

#[tokio::test]
async fn list_answers_become_pages_with_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": ["p1", "p2"],
            "images": ["/pdf-image?file_id=a&image=fig1.png"]
        })))
        .mount(&server)
        .await;

    let reply = adapter(&server)
        .ask(&Credential::new("tok-1"), &question())
        .await
        .unwrap();

    assert_eq!(
        reply.answer,
        Answer::Paginated(vec!["p1".to_string(), "p2".to_string()])
    );
    assert_eq!(reply.images, vec!["/pdf-image?file_id=a&image=fig1.png"]);
}

#[tokio::test]
async fn history_flattens_paginated_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat-history"))
        .and(query_param("file_id", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"question": "q1", "answer": "a1"},
            {"question": "q2", "answer": ["x", "y"]}
        ])))
        .mount(&server)
        .await;

    let history = adapter(&server)
        .chat_history(&Credential::new("tok-1"), "a")
        .await
        .unwrap();

    assert_eq!(
        history,
        vec![HistoryEntry::new("q1", "a1"), HistoryEntry::new("q2", "x\n\ny")]
    );
}

#[tokio::test]
async fn image_references_resolve_against_backend_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pdf-image"))
        .and(query_param("file_id", "a"))
        .and(query_param("image", "fig1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;

    let bytes = adapter(&server)
        .fetch_image(&Credential::new("tok-1"), "/pdf-image?file_id=a&image=fig1.png")
        .await
        .unwrap();

    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
}
