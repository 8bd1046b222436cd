use std::time::Duration;

use hermes_core::ports::{AuthService, OptionsService, PortError};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use client_lib::adapters::{BackendClient, HttpAuthAdapter, HttpOptionsAdapter};

fn backend(server: &MockServer) -> BackendClient {
    BackendClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn token_exchange_posts_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("username=ada"))
        .and(body_string_contains("password=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let credential = HttpAuthAdapter::new(backend(&server))
        .authenticate("ada", "secret")
        .await
        .unwrap();

    assert_eq!(credential.as_str(), "tok-1");
    server.verify().await;
}

#[tokio::test]
async fn refused_login_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Incorrect username or password"})),
        )
        .mount(&server)
        .await;

    let result = HttpAuthAdapter::new(backend(&server))
        .authenticate("ada", "wrong")
        .await;

    assert_eq!(result, Err(PortError::Unauthorized));
}

#[tokio::test]
async fn registration_failure_carries_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Username already registered"})),
        )
        .mount(&server)
        .await;

    let result = HttpAuthAdapter::new(backend(&server))
        .register("ada", "secret")
        .await;

    assert_eq!(
        result,
        Err(PortError::Rejected("Username already registered".to_string()))
    );
}

#[tokio::test]
async fn option_lists_are_fetched_without_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/options/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["English", "Hindi"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/options/answer-formats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["points", "paragraph"])))
        .mount(&server)
        .await;

    let options = HttpOptionsAdapter::new(backend(&server));

    assert_eq!(options.list_languages().await.unwrap(), vec!["English", "Hindi"]);
    assert_eq!(
        options.list_answer_formats().await.unwrap(),
        vec!["points", "paragraph"]
    );
    let received = server.received_requests().await.unwrap();
    assert!(received
        .iter()
        .all(|r| !r.headers.contains_key("authorization")));
}
