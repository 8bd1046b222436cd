use std::sync::Arc;

use client_lib::adapters::JsonFileStorage;
use client_lib::session::{
    AuthError, ChatError, ConsumptionPolicy, RegistryError, Route, UploadError, Workbench,
};

use crate::fakes::{app_state, signed_in, FakeBackend, PASSWORD};

#[tokio::test]
async fn sign_in_stores_credential_and_loads_documents() {
    let backend = FakeBackend::with_documents(&[("a", "report.pdf")]);
    let workbench = Workbench::new(app_state(&backend), ConsumptionPolicy::default());
    assert_eq!(workbench.credentials.route(), Route::Login);

    workbench.authenticate("ada", PASSWORD).await.unwrap();

    assert_eq!(workbench.credentials.route(), Route::Chat);
    assert_eq!(
        workbench.credentials.current_credential().map(|c| c.as_str().to_string()),
        Some("token-ada".to_string())
    );
    assert_eq!(workbench.chat.selection().await.as_deref(), Some("a"));
}

#[tokio::test]
async fn wrong_password_leaves_store_unchanged() {
    let backend = FakeBackend::new();
    let workbench = Workbench::new(app_state(&backend), ConsumptionPolicy::default());

    let result = workbench.authenticate("ada", "guess").await;

    assert_eq!(result, Err(AuthError::InvalidCredentials));
    assert!(!workbench.credentials.is_authenticated());
    assert_eq!(backend.count("list_documents"), 0);
}

#[tokio::test]
async fn registration_reports_backend_reason_and_returns_to_login() {
    let backend = FakeBackend::new();
    let workbench = Workbench::new(app_state(&backend), ConsumptionPolicy::default());

    workbench.credentials.navigate(Route::Register);
    workbench.register("ada", PASSWORD).await.unwrap();
    assert_eq!(workbench.credentials.route(), Route::Login);

    assert_eq!(
        workbench.register("ada", PASSWORD).await,
        Err(AuthError::RegistrationFailed(
            "Username already registered".to_string()
        ))
    );
}

#[tokio::test]
async fn signed_out_session_refuses_bearer_calls_locally() {
    let backend = FakeBackend::with_documents(&[("a", "report.pdf")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;
    let calls_before = backend.calls().len();

    workbench.logout().await;

    assert_eq!(workbench.credentials.navigate(Route::Chat), Route::Login);
    assert!(workbench.documents().await.is_empty());
    assert_eq!(workbench.chat.selection().await, None);
    assert_eq!(
        workbench.registry.refresh().await,
        Err(RegistryError::Auth(AuthError::NotAuthenticated))
    );
    assert_eq!(
        workbench.registry.remove("a").await,
        Err(RegistryError::Auth(AuthError::NotAuthenticated))
    );
    assert_eq!(
        workbench.chat.ask("Anyone?").await,
        Err(ChatError::Auth(AuthError::NotAuthenticated))
    );
    assert_eq!(
        workbench.upload().await.unwrap_err(),
        UploadError::Auth(AuthError::NotAuthenticated)
    );
    assert_eq!(backend.calls().len(), calls_before);
}

#[tokio::test]
async fn credential_survives_restart_until_logout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let backend = FakeBackend::with_documents(&[("a", "report.pdf")]);

    let first = {
        let mut app = app_state(&backend);
        app.storage = Arc::new(JsonFileStorage::open(&path).unwrap());
        Workbench::new(app, ConsumptionPolicy::default())
    };
    first.authenticate("ada", PASSWORD).await.unwrap();

    let second = {
        let mut app = app_state(&backend);
        app.storage = Arc::new(JsonFileStorage::open(&path).unwrap());
        Workbench::new(app, ConsumptionPolicy::default())
    };
    assert!(second.credentials.is_authenticated());
    second.start().await.unwrap();
    assert_eq!(second.documents().await.len(), 1);

    second.logout().await;
    let third = {
        let mut app = app_state(&backend);
        app.storage = Arc::new(JsonFileStorage::open(&path).unwrap());
        Workbench::new(app, ConsumptionPolicy::default())
    };
    assert_eq!(third.credentials.route(), Route::Login);
}
