use hermes_core::domain::DocumentRecord;
use hermes_core::ports::PortError;

use client_lib::session::{ConsumptionPolicy, RegistryError, Route};

use crate::fakes::{signed_in, FakeBackend};

#[tokio::test]
async fn refresh_keeps_last_record_per_display_name() {
    let backend = FakeBackend::with_documents(&[("a", "x"), ("b", "x")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;

    assert_eq!(workbench.documents().await, vec![DocumentRecord::new("b", "x")]);
}

#[tokio::test]
async fn first_load_selects_first_document_and_loads_its_history() {
    let backend = FakeBackend::with_documents(&[("a", "report.pdf"), ("b", "notes.pdf")]);
    backend.seed_history("a", &[("What is it?", "A report.")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;

    assert_eq!(workbench.chat.selection().await.as_deref(), Some("a"));
    assert_eq!(workbench.chat.history().await.len(), 1);
    assert_eq!(backend.count("chat_history:a"), 1);
}

#[tokio::test]
async fn failed_refresh_empties_list_and_clears_selection() {
    let backend = FakeBackend::with_documents(&[("a", "x")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;
    assert_eq!(workbench.chat.selection().await.as_deref(), Some("a"));

    *backend.fail_list.lock() = Some(PortError::Unexpected("connection reset".into()));
    let result = workbench.registry.refresh().await;

    assert!(matches!(result, Err(RegistryError::Backend(_))));
    assert!(workbench.documents().await.is_empty());
    assert_eq!(workbench.chat.selection().await, None);
    assert!(workbench.credentials.is_authenticated());
}

#[tokio::test]
async fn refresh_that_drops_selected_document_clears_selection() {
    let backend = FakeBackend::with_documents(&[("a", "x"), ("b", "y")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;

    backend.documents.lock().retain(|d| d.id != "a");
    workbench.registry.refresh().await.unwrap();

    assert_eq!(workbench.chat.selection().await, None);
    assert_eq!(workbench.documents().await, vec![DocumentRecord::new("b", "y")]);
}

#[tokio::test]
async fn remove_deletes_remotely_then_locally() {
    let backend = FakeBackend::with_documents(&[("a", "x"), ("b", "y")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;

    workbench.registry.remove("a").await.unwrap();

    assert_eq!(backend.count("delete_document"), 1);
    assert_eq!(workbench.documents().await, vec![DocumentRecord::new("b", "y")]);
    assert_eq!(workbench.chat.selection().await, None);
    assert!(workbench.notices.current().is_none());
}

#[tokio::test]
async fn failed_remove_keeps_list_and_posts_notice() {
    let backend = FakeBackend::with_documents(&[("a", "x"), ("b", "y")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;

    *backend.fail_delete.lock() = Some(PortError::Rejected("PDF not found".into()));
    let result = workbench.registry.remove("a").await;

    assert!(result.is_err());
    assert_eq!(workbench.documents().await.len(), 2);
    assert_eq!(workbench.chat.selection().await.as_deref(), Some("a"));
    assert_eq!(
        workbench.notices.current().map(|n| n.message),
        Some("Failed to delete PDF".to_string())
    );
}

#[tokio::test]
async fn unauthorized_listing_signs_out() {
    let backend = FakeBackend::with_documents(&[("a", "x")]);
    backend.seed_history("a", &[("What is it?", "A report.")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;
    assert_eq!(workbench.chat.history().await.len(), 1);

    *backend.fail_list.lock() = Some(PortError::Unauthorized);
    let _ = workbench.registry.refresh().await;

    assert!(!workbench.credentials.is_authenticated());
    assert_eq!(workbench.credentials.route(), Route::Login);
    assert!(workbench.chat.history().await.is_empty());
}

#[tokio::test]
async fn unauthorized_delete_tears_down_the_session() {
    let backend = FakeBackend::with_documents(&[("a", "x"), ("b", "y")]);
    backend.seed_history("a", &[("What is it?", "A report.")]);
    let workbench = signed_in(&backend, ConsumptionPolicy::default()).await;

    *backend.fail_delete.lock() = Some(PortError::Unauthorized);
    let result = workbench.registry.remove("b").await;

    assert!(result.is_err());
    assert!(!workbench.credentials.is_authenticated());
    assert!(workbench.documents().await.is_empty());
    assert_eq!(workbench.chat.selection().await, None);
    assert!(workbench.chat.history().await.is_empty());
}
