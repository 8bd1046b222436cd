use client_lib::session::{ConsumptionPolicy, Workbench};
use hermes_core::ports::PortError;

use crate::fakes::{app_state, FakeBackend};

#[tokio::test]
async fn options_fall_back_to_defaults_until_a_load_succeeds() {
    let backend = FakeBackend::new();
    *backend.fail_options.lock() = Some(PortError::Unexpected("offline".into()));
    let workbench = Workbench::new(app_state(&backend), ConsumptionPolicy::default());

    workbench.start().await.unwrap();
    let options = workbench.options.snapshot().await;
    assert_eq!(options.languages, vec!["English".to_string()]);
    assert_eq!(options.answer_format, "points");

    *backend.fail_options.lock() = None;
    let options = workbench.options.load().await;
    assert_eq!(options.languages.len(), 2);
    workbench.options.load().await;
    assert_eq!(backend.count("list_languages"), 2);
}
