//! End-to-end draft workflow against in-process collaborators

use composer_core::{
    CollaboratorError, DisplayMode, DocumentView, ErrorKind, LifecycleError, LifecyclePhase,
    Parties, Resume, SaveOutcome, SubmitOutcome, ValidationError,
};
use composer_test_utils::{
    configure_employment, session_with, test_parties, FakeGenerator, FakeStore, MemoryTarget,
    EMPLOYMENT, NDA,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

fn fakes() -> (Arc<FakeGenerator>, Arc<FakeStore>) {
    (Arc::new(FakeGenerator::new()), Arc::new(FakeStore::new()))
}

#[tokio::test]
async fn generate_edit_preview_save_download() {
    let (generator, store) = fakes();
    let session = session_with(generator.clone(), store.clone());
    configure_employment(&session);

    let document = match session.submit().await.unwrap() {
        SubmitOutcome::Generated(document) => document,
        other => panic!("expected generated document, got {other:?}"),
    };
    assert_eq!(document.title, "California Employment Agreement - Acme Inc. & John Doe");
    assert_eq!(session.phase(), LifecyclePhase::Generated);
    assert_eq!(generator.calls(), 1);

    let request = &generator.requests()[0];
    assert_eq!(request.parameters["clientName"], "Acme Inc.");
    assert_eq!(request.options["arbitration"], "none");

    assert_eq!(session.toggle_edit().unwrap(), DocumentView::Editing);
    session.edit_content("# Edited Agreement\n\nNew terms.").unwrap();
    assert_eq!(session.toggle_edit().unwrap(), DocumentView::Previewing);
    assert_eq!(
        session.render(DisplayMode::Raw).unwrap(),
        "# Edited Agreement\n\nNew terms."
    );
    assert!(session
        .render(DisplayMode::Html)
        .unwrap()
        .contains("<h1>Edited Agreement</h1>"));

    session.set_title("Acme Offer").unwrap();
    assert_eq!(session.save().await.unwrap(), SaveOutcome::Saved);
    assert!(matches!(
        session.phase(),
        LifecyclePhase::Saved { resume: DocumentView::Previewing, .. }
    ));
    let saved = store.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].title, "Acme Offer");
    assert_eq!(saved[0].content, "# Edited Agreement\n\nNew terms.");

    let listed = session.saved_contracts().await.unwrap();
    assert_eq!(listed[0].title, "Acme Offer");

    let target = MemoryTarget::new();
    let path = session.download(&target).unwrap();
    assert_eq!(path.to_string_lossy(), "acme_offer.md");
    assert_eq!(target.delivered()[0].bytes, b"# Edited Agreement\n\nNew terms.");
}

#[tokio::test]
async fn generated_content_matches_response_exactly() {
    let generator = Arc::new(FakeGenerator::new().then(Ok(composer_core::GenerationResponse {
        contract: "# Agreement\n...".to_string(),
        contract_type: EMPLOYMENT.to_string(),
        client_name: "Acme Inc.".to_string(),
        other_party_name: "John Doe".to_string(),
        jurisdiction: "California".to_string(),
    })));
    let session = session_with(generator, Arc::new(FakeStore::new()));
    configure_employment(&session);

    session.submit().await.unwrap();
    let state = session.snapshot();
    assert_eq!(state.phase(), &LifecyclePhase::Generated);
    assert_eq!(state.document().unwrap().content, "# Agreement\n...");
}

#[tokio::test]
async fn missing_party_issues_no_request() {
    let (generator, store) = fakes();
    let session = session_with(generator.clone(), store);
    configure_employment(&session);
    session.set_parties(Parties::new("Acme Inc.", "")).unwrap();

    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Rejected(ValidationError::MissingParty)
    );
    assert_eq!(session.phase(), LifecyclePhase::Configuring);
    assert_eq!(generator.calls(), 0);
    assert_eq!(
        session.snapshot().last_error(),
        Some(&ErrorKind::Validation(ValidationError::MissingParty))
    );
}

#[tokio::test]
async fn concurrent_submits_issue_one_request() {
    let gate = Arc::new(Notify::new());
    let generator = Arc::new(FakeGenerator::gated(gate.clone()));
    let session = session_with(generator.clone(), Arc::new(FakeStore::new()));
    configure_employment(&session);

    let (first, second, ()) = tokio::join!(session.submit(), session.submit(), async {
        gate.notify_one();
    });

    assert!(matches!(first.unwrap(), SubmitOutcome::Generated(_)));
    assert_eq!(second.unwrap(), SubmitOutcome::InFlight);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn response_after_reset_is_discarded() {
    let gate = Arc::new(Notify::new());
    let generator = Arc::new(FakeGenerator::gated(gate.clone()));
    let session = session_with(generator, Arc::new(FakeStore::new()));
    configure_employment(&session);

    let (outcome, ()) = tokio::join!(session.submit(), async {
        session.compose_another();
        gate.notify_one();
    });

    assert_eq!(outcome.unwrap(), SubmitOutcome::Discarded);
    assert_eq!(session.phase(), LifecyclePhase::Empty);
    assert!(session.snapshot().document().is_none());
}

#[tokio::test]
async fn service_error_is_reported_verbatim_and_recoverable() {
    let generator = Arc::new(
        FakeGenerator::new().then_fail(CollaboratorError::Service("Invalid contract type".to_string())),
    );
    let session = session_with(generator.clone(), Arc::new(FakeStore::new()));
    configure_employment(&session);

    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Failed(ErrorKind::Service("Invalid contract type".to_string()))
    );
    assert!(matches!(
        session.phase(),
        LifecyclePhase::Failed { resume: Resume::Configuring, .. }
    ));

    let retried = session.submit().await.unwrap();
    assert!(matches!(retried, SubmitOutcome::Generated(_)));
    assert_eq!(generator.calls(), 2);
    assert!(session.snapshot().last_error().is_none());
}

#[tokio::test]
async fn missing_token_surfaces_as_unauthenticated() {
    let session = composer_core::DraftSession::new(
        composer_test_utils::test_catalog(),
        composer_core::SessionContext::anonymous(),
        Arc::new(FakeGenerator::new()),
        Arc::new(FakeStore::new()),
    );
    configure_employment(&session);

    let outcome = session.submit().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Failed(ErrorKind::Unauthenticated(_))));
}

#[tokio::test]
async fn save_failure_keeps_document_unchanged() {
    let store = Arc::new(
        FakeStore::new().then(Err(CollaboratorError::Network("connection reset".to_string()))),
    );
    let session = session_with(Arc::new(FakeGenerator::new()), store.clone());
    configure_employment(&session);
    session.submit().await.unwrap();
    let before = session.snapshot().document().cloned();

    let outcome = session.save().await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Failed(ErrorKind::Network(_))));
    assert_eq!(session.snapshot().document().cloned(), before);
    assert!(store.saved().is_empty());

    assert_eq!(session.save().await.unwrap(), SaveOutcome::Saved);
}

#[tokio::test]
async fn blank_title_blocks_save() {
    let (generator, store) = fakes();
    let session = session_with(generator, store.clone());
    configure_employment(&session);
    session.submit().await.unwrap();
    session.set_title("").unwrap();

    assert_eq!(
        session.save().await.unwrap(),
        SaveOutcome::Rejected(ValidationError::MissingTitle)
    );
    assert_eq!(session.phase(), LifecyclePhase::Generated);
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn concurrent_saves_issue_one_request() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(FakeStore::gated(gate.clone()));
    let session = session_with(Arc::new(FakeGenerator::new()), store.clone());
    configure_employment(&session);
    session.submit().await.unwrap();

    let (first, second, ()) = tokio::join!(session.save(), session.save(), async {
        gate.notify_one();
    });

    assert_eq!(first.unwrap(), SaveOutcome::Saved);
    assert_eq!(second.unwrap(), SaveOutcome::InFlight);
    assert_eq!(store.saved().len(), 1);
}

#[tokio::test]
async fn saved_notice_expires() {
    let session = session_with(Arc::new(FakeGenerator::new()), Arc::new(FakeStore::new()));
    configure_employment(&session);
    session.submit().await.unwrap();
    session.save().await.unwrap();

    assert!(session.snapshot().saved_notice_visible(Instant::now()));
    assert!(session.expire_saved_notice(Instant::now() + Duration::from_secs(4)));
    assert_eq!(session.phase(), LifecyclePhase::Generated);
}

#[tokio::test]
async fn switching_type_discards_entries() {
    let session = session_with(Arc::new(FakeGenerator::new()), Arc::new(FakeStore::new()));
    configure_employment(&session);
    session.select_type(NDA).unwrap();

    let state = session.snapshot();
    assert!(state.parameter_values().is_empty());
    assert_eq!(state.option_values()["residuals"], "excluded");
    assert_eq!(state.parties(), &test_parties());

    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Rejected(ValidationError::MissingParameter("term_years".to_string()))
    );
}

#[tokio::test]
async fn actions_outside_their_phase_are_rejected() {
    let session = session_with(Arc::new(FakeGenerator::new()), Arc::new(FakeStore::new()));

    assert!(matches!(session.toggle_edit(), Err(LifecycleError::IllegalAction { .. })));
    assert!(matches!(session.save().await, Err(LifecycleError::IllegalAction { .. })));
    assert!(matches!(session.download(&MemoryTarget::new()), Err(LifecycleError::NoDocument)));
    assert!(matches!(session.select_type("Lease"), Err(LifecycleError::Catalog(_))));
}

#[tokio::test]
async fn compose_another_starts_fresh() {
    let session = session_with(Arc::new(FakeGenerator::new()), Arc::new(FakeStore::new()));
    configure_employment(&session);
    session.submit().await.unwrap();
    session.compose_another();

    assert_eq!(session.phase(), LifecyclePhase::Empty);
    configure_employment(&session);
    assert!(matches!(session.submit().await.unwrap(), SubmitOutcome::Generated(_)));
}
