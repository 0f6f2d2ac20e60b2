use client_lib::adapters::{HttpDocumentAdapter, MemoryStore};
use client_lib::config::Config;
use client_lib::endpoints::Endpoints;
use client_lib::flows::conversation::{SubmitOutcome, QUERY_FAILED_MESSAGE};
use client_lib::flows::document::load_document_info;
use client_lib::flows::history::{load_document_queries, load_history};
use client_lib::flows::upload::{upload_document, UploadError};
use client_lib::flows::{AppState, Conversation};
use lens_core::domain::{AuthUser, DocumentInfo, NotificationLevel, Role, UploadFile};
use lens_core::ports::IssuedSession;
use lens_core::screening::MULTI_QUESTION_GUIDANCE;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(server: &MockServer) -> Arc<AppState> {
    let config = Config::for_backend(server.uri());
    let documents = Arc::new(HttpDocumentAdapter::new(
        reqwest::Client::new(),
        Endpoints::new(&server.uri()),
    ));
    Arc::new(AppState::with_parts(config, documents, Arc::new(MemoryStore::new())))
}

fn as_guest(app: &AppState) {
    app.session.restore().unwrap();
}

fn sign_in(app: &AppState, token: &str) {
    app.session
        .resolve(&IssuedSession {
            user: AuthUser {
                uid: "uid-1".to_string(),
                email: Some("reader@example.com".to_string()),
                email_verified: true,
            },
            id_token: token.to_string(),
        })
        .unwrap();
}

fn pdf() -> UploadFile {
    UploadFile::new("lease.pdf", b"%PDF-1.7 test".to_vec())
}

async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| {
            req.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}

//=========================================================================================
// Upload
//=========================================================================================

#[tokio::test]
async fn guest_upload_uses_one_of_the_daily_uploads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "document_id": "doc-1", "is_guest": true })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);

    let success = upload_document(&app, &pdf(), None).await.unwrap();

    assert_eq!(success.document_id(), "doc-1");
    assert_eq!(app.quota.remaining().unwrap(), 1);
    assert!(success.notification.message.contains("1 free upload left"));
    assert_eq!(authorization_headers(&server).await, vec![None]);
}

#[tokio::test]
async fn rate_limited_guest_upload_exhausts_the_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "detail": "Guest limit reached" })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);

    let first = upload_document(&app, &pdf(), None).await;
    assert_eq!(first.unwrap_err(), UploadError::RateLimited("Guest limit reached".to_string()));
    assert_eq!(app.quota.remaining().unwrap(), 0);

    // The second attempt never reaches the backend.
    let second = upload_document(&app, &pdf(), None).await;
    assert_eq!(second.unwrap_err(), UploadError::GuestQuotaExhausted);
}

#[tokio::test]
async fn rate_limit_without_detail_uses_the_canned_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);

    let err = upload_document(&app, &pdf(), None).await.unwrap_err();
    assert_eq!(
        err,
        UploadError::RateLimited("Upload limit reached. Please try again later.".to_string())
    );
}

#[tokio::test]
async fn signed_in_upload_carries_the_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "document_id": "doc-2", "is_guest": false, "credits_remaining": 4 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    sign_in(&app, "tok-1");

    let success = upload_document(&app, &pdf(), Some(5)).await.unwrap();

    assert_eq!(success.receipt.credits_remaining, Some(4));
    assert!(success.notification.message.contains("4 credits remaining"));
    // Credit users never touch the guest counter.
    assert_eq!(app.quota.remaining().unwrap(), 2);
}

#[tokio::test]
async fn zero_credits_and_invalid_files_make_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server);
    sign_in(&app, "tok-1");

    assert_eq!(
        upload_document(&app, &pdf(), Some(0)).await.unwrap_err(),
        UploadError::NoCredits
    );
    let notes = UploadFile::new("notes.txt", b"hello".to_vec());
    assert_eq!(upload_document(&app, &notes, None).await.unwrap_err(), UploadError::NotPdf);
    let huge = UploadFile::new("big.pdf", vec![0; 5 * 1024 * 1024 + 1]);
    assert!(matches!(
        upload_document(&app, &huge, None).await.unwrap_err(),
        UploadError::TooLarge { .. }
    ));
}

#[tokio::test]
async fn backend_detail_is_shown_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "PDF is encrypted" })))
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);

    let err = upload_document(&app, &pdf(), None).await.unwrap_err();
    assert_eq!(err, UploadError::Failed("PDF is encrypted".to_string()));
    assert_eq!(err.notification().level, NotificationLevel::Error);
    // A plain failure leaves the guest counter alone.
    assert_eq!(app.quota.remaining().unwrap(), 2);
}

//=========================================================================================
// Conversation
//=========================================================================================

#[tokio::test]
async fn multiple_questions_are_answered_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "unused" })))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    let outcome = conversation.ask("Who signs the lease? When does it end?").await;

    assert_eq!(outcome, SubmitOutcome::Screened);
    let transcript = conversation.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.turns()[1].role, Role::Assistant);
    assert_eq!(transcript.turns()[1].text, MULTI_QUESTION_GUIDANCE);
}

#[tokio::test]
async fn repeated_question_marks_are_still_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/doc-1"))
        .and(body_json(json!({ "query": "Really???" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "Yes." })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    conversation.set_draft("  Really???  ").await;
    assert_eq!(conversation.submit().await, SubmitOutcome::Answered);

    let transcript = conversation.transcript().await;
    assert_eq!(transcript.turns()[0].text, "Really???");
    assert_eq!(transcript.turns()[1].text, "Yes.");
    assert_eq!(conversation.draft().await, "");
    assert!(!conversation.is_submitting().await);
}

#[tokio::test]
async fn blank_draft_is_ignored() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    conversation.set_draft("   ").await;
    assert_eq!(conversation.submit().await, SubmitOutcome::Ignored);
    assert!(conversation.transcript().await.is_empty());
}

#[tokio::test]
async fn response_field_is_accepted_as_the_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Twelve months." })))
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    assert_eq!(conversation.ask("How long is the term?").await, SubmitOutcome::Answered);
    assert_eq!(conversation.transcript().await.turns()[1].text, "Twelve months.");
}

#[tokio::test]
async fn failed_query_appends_an_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/doc-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    assert_eq!(conversation.ask("What is the rent?").await, SubmitOutcome::Failed);
    let transcript = conversation.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.turns()[1].text, QUERY_FAILED_MESSAGE);
}

#[tokio::test]
async fn demo_document_is_queried_without_a_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "ok" })))
        .mount(&server)
        .await;
    let app = app_for(&server);
    sign_in(&app, "tok-1");

    let demo = Conversation::new(app.clone(), app.config.demo_document_id.clone());
    demo.ask("What is this?").await;
    let own = Conversation::new(app, "doc-9");
    own.ask("What is this?").await;

    assert_eq!(
        authorization_headers(&server).await,
        vec![None, Some("Bearer tok-1".to_string())]
    );
}

#[tokio::test]
async fn overlapping_answers_land_in_arrival_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/doc-1"))
        .and(body_json(json!({ "query": "What is the rent?" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "1200 a month." }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query/doc-1"))
        .and(body_json(json!({ "query": "Who pays utilities?" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "The tenant." }))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    let (first, second) = tokio::join!(
        conversation.ask("What is the rent?"),
        conversation.ask("Who pays utilities?")
    );

    assert_eq!((first, second), (SubmitOutcome::Answered, SubmitOutcome::Answered));
    let turns: Vec<(Role, String)> = conversation
        .transcript()
        .await
        .turns()
        .iter()
        .map(|t| (t.role, t.text.clone()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (Role::User, "What is the rent?".to_string()),
            (Role::User, "Who pays utilities?".to_string()),
            (Role::Assistant, "The tenant.".to_string()),
            (Role::Assistant, "1200 a month.".to_string()),
        ]
    );
    assert!(!conversation.is_submitting().await);
}

#[tokio::test]
async fn reset_drops_an_answer_still_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/doc-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "stale answer" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");

    let (outcome, ()) = tokio::join!(conversation.ask("What is the rent?"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        conversation.reset().await;
    });

    assert_eq!(outcome, SubmitOutcome::Discarded);
    assert!(conversation.transcript().await.is_empty());
    assert!(!conversation.is_submitting().await);
}

#[tokio::test]
async fn reset_clears_the_transcript() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    as_guest(&app);
    let conversation = Conversation::new(app, "doc-1");
    conversation.ask("One? Two?").await;

    conversation.reset().await;
    assert!(conversation.transcript().await.is_empty());
}

//=========================================================================================
// Document panel and history
//=========================================================================================

#[tokio::test]
async fn document_panel_falls_back_to_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/document/doc-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let app = app_for(&server);

    assert_eq!(load_document_info(&app, "doc-1").await, DocumentInfo::placeholder());
}

#[tokio::test]
async fn document_panel_reads_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/document/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filename": "lease.pdf",
            "chunks": 12,
            "text_length": 4096,
            "is_demo": false,
            "can_view": true
        })))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let info = load_document_info(&app, "doc-1").await;
    assert_eq!(info.filename, "lease.pdf");
    assert_eq!(info.chunks, 12);
    assert!(info.can_view);
}

#[tokio::test]
async fn history_failure_yields_empty_list_and_notification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = app_for(&server);
    sign_in(&app, "tok-1");

    let loaded = load_history(&app).await;
    assert!(loaded.value.documents.is_empty());
    let error = loaded.error.unwrap();
    assert_eq!(error.level, NotificationLevel::Error);
    assert_eq!(error.message, "Failed to load document history");
}

#[tokio::test]
async fn history_is_fetched_with_the_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "id": "doc-1",
                "filename": "lease.pdf",
                "upload_date": "2024-03-05T14:30:00Z",
                "file_size": 2048,
                "text_length": 900,
                "processing_status": "completed",
                "meta": { "pages": 3 }
            }],
            "summary": { "total_documents": 1, "total_size_bytes": 2048, "recent_documents": [] }
        })))
        .mount(&server)
        .await;
    let app = app_for(&server);
    sign_in(&app, "tok-1");

    let loaded = load_history(&app).await;
    assert!(loaded.error.is_none());
    assert_eq!(loaded.value.documents.len(), 1);
    assert_eq!(loaded.value.documents[0].metadata.get("pages").map(String::as_str), Some("3"));
    assert_eq!(loaded.value.summary.total_documents, 1);
}

#[tokio::test]
async fn document_queries_need_a_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "queries": [] })))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server);
    as_guest(&app);

    let loaded = load_document_queries(&app, "doc-1").await;
    assert!(loaded.value.is_empty());
    assert_eq!(loaded.error.unwrap().message, "Failed to load document queries");
}
