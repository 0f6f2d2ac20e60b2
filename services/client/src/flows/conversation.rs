//! services/client/src/flows/conversation.rs
//!
//! The conversation about one active document: screens each message, sends it
//! to the backend, and appends the answer to the transcript.

use crate::flows::state::AppState;
use lens_core::domain::Transcript;
use lens_core::ports::SessionProvider;
use lens_core::screening::{has_multiple_questions, MULTI_QUESTION_GUIDANCE};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Appended in place of an answer when the query fails.
pub const QUERY_FAILED_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request.";

/// What a submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Several questions at once; answered locally with guidance.
    Screened,
    Answered,
    /// The backend failed; an apology was appended.
    Failed,
    /// The conversation was reset while waiting; the result was dropped.
    Discarded,
}

struct ConversationState {
    transcript: Transcript,
    draft: String,
    in_flight: usize,
    /// Bumped on every reset; answers to an older generation are dropped.
    generation: u64,
}

/// One document's conversation.
///
/// Submissions may overlap. Each user turn is appended when it is sent and
/// each answer when its response arrives, so answers appear in resolution order.
pub struct Conversation {
    app: Arc<AppState>,
    document_id: String,
    state: Mutex<ConversationState>,
}

impl Conversation {
    pub fn new(app: Arc<AppState>, document_id: impl Into<String>) -> Self {
        Self {
            app,
            document_id: document_id.into(),
            state: Mutex::new(ConversationState {
                transcript: Transcript::new(),
                draft: String::new(),
                in_flight: 0,
                generation: 0,
            }),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().await.draft = text.into();
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft.clone()
    }

    pub async fn transcript(&self) -> Transcript {
        self.state.lock().await.transcript.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.in_flight > 0
    }

    /// Starts over with an empty transcript.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.transcript.clear();
        state.draft.clear();
        state.generation += 1;
    }

    /// Sends the current draft and clears it.
    pub async fn submit(&self) -> SubmitOutcome {
        let input = {
            let mut state = self.state.lock().await;
            if state.draft.trim().is_empty() {
                return SubmitOutcome::Ignored;
            }
            std::mem::take(&mut state.draft)
        };
        self.exchange(input).await
    }

    /// Sends `text` directly, leaving the draft alone.
    pub async fn ask(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }
        self.exchange(text.to_string()).await
    }

    async fn exchange(&self, input: String) -> SubmitOutcome {
        let (question, generation) = {
            let mut state = self.state.lock().await;
            if has_multiple_questions(&input) {
                info!("Multiple questions detected; not sending to the backend");
                state.transcript.push_user(input);
                state.transcript.push_assistant(MULTI_QUESTION_GUIDANCE);
                return SubmitOutcome::Screened;
            }
            let question = input.trim().to_string();
            state.transcript.push_user(question.clone());
            state.in_flight += 1;
            (question, state.generation)
        };

        let token = self.credential().await;
        let started = Instant::now();
        let result = self
            .app
            .documents
            .query(&self.document_id, &question, token.as_deref())
            .await;

        let mut state = self.state.lock().await;
        state.in_flight -= 1;
        if state.generation != generation {
            info!(
                "Dropping a reply for document {} that arrived after a reset",
                self.document_id
            );
            return SubmitOutcome::Discarded;
        }
        match result {
            Ok(answer) => {
                info!(
                    "Answer for document {} arrived in {:?}",
                    self.document_id,
                    started.elapsed()
                );
                state.transcript.push_assistant(answer);
                SubmitOutcome::Answered
            }
            Err(e) => {
                warn!("Query against document {} failed: {}", self.document_id, e);
                state.transcript.push_assistant(QUERY_FAILED_MESSAGE);
                SubmitOutcome::Failed
            }
        }
    }

    /// The bearer token, or `None` for guests and for the demo document.
    async fn credential(&self) -> Option<String> {
        if self.app.is_demo_document(&self.document_id) {
            return None;
        }
        if self.app.session.snapshot().is_guest() {
            return None;
        }
        match self.app.session.id_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the session token: {}", e);
                None
            }
        }
    }
}
