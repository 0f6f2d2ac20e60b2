//! crates/lens_core/src/domain.rs
//!
//! Defines the pure, client-side view models of the application.
//! These structs are rebuilt from API responses and are independent of any
//! wire or serialization format.

use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// Session
//=========================================================================================

/// The identity a resolved session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

/// The observable state of the identity session.
///
/// `loading` stays `true` until the identity provider has reported for the
/// first time; after that `user` alone tells signed-in from signed-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub user: Option<AuthUser>,
}

impl SessionSnapshot {
    /// The state at process start, before the provider has answered.
    pub fn resolving() -> Self {
        Self {
            loading: true,
            user: None,
        }
    }

    pub fn signed_in(user: AuthUser) -> Self {
        Self {
            loading: false,
            user: Some(user),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            loading: false,
            user: None,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }
}

//=========================================================================================
// Transcript
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Represents a single message in a conversation about one document.
#[derive(Debug, Clone)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
}

/// The ordered, in-memory exchange history for one active document.
///
/// Append-only: turns land in the order they are pushed, which for answers is
/// the order their responses resolved.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &Turn {
        self.push(Role::User, text.into())
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) -> &Turn {
        self.push(Role::Assistant, text.into())
    }

    fn push(&mut self, role: Role, text: String) -> &Turn {
        self.turns.push(Turn {
            id: Uuid::new_v4(),
            role,
            text,
        });
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

//=========================================================================================
// Documents and Profiles
//=========================================================================================

/// Read-only metadata about an uploaded (or demo) document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub filename: String,
    pub chunks: u64,
    pub text_length: u64,
    pub is_demo: bool,
    pub can_view: bool,
}

impl DocumentInfo {
    /// What the detail panel shows when the metadata could not be fetched.
    pub fn placeholder() -> Self {
        Self {
            filename: "Document".to_string(),
            chunks: 0,
            text_length: 0,
            is_demo: false,
            can_view: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub credits: i64,
    pub firebase_uid: String,
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The backend's answer to a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub document_id: String,
    pub is_guest: bool,
    pub credits_remaining: Option<i64>,
    pub guest_remaining_uploads: Option<i64>,
}

//=========================================================================================
// History
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDocument {
    pub id: String,
    pub filename: String,
    /// ISO-8601 timestamp exactly as the backend sent it.
    pub upload_date: String,
    pub file_size: u64,
    pub text_length: u64,
    pub processing_status: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total_documents: u64,
    pub total_size_bytes: u64,
    pub recent_documents: u64,
}

/// Snapshot of everything the authenticated user has uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    pub documents: Vec<HistoryDocument>,
    pub summary: HistorySummary,
}

/// A question previously asked against one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub id: String,
    pub query_text: String,
    pub response_text: String,
    pub query_date: String,
    pub response_time_ms: u64,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient, user-facing message produced by a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_keeps_push_order() {
        let mut transcript = Transcript::new();
        transcript.push_user("What is the term?");
        transcript.push_assistant("Twelve months.");
        transcript.push_user("Can it be renewed?");

        let roles: Vec<Role> = transcript.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(transcript.turns()[1].text, "Twelve months.");

        transcript.clear();
        assert!(transcript.is_empty());
    }

    #[test]
    fn snapshot_guest_means_no_user() {
        assert!(SessionSnapshot::resolving().is_guest());
        assert!(SessionSnapshot::signed_out().is_guest());
        let user = AuthUser {
            uid: "u1".into(),
            email: None,
            email_verified: true,
        };
        assert!(!SessionSnapshot::signed_in(user).is_guest());
    }
}
