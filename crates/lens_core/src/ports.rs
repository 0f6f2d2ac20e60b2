//! crates/lens_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client flows are written against.
//! The backend API, the identity provider and browser-style local storage all
//! sit behind these ports, so the flows never depend on a concrete transport.

use async_trait::async_trait;
use crate::domain::{
    AuthUser, DocumentInfo, History, HistoryQuery, SessionSnapshot, UploadFile, UploadReceipt,
    UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Unauthorized")]
    Unauthorized,
    /// HTTP 429: the daily guest cap or the credit balance is exhausted.
    #[error("Rate limited: {}", .detail.as_deref().unwrap_or("no detail"))]
    RateLimited { detail: Option<String> },
    /// Any other non-success status, with the server's `detail` text if it sent one.
    #[error("Request rejected with status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The server-supplied `detail` text, when the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            PortError::RateLimited { detail } | PortError::Rejected { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote document-analysis backend.
///
/// `token` is the bearer credential; `None` sends the request anonymously.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn me(&self, token: Option<&str>) -> PortResult<UserProfile>;

    async fn upload(&self, file: &UploadFile, token: Option<&str>) -> PortResult<UploadReceipt>;

    /// Asks one question about a document and returns the answer text.
    async fn query(&self, document_id: &str, query: &str, token: Option<&str>)
        -> PortResult<String>;

    async fn document_info(&self, document_id: &str) -> PortResult<DocumentInfo>;

    async fn history(&self, token: &str) -> PortResult<History>;

    async fn document_queries(&self, document_id: &str, token: &str)
        -> PortResult<Vec<HistoryQuery>>;

    async fn health(&self) -> PortResult<String>;
}

/// A credential obtained from a federated (OAuth) sign-in.
#[derive(Debug, Clone)]
pub struct FederatedCredential {
    pub provider_id: String,
    pub id_token: String,
}

/// A freshly authenticated identity and the bearer token it was issued.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: AuthUser,
    pub id_token: String,
}

/// The third-party identity provider.
///
/// Issuing a session does not make it current; callers hand the result to the
/// session holder, and signing out only ever happens there.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> PortResult<IssuedSession>;

    async fn sign_up_with_password(&self, email: &str, password: &str)
        -> PortResult<IssuedSession>;

    async fn sign_in_federated(&self, credential: &FederatedCredential)
        -> PortResult<IssuedSession>;

    async fn send_verification_email(&self, id_token: &str) -> PortResult<()>;
}

/// Read access to the externally-mutated session value.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    fn snapshot(&self) -> SessionSnapshot;

    /// The bearer credential for the current user, `None` when signed out.
    async fn id_token(&self) -> PortResult<Option<String>>;
}

/// Persistent string storage, shaped like browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Writes several keys as one update: either all land or none do.
    fn set_many(&self, entries: &[(&str, &str)]) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}
