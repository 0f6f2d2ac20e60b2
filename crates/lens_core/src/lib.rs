pub mod domain;
pub mod format;
pub mod password;
pub mod ports;
pub mod quota;
pub mod routing;
pub mod screening;

pub use domain::{
    AuthUser, DocumentInfo, History, HistoryDocument, HistoryQuery, HistorySummary,
    Notification, NotificationLevel, Role, SessionSnapshot, Transcript, Turn, UploadFile,
    UploadReceipt, UserProfile,
};
pub use ports::{
    DocumentService, FederatedCredential, IdentityService, IssuedSession, KeyValueStore,
    PortError, PortResult, SessionProvider,
};
pub use quota::GuestQuotaTracker;
