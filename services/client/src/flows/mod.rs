pub mod auth;
pub mod conversation;
pub mod document;
pub mod history;
pub mod navigation;
pub mod profile;
pub mod session;
pub mod state;
pub mod upload;

// Re-export the pieces the binary wires together.
pub use conversation::Conversation;
pub use profile::ProfilePoller;
pub use session::SessionHandle;
pub use state::AppState;
