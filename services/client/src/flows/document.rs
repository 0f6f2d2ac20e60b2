//! services/client/src/flows/document.rs
//!
//! The document detail panel.

use crate::flows::state::AppState;
use lens_core::domain::DocumentInfo;
use lens_core::format::format_count;
use tracing::error;

/// Fetches the panel's metadata once. Failures are logged and the panel falls
/// back to placeholder values.
pub async fn load_document_info(state: &AppState, document_id: &str) -> DocumentInfo {
    match state.documents.document_info(document_id).await {
        Ok(info) => info,
        Err(e) => {
            error!("Failed to load info for document {}: {}", document_id, e);
            DocumentInfo::placeholder()
        }
    }
}

/// Where the browser opens the rendered document.
pub fn document_view_url(state: &AppState, document_id: &str) -> String {
    state.endpoints.document_view(document_id)
}

/// The panel's lines, ready to print.
pub fn describe(info: &DocumentInfo) -> Vec<String> {
    let mut lines = vec![
        info.filename.clone(),
        format!("{} chunks", format_count(info.chunks)),
        format!("{} characters", format_count(info.text_length)),
    ];
    if info.is_demo {
        lines.push("Demo document".to_string());
    }
    lines
}
