//! services/client/src/flows/history.rs
//!
//! The history page: the signed-in user's documents with a summary, and the
//! questions asked against any one of them.

use crate::flows::state::AppState;
use lens_core::domain::{History, HistoryQuery, Notification};
use lens_core::format::{format_count, format_date, format_file_size};
use lens_core::ports::{PortError, PortResult, SessionProvider};
use tracing::error;

/// A fetched value, or an empty one plus the notification explaining why.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub error: Option<Notification>,
}

impl<T: Default> Loaded<T> {
    fn from_result(result: PortResult<T>, failure_message: &str) -> Self {
        match result {
            Ok(value) => Self { value, error: None },
            Err(e) => {
                error!("{}: {}", failure_message, e);
                Self {
                    value: T::default(),
                    error: Some(Notification::error("Error", failure_message)),
                }
            }
        }
    }
}

async fn bearer(state: &AppState) -> PortResult<String> {
    state.session.id_token().await?.ok_or(PortError::Unauthorized)
}

/// Loaded once when the page opens.
pub async fn load_history(state: &AppState) -> Loaded<History> {
    let result = async {
        let token = bearer(state).await?;
        state.documents.history(&token).await
    }
    .await;
    Loaded::from_result(result, "Failed to load document history")
}

/// Loaded when a document's detail view is opened; nothing is cached.
pub async fn load_document_queries(state: &AppState, document_id: &str) -> Loaded<Vec<HistoryQuery>> {
    let result = async {
        let token = bearer(state).await?;
        state.documents.document_queries(document_id, &token).await
    }
    .await;
    Loaded::from_result(result, "Failed to load document queries")
}

/// The two summary badges at the top of the page.
pub fn summary_lines(history: &History) -> [String; 2] {
    let count = history.summary.total_documents;
    [
        format!("{} Document{}", format_count(count), if count == 1 { "" } else { "s" }),
        format!("{} Total", format_file_size(history.summary.total_size_bytes)),
    ]
}

/// One row per document: name, upload date, size, and text length when known.
pub fn document_rows(history: &History) -> Vec<String> {
    history
        .documents
        .iter()
        .map(|doc| {
            let mut row = format!(
                "{}  {}  {}  {}",
                doc.id,
                doc.filename,
                format_date(&doc.upload_date),
                format_file_size(doc.file_size)
            );
            if doc.text_length > 0 {
                row.push_str(&format!("  {} chars", format_count(doc.text_length)));
            }
            if doc.processing_status != "completed" {
                row.push_str(&format!("  [{}]", doc.processing_status));
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_core::domain::{HistoryDocument, HistorySummary};
    use std::collections::BTreeMap;

    fn history() -> History {
        History {
            documents: vec![HistoryDocument {
                id: "d1".into(),
                filename: "lease.pdf".into(),
                upload_date: "2024-01-05T15:07:00".into(),
                file_size: 1536,
                text_length: 12_000,
                processing_status: "completed".into(),
                metadata: BTreeMap::new(),
            }],
            summary: HistorySummary {
                total_documents: 1,
                total_size_bytes: 1536,
                recent_documents: 1,
            },
        }
    }

    #[test]
    fn summary_badges() {
        assert_eq!(summary_lines(&history()), ["1 Document".to_string(), "1.5 KB Total".to_string()]);
        assert_eq!(
            summary_lines(&History::default()),
            ["0 Documents".to_string(), "0 Bytes Total".to_string()]
        );
    }

    #[test]
    fn rows_show_size_date_and_length() {
        assert_eq!(
            document_rows(&history()),
            vec!["d1  lease.pdf  Jan 5, 2024, 3:07 PM  1.5 KB  12,000 chars".to_string()]
        );
    }
}
