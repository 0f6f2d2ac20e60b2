//! services/client/src/flows/upload.rs
//!
//! The upload flow: validates one file locally, checks the guest quota or the
//! credit balance, submits it, and reports the resulting document id.

use crate::flows::state::AppState;
use lens_core::domain::{Notification, NotificationLevel, UploadFile, UploadReceipt};
use lens_core::ports::{PortError, SessionProvider};
use tracing::{info, warn};

/// Largest file accepted for upload (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const RATE_LIMITED_MESSAGE: &str = "Upload limit reached. Please try again later.";
const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload document. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Please upload a PDF file")]
    NotPdf,
    #[error("File should not exceed 5MB")]
    TooLarge { size: u64 },
    #[error("You've used your free uploads for today. Sign in to analyze more documents.")]
    GuestQuotaExhausted,
    #[error("You have no credits left. Please upgrade or contact support.")]
    NoCredits,
    /// The backend answered 429.
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Failed(String),
}

impl UploadError {
    pub fn notification(&self) -> Notification {
        let (level, title) = match self {
            UploadError::NotPdf | UploadError::TooLarge { .. } | UploadError::Failed(_) => {
                (NotificationLevel::Error, "Error")
            }
            UploadError::GuestQuotaExhausted => (NotificationLevel::Warning, "Daily limit reached"),
            UploadError::NoCredits => (NotificationLevel::Error, "No Credits"),
            UploadError::RateLimited(_) => (NotificationLevel::Warning, "Upload limit reached"),
        };
        Notification::new(level, title, self.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UploadSuccess {
    pub receipt: UploadReceipt,
    pub notification: Notification,
}

impl UploadSuccess {
    pub fn document_id(&self) -> &str {
        &self.receipt.document_id
    }
}

/// Client-side checks; a failure here means no request is made.
pub fn validate_file(file: &UploadFile) -> Result<(), UploadError> {
    if !file.name.to_lowercase().ends_with(".pdf") {
        return Err(UploadError::NotPdf);
    }
    if file.size() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size: file.size() });
    }
    Ok(())
}

/// Uploads `file` as the current user, or as a guest when no session exists.
///
/// `credits` is the balance last shown to a signed-in user; exactly zero
/// stops the upload before any request is made.
pub async fn upload_document(
    state: &AppState,
    file: &UploadFile,
    credits: Option<i64>,
) -> Result<UploadSuccess, UploadError> {
    validate_file(file)?;

    let is_guest = state.session.snapshot().is_guest();
    if is_guest {
        match state.quota.remaining() {
            Ok(0) => return Err(UploadError::GuestQuotaExhausted),
            Ok(_) => {}
            // An unreadable counter does not block the upload; the backend still answers 429.
            Err(e) => warn!("Could not read the guest upload counter: {}", e),
        }
    } else if credits == Some(0) {
        return Err(UploadError::NoCredits);
    }

    let token = if is_guest {
        None
    } else {
        state
            .session
            .id_token()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?
    };

    info!("Uploading '{}' as {}", file.name, if is_guest { "guest" } else { "user" });
    let receipt = match state.documents.upload(file, token.as_deref()).await {
        Ok(receipt) => receipt,
        Err(PortError::RateLimited { detail }) => {
            if is_guest {
                if let Err(e) = state.quota.exhaust() {
                    warn!("Could not persist the guest upload counter: {}", e);
                }
            }
            return Err(UploadError::RateLimited(
                detail.unwrap_or_else(|| RATE_LIMITED_MESSAGE.to_string()),
            ));
        }
        Err(e) => {
            warn!("Upload failed: {}", e);
            return Err(UploadError::Failed(
                e.detail().unwrap_or(UPLOAD_FAILED_MESSAGE).to_string(),
            ));
        }
    };

    let message = if receipt.is_guest {
        let local = match state.quota.consume_one() {
            Ok(remaining) => i64::from(remaining),
            Err(e) => {
                warn!("Could not persist the guest upload counter: {}", e);
                0
            }
        };
        let remaining = receipt.guest_remaining_uploads.unwrap_or(local);
        format!(
            "Document uploaded successfully. You have {} free upload{} left today.",
            remaining,
            plural(remaining)
        )
    } else {
        match receipt.credits_remaining {
            Some(credits) => format!(
                "Document uploaded successfully. You have {} credit{} remaining.",
                credits,
                plural(credits)
            ),
            None => "Document uploaded successfully".to_string(),
        }
    };

    info!("Uploaded '{}' as document {}", file.name, receipt.document_id);
    Ok(UploadSuccess {
        receipt,
        notification: Notification::success("Success", message),
    })
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pdf_names_pass() {
        assert_eq!(validate_file(&UploadFile::new("lease.PDF", vec![0; 10])), Ok(()));
        assert_eq!(
            validate_file(&UploadFile::new("lease.docx", vec![0; 10])),
            Err(UploadError::NotPdf)
        );
        assert_eq!(
            validate_file(&UploadFile::new("pdf", vec![0; 10])),
            Err(UploadError::NotPdf)
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let at_limit = UploadFile::new("a.pdf", vec![0; MAX_UPLOAD_BYTES as usize]);
        assert_eq!(validate_file(&at_limit), Ok(()));
        let over = UploadFile::new("a.pdf", vec![0; MAX_UPLOAD_BYTES as usize + 1]);
        assert_eq!(
            validate_file(&over),
            Err(UploadError::TooLarge { size: MAX_UPLOAD_BYTES + 1 })
        );
    }
}
