//! services/client/src/adapters/http.rs
//!
//! This module contains the backend adapter, the concrete implementation of the
//! `DocumentService` port from the `core` crate. It talks to the remote
//! document-analysis API over HTTP using `reqwest`.

use crate::endpoints::Endpoints;
use async_trait::async_trait;
use lens_core::domain::{
    DocumentInfo, History, HistoryDocument, HistoryQuery, HistorySummary, UploadFile,
    UploadReceipt, UserProfile,
};
use lens_core::ports::{DocumentService, PortError, PortResult};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A backend adapter that implements the `DocumentService` port.
#[derive(Clone)]
pub struct HttpDocumentAdapter {
    client: Client,
    endpoints: Endpoints,
}

impl HttpDocumentAdapter {
    /// Creates a new `HttpDocumentAdapter`.
    ///
    /// No request timeout is configured; calls wait as long as the transport does.
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed response body: {}", e)))
    }
}

/// Turns a non-success response into the matching `PortError`.
async fn check_status(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorRecord>(&body)
        .ok()
        .and_then(ErrorRecord::into_detail);
    warn!("{} answered {}: {:?}", url, status, detail);

    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(PortError::RateLimited { detail })
    } else {
        Err(PortError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct ErrorRecord {
    #[serde(default)]
    detail: Option<Value>,
}
impl ErrorRecord {
    /// Only a plain-string `detail` is shown to users.
    fn into_detail(self) -> Option<String> {
        match self.detail {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ProfileRecord {
    email: String,
    #[serde(default)]
    credits: i64,
    firebase_uid: String,
}
impl ProfileRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            email: self.email,
            credits: self.credits,
            firebase_uid: self.firebase_uid,
        }
    }
}

#[derive(Deserialize)]
struct UploadRecord {
    document_id: String,
    #[serde(default)]
    is_guest: bool,
    credits_remaining: Option<i64>,
    guest_remaining_uploads: Option<i64>,
}
impl UploadRecord {
    fn to_domain(self) -> UploadReceipt {
        UploadReceipt {
            document_id: self.document_id,
            is_guest: self.is_guest,
            credits_remaining: self.credits_remaining,
            guest_remaining_uploads: self.guest_remaining_uploads,
        }
    }
}

#[derive(serde::Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct AnswerRecord {
    #[serde(alias = "response")]
    answer: String,
}

#[derive(Deserialize)]
struct DocumentInfoRecord {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    chunks: u64,
    #[serde(default)]
    text_length: u64,
    #[serde(default)]
    is_demo: bool,
    #[serde(default)]
    can_view: bool,
}
impl DocumentInfoRecord {
    fn to_domain(self) -> DocumentInfo {
        DocumentInfo {
            filename: self
                .filename
                .unwrap_or_else(|| DocumentInfo::placeholder().filename),
            chunks: self.chunks,
            text_length: self.text_length,
            is_demo: self.is_demo,
            can_view: self.can_view,
        }
    }
}

#[derive(Deserialize)]
struct HistoryRecord {
    #[serde(default)]
    documents: Vec<HistoryDocumentRecord>,
    #[serde(default)]
    summary: Option<SummaryRecord>,
}
impl HistoryRecord {
    fn to_domain(self) -> History {
        History {
            documents: self
                .documents
                .into_iter()
                .map(HistoryDocumentRecord::to_domain)
                .collect(),
            summary: self.summary.map(SummaryRecord::to_domain).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct HistoryDocumentRecord {
    id: String,
    filename: String,
    upload_date: String,
    #[serde(default)]
    file_size: u64,
    text_length: Option<u64>,
    #[serde(default)]
    processing_status: Option<String>,
    #[serde(default)]
    meta: Option<Value>,
}
impl HistoryDocumentRecord {
    fn to_domain(self) -> HistoryDocument {
        HistoryDocument {
            id: self.id,
            filename: self.filename,
            upload_date: self.upload_date,
            file_size: self.file_size,
            text_length: self.text_length.unwrap_or(0),
            processing_status: self
                .processing_status
                .unwrap_or_else(|| "completed".to_string()),
            metadata: flatten_meta(self.meta),
        }
    }
}

/// Free-form metadata becomes display strings keyed by field name.
fn flatten_meta(meta: Option<Value>) -> BTreeMap<String, String> {
    match meta {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

#[derive(Deserialize)]
struct SummaryRecord {
    #[serde(default)]
    total_documents: u64,
    #[serde(default)]
    total_size_bytes: u64,
    #[serde(default)]
    recent_documents: Value,
}
impl SummaryRecord {
    fn to_domain(self) -> HistorySummary {
        // Some backends send the recent documents themselves rather than a count.
        let recent_documents = match &self.recent_documents {
            Value::Array(items) => items.len() as u64,
            Value::Number(n) => n.as_u64().unwrap_or(0),
            _ => 0,
        };
        HistorySummary {
            total_documents: self.total_documents,
            total_size_bytes: self.total_size_bytes,
            recent_documents,
        }
    }
}

#[derive(Deserialize)]
struct QueriesRecord {
    #[serde(default)]
    queries: Vec<QueryRecord>,
}

#[derive(Deserialize)]
struct QueryRecord {
    id: String,
    query_text: String,
    response_text: String,
    query_date: String,
    response_time_ms: Option<u64>,
}
impl QueryRecord {
    fn to_domain(self) -> HistoryQuery {
        HistoryQuery {
            id: self.id,
            query_text: self.query_text,
            response_text: self.response_text,
            query_date: self.query_date,
            response_time_ms: self.response_time_ms.unwrap_or(0),
        }
    }
}

//=========================================================================================
// `DocumentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentService for HttpDocumentAdapter {
    async fn me(&self, token: Option<&str>) -> PortResult<UserProfile> {
        let request = Self::with_token(self.client.get(self.endpoints.me()), token);
        let record: ProfileRecord = self.send(request).await?;
        Ok(record.to_domain())
    }

    async fn upload(&self, file: &UploadFile, token: Option<&str>) -> PortResult<UploadReceipt> {
        debug!("Uploading '{}' ({} bytes)", file.name, file.size());
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);
        let request = Self::with_token(self.client.post(self.endpoints.upload()), token)
            .multipart(form);
        let record: UploadRecord = self.send(request).await?;
        Ok(record.to_domain())
    }

    async fn query(
        &self,
        document_id: &str,
        query: &str,
        token: Option<&str>,
    ) -> PortResult<String> {
        let request = Self::with_token(self.client.post(self.endpoints.query(document_id)), token)
            .json(&QueryRequest { query });
        let record: AnswerRecord = self.send(request).await?;
        Ok(record.answer)
    }

    async fn document_info(&self, document_id: &str) -> PortResult<DocumentInfo> {
        let request = self.client.get(self.endpoints.document_info(document_id));
        let record: DocumentInfoRecord = self.send(request).await?;
        Ok(record.to_domain())
    }

    async fn history(&self, token: &str) -> PortResult<History> {
        let request = self.client.get(self.endpoints.history()).bearer_auth(token);
        let record: HistoryRecord = self.send(request).await?;
        Ok(record.to_domain())
    }

    async fn document_queries(
        &self,
        document_id: &str,
        token: &str,
    ) -> PortResult<Vec<HistoryQuery>> {
        let request = self
            .client
            .get(self.endpoints.document_queries(document_id))
            .bearer_auth(token);
        let record: QueriesRecord = self.send(request).await?;
        Ok(record.queries.into_iter().map(QueryRecord::to_domain).collect())
    }

    async fn health(&self) -> PortResult<String> {
        let response = self
            .client
            .get(self.endpoints.health())
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .text()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))
    }
}
