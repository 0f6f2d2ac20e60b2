//! services/client/src/endpoints.rs
//!
//! Maps each logical backend operation to its fully-qualified URL.

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn me(&self) -> String {
        format!("{}/me", self.base)
    }

    pub fn upload(&self) -> String {
        format!("{}/upload/", self.base)
    }

    pub fn query(&self, document_id: &str) -> String {
        format!("{}/query/{}", self.base, document_id)
    }

    pub fn document_info(&self, document_id: &str) -> String {
        format!("{}/document/{}", self.base, document_id)
    }

    /// Opened in a browser rather than fetched.
    pub fn document_view(&self, document_id: &str) -> String {
        format!("{}/document/{}/view", self.base, document_id)
    }

    pub fn history(&self) -> String {
        format!("{}/history/", self.base)
    }

    pub fn document_queries(&self, document_id: &str) -> String {
        format!("{}/history/{}/queries", self.base, document_id)
    }

    pub fn health(&self) -> String {
        format!("{}/health", self.base)
    }
}
