//! Where the viewer gets file payloads from.

use super::DocumentRef;
use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::paperworks;
use crate::api::types::ZipEntryResponse;

/// File-serving operations the viewer needs.
///
/// `ApiClient` implements this over the paperwork file endpoints; tests use
/// mocks to control when each fetch resolves.
#[allow(async_fn_in_trait)]
pub trait FileSource {
    /// URL an embedder can load directly (no headers available).
    fn view_url(&self, doc: &DocumentRef) -> String;

    async fn fetch_bytes(&self, doc: &DocumentRef) -> Result<Vec<u8>, ApiError>;

    async fn fetch_text(&self, doc: &DocumentRef) -> Result<String, ApiError>;

    /// Entry paths of a ZIP document.
    async fn list_zip(&self, doc: &DocumentRef) -> Result<Vec<String>, ApiError>;

    async fn fetch_zip_entry(
        &self,
        doc: &DocumentRef,
        entry: &str,
    ) -> Result<ZipEntryResponse, ApiError>;
}

impl FileSource for ApiClient {
    fn view_url(&self, doc: &DocumentRef) -> String {
        paperworks::view_url(self, &doc.id, &doc.version, doc.format.as_str())
    }

    async fn fetch_bytes(&self, doc: &DocumentRef) -> Result<Vec<u8>, ApiError> {
        paperworks::fetch_view_bytes(self, &doc.id, &doc.version, doc.format.as_str()).await
    }

    async fn fetch_text(&self, doc: &DocumentRef) -> Result<String, ApiError> {
        paperworks::fetch_view_text(self, &doc.id, &doc.version, doc.format.as_str()).await
    }

    async fn list_zip(&self, doc: &DocumentRef) -> Result<Vec<String>, ApiError> {
        paperworks::zip_contents(self, &doc.id, &doc.version).await
    }

    async fn fetch_zip_entry(
        &self,
        doc: &DocumentRef,
        entry: &str,
    ) -> Result<ZipEntryResponse, ApiError> {
        paperworks::zip_entry(self, &doc.id, &doc.version, entry).await
    }
}
