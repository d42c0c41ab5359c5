//! Paperwork endpoints: listing, uploads, history and file serving.
//!
//! File-serving reads (view, ZIP listing, ZIP entry, download) bypass the
//! response cache. They carry the access token as a `token` query parameter
//! because the PDF URL is handed to an embedder that cannot set headers, and
//! the server accepts the same form on every file route.

use reqwest::multipart::{Form, Part};

use super::admin::PAPERWORKS_PREFIX;
use super::client::{ApiClient, RequestOptions};
use super::error::ApiError;
use super::types::{Paperwork, PaperworkVersion, Review, ZipEntryResponse, ZipListing};
use crate::config::{DOWNLOAD_TIMEOUT, UPLOAD_TIMEOUT};

/// A file to upload along with its form fields.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Extra text fields (`title`, `description`, `notes`, ...).
    pub fields: Vec<(String, String)>,
}

impl Upload {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::Unexpected(format!("Failed to create multipart part: {}", e)))?;
        let form = self
            .fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        Ok(form.part("file", part))
    }
}

// ── Listing and history ───────────────────────────────────────────────────────

pub async fn list(client: &ApiClient) -> Result<Vec<Paperwork>, ApiError> {
    client.get("/api/paperworks/").await?.json()
}

pub async fn get(client: &ApiClient, id: u64) -> Result<Paperwork, ApiError> {
    client.get(&format!("/api/paperworks/{}/", id)).await?.json()
}

pub async fn versions(client: &ApiClient, id: u64) -> Result<Vec<PaperworkVersion>, ApiError> {
    client
        .get(&format!("/api/paperworks/{}/versions/", id))
        .await?
        .json()
}

pub async fn version_details(
    client: &ApiClient,
    id: u64,
    version_id: u64,
) -> Result<PaperworkVersion, ApiError> {
    client
        .get(&format!("/api/paperworks/{}/versions/{}/", id, version_id))
        .await?
        .json()
}

pub async fn reviews(client: &ApiClient, id: u64) -> Result<Vec<Review>, ApiError> {
    client
        .get(&format!("/api/paperworks/{}/reviews/", id))
        .await?
        .json()
}

// ── Uploads ───────────────────────────────────────────────────────────────────

/// POST /api/paperworks/ (multipart, 30s timeout).
pub async fn create_paperwork(client: &ApiClient, upload: Upload) -> Result<Paperwork, ApiError> {
    client.invalidate(&[PAPERWORKS_PREFIX]);
    client
        .post_multipart(
            "/api/paperworks/",
            upload.into_form()?,
            RequestOptions::timeout(UPLOAD_TIMEOUT),
        )
        .await?
        .json()
}

/// POST /api/paperworks/{id}/versions/ (multipart, 30s timeout).
pub async fn submit_version(
    client: &ApiClient,
    id: u64,
    upload: Upload,
) -> Result<PaperworkVersion, ApiError> {
    client.invalidate(&[PAPERWORKS_PREFIX]);
    client
        .post_multipart(
            &format!("/api/paperworks/{}/versions/", id),
            upload.into_form()?,
            RequestOptions::timeout(UPLOAD_TIMEOUT),
        )
        .await?
        .json()
}

/// Download a file as raw bytes (60s timeout, uncached).
pub async fn download_file(client: &ApiClient, url: &str) -> Result<Vec<u8>, ApiError> {
    let resp = client
        .get_with(url, &[], RequestOptions::download(DOWNLOAD_TIMEOUT))
        .await?;
    Ok(resp.into_bytes())
}

// ── File serving ──────────────────────────────────────────────────────────────

fn version_base(client: &ApiClient, id: &str, version: &str) -> String {
    format!(
        "{}/admin_app/paperworks/{}/versions/{}",
        client.base_url(),
        urlencoding::encode(id),
        urlencoding::encode(version)
    )
}

/// Append `?token=` when an access token is stored.
fn with_token(client: &ApiClient, url: String) -> String {
    match client.access_token() {
        Some(token) => format!("{}?token={}", url, urlencoding::encode(&token)),
        None => url,
    }
}

/// Absolute URL of `.../{format}/view/`, token included.
pub fn view_url(client: &ApiClient, id: &str, version: &str, format: &str) -> String {
    let url = format!(
        "{}/{}/view/",
        version_base(client, id, version),
        urlencoding::encode(format)
    );
    with_token(client, url)
}

/// Raw bytes of `.../{format}/view/`.
pub async fn fetch_view_bytes(
    client: &ApiClient,
    id: &str,
    version: &str,
    format: &str,
) -> Result<Vec<u8>, ApiError> {
    let url = view_url(client, id, version, format);
    let resp = client
        .get_with(&url, &[], RequestOptions::download(DOWNLOAD_TIMEOUT))
        .await?;
    Ok(resp.into_bytes())
}

/// Text of `.../{format}/view/`.
pub async fn fetch_view_text(
    client: &ApiClient,
    id: &str,
    version: &str,
    format: &str,
) -> Result<String, ApiError> {
    let url = view_url(client, id, version, format);
    let resp = client
        .get_with(&url, &[], RequestOptions::uncached())
        .await?;
    Ok(resp.text())
}

/// Entry paths of a ZIP submission.
pub async fn zip_contents(
    client: &ApiClient,
    id: &str,
    version: &str,
) -> Result<Vec<String>, ApiError> {
    let url = with_token(
        client,
        format!("{}/zip-contents/", version_base(client, id, version)),
    );
    let listing: ZipListing = client
        .get_with(&url, &[], RequestOptions::uncached())
        .await?
        .json()?;
    Ok(listing.files)
}

/// One entry of a ZIP submission. The entry path is percent-encoded as a
/// single path segment, slashes included.
pub async fn zip_entry(
    client: &ApiClient,
    id: &str,
    version: &str,
    entry_path: &str,
) -> Result<ZipEntryResponse, ApiError> {
    let url = with_token(
        client,
        format!(
            "{}/zip-file/{}/",
            version_base(client, id, version),
            urlencoding::encode(entry_path)
        ),
    );
    client
        .get_with(&url, &[], RequestOptions::uncached())
        .await?
        .json()
}
