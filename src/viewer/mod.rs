//! Multi-format document viewer.
//!
//! Given a document id, version and format, fetches the right representation
//! of a submitted file and exposes what should be rendered:
//!
//! - `pdf`: a direct view URL with the token in the query string, no fetch
//! - `docx`: raw bytes, handed to a `DocxMount` in a second step
//! - `tex`: source text plus the math expressions found in it
//! - `zip`: the entry listing; selecting an entry fetches that entry
//!
//! Every result is tagged with the generation that requested it. Opening a
//! new document bumps the generation, so a fetch that resolves late for a
//! superseded document is dropped instead of overwriting the newer state.

pub mod render;
pub mod source;
pub mod tex;

pub use render::{ViewerPhase, ViewerView, ZipPane};
pub use source::FileSource;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::error::ApiError;
use crate::api::types::ZipEntryResponse;

/// Declared format of a submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    Pdf,
    Docx,
    Tex,
    Zip,
    /// Anything else, with the tag as given.
    Other(String),
}

impl Format {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pdf" => Format::Pdf,
            "docx" => Format::Docx,
            "tex" => Format::Tex,
            "zip" => Format::Zip,
            _ => Format::Other(tag.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Tex => "tex",
            Format::Zip => "zip",
            Format::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identifying triple: which file of which version to show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub id: String,
    pub version: String,
    pub format: Format,
}

impl DocumentRef {
    pub fn new(id: impl ToString, version: impl ToString, format: Format) -> Self {
        Self {
            id: id.to_string(),
            version: version.to_string(),
            format,
        }
    }
}

/// Content of one ZIP entry as served by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipEntryContent {
    /// Text, or base64 when `is_binary`.
    pub content: String,
    pub content_type: String,
    pub is_binary: bool,
}

impl From<ZipEntryResponse> for ZipEntryContent {
    fn from(resp: ZipEntryResponse) -> Self {
        match resp.content.filter(|c| !c.is_empty()) {
            Some(content) => Self {
                content,
                content_type: resp
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                is_binary: resp.is_binary.unwrap_or(false),
            },
            None => Self {
                content: "No content available".to_string(),
                content_type: "text/plain".to_string(),
                is_binary: false,
            },
        }
    }
}

/// Everything the viewer knows about the current document.
///
/// At most one of `file_url`, `zip_entries`, `docx_binary` and `tex_source`
/// is populated, selected by the document's format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    pub loading: bool,
    pub error: Option<String>,
    pub file_url: Option<String>,
    pub zip_entries: Vec<String>,
    pub selected_zip_entry: Option<String>,
    pub zip_entry_content: Option<ZipEntryContent>,
    /// Spinner for the ZIP content pane only.
    pub zip_entry_loading: bool,
    pub docx_binary: Option<Vec<u8>>,
    pub tex_source: Option<String>,
}

impl ViewerState {
    fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }
}

/// Second rendering step for DOCX payloads.
#[allow(async_fn_in_trait)]
pub trait DocxMount {
    /// Render the document bytes onto this surface.
    async fn render(&self, bytes: &[u8]) -> Result<(), String>;
}

/// Result of the initial fetch for a document.
enum Loaded {
    Url(String),
    Docx(Vec<u8>),
    Tex(String),
    Zip(Vec<String>),
    Nothing,
}

#[derive(Default)]
struct Inner {
    /// Bumped on every open/close.
    generation: u64,
    /// Bumped on every ZIP entry selection.
    selection: u64,
    document: Option<DocumentRef>,
    state: ViewerState,
}

/// Fetch-and-render state machine for one viewer surface.
pub struct DocumentViewer<S> {
    source: Arc<S>,
    inner: Mutex<Inner>,
}

fn failure_message(format: &Format, err: &ApiError) -> String {
    format!("Failed to load {} file. {}", format, err.detail())
}

impl<S: FileSource> DocumentViewer<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewerState {
        self.lock().state.clone()
    }

    pub fn document(&self) -> Option<DocumentRef> {
        self.lock().document.clone()
    }

    /// What should be on screen right now.
    pub fn view(&self) -> ViewerView {
        let inner = self.lock();
        ViewerView::build(inner.document.as_ref(), &inner.state)
    }

    /// Show a document, discarding everything about the previous one.
    ///
    /// Always restarts, even for the document already shown.
    pub async fn open(&self, doc: DocumentRef) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.selection = 0;
            inner.document = Some(doc.clone());
            inner.state = ViewerState::loading();
            inner.generation
        };
        log::info!(
            "Viewer opening paperwork {} version {} ({})",
            doc.id,
            doc.version,
            doc.format
        );

        let result = match &doc.format {
            Format::Pdf => Ok(Loaded::Url(self.source.view_url(&doc))),
            Format::Docx => self.source.fetch_bytes(&doc).await.map(Loaded::Docx),
            Format::Tex => self.source.fetch_text(&doc).await.map(Loaded::Tex),
            Format::Zip => self.source.list_zip(&doc).await.map(Loaded::Zip),
            Format::Other(_) => Ok(Loaded::Nothing),
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            log::debug!(
                "Discarding stale {} result for paperwork {} version {}",
                doc.format,
                doc.id,
                doc.version
            );
            return;
        }

        let state = &mut inner.state;
        state.loading = false;
        match result {
            Ok(Loaded::Url(url)) => state.file_url = Some(url),
            Ok(Loaded::Docx(bytes)) => state.docx_binary = Some(bytes),
            Ok(Loaded::Tex(text)) => state.tex_source = Some(text),
            Ok(Loaded::Zip(entries)) => state.zip_entries = entries,
            Ok(Loaded::Nothing) => {}
            Err(e) => {
                log::warn!("Error fetching {} file: {}", doc.format, e);
                state.error = Some(failure_message(&doc.format, &e));
            }
        }
    }

    /// Fetch and show one entry of the open ZIP document.
    ///
    /// Returns `false` without fetching when no ZIP listing is shown.
    pub async fn select_zip_entry(&self, entry: &str) -> bool {
        let (generation, selection, doc) = {
            let mut inner = self.lock();
            let doc = match &inner.document {
                Some(doc) if doc.format == Format::Zip => doc.clone(),
                _ => return false,
            };
            if inner.state.loading || inner.state.error.is_some() {
                return false;
            }
            inner.selection += 1;
            let state = &mut inner.state;
            state.selected_zip_entry = Some(entry.to_string());
            state.zip_entry_content = None;
            state.zip_entry_loading = true;
            (inner.generation, inner.selection, doc)
        };

        let result = self.source.fetch_zip_entry(&doc, entry).await;

        let mut inner = self.lock();
        if inner.generation != generation || inner.selection != selection {
            log::debug!("Discarding stale ZIP entry result for {}", entry);
            return true;
        }
        let state = &mut inner.state;
        state.zip_entry_loading = false;
        match result {
            Ok(resp) => state.zip_entry_content = Some(resp.into()),
            Err(e) => {
                log::warn!("Error viewing zip entry {}: {}", entry, e);
                state.error = Some(failure_message(&doc.format, &e));
            }
        }
        true
    }

    /// Hand loaded DOCX bytes to a rendering surface.
    ///
    /// Returns `Ok(false)` when there is nothing to render, or when the
    /// document changed while the surface was rendering.
    pub async fn mount_docx<M: DocxMount>(&self, mount: &M) -> Result<bool, String> {
        let (generation, bytes) = {
            let inner = self.lock();
            match &inner.state.docx_binary {
                Some(bytes) => (inner.generation, bytes.clone()),
                None => return Ok(false),
            }
        };
        mount.render(&bytes).await?;
        Ok(self.lock().generation == generation)
    }

    /// Reset to the initial state (the viewer is going away).
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.selection = 0;
        inner.document = None;
        inner.state = ViewerState::default();
    }
}
