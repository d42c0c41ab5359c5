//! Turning viewer state into something to show.
//!
//! `ViewerView` is the presentation decision (which of the mutually
//! exclusive displays applies); `to_text` draws it for a terminal.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::tex::extract_math;
use super::{DocumentRef, Format, ViewerState};

/// Named states of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Idle,
    Loading,
    Error,
    PdfLink,
    DocxBinary,
    TexSource,
    ZipListing,
    ZipEntrySelected,
    Unsupported,
}

/// Content pane of the ZIP display.
#[derive(Debug, Clone, PartialEq)]
pub enum ZipPane {
    /// Nothing selected yet.
    Prompt,
    /// Entry fetch in flight.
    Loading,
    /// Binary image, shown inline.
    Image { content_type: String, base64: String },
    /// Binary that cannot be previewed.
    UnsupportedBinary { content_type: String },
    Text(String),
}

impl ZipPane {
    /// `data:` URI for an image pane.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            ZipPane::Image {
                content_type,
                base64,
            } => Some(format!("data:{};base64,{}", content_type, base64)),
            _ => None,
        }
    }

    /// Decoded bytes of an image pane.
    pub fn image_bytes(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        match self {
            ZipPane::Image { base64, .. } => Some(STANDARD.decode(base64.trim())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerView {
    Idle,
    Loading,
    Error(String),
    Pdf {
        url: String,
    },
    Docx {
        size: usize,
    },
    Tex {
        source: String,
        equations: Vec<String>,
    },
    Zip {
        entries: Vec<String>,
        selected: Option<String>,
        pane: ZipPane,
    },
    Unsupported,
}

impl ViewerView {
    pub fn build(doc: Option<&DocumentRef>, state: &ViewerState) -> Self {
        let Some(doc) = doc else {
            return ViewerView::Idle;
        };
        if state.loading {
            return ViewerView::Loading;
        }
        if let Some(error) = &state.error {
            return ViewerView::Error(error.clone());
        }

        match &doc.format {
            Format::Pdf => {
                if let Some(url) = &state.file_url {
                    return ViewerView::Pdf { url: url.clone() };
                }
            }
            Format::Docx => {
                if let Some(bytes) = &state.docx_binary {
                    return ViewerView::Docx { size: bytes.len() };
                }
            }
            Format::Tex => {
                if let Some(source) = state.tex_source.as_ref().filter(|s| !s.is_empty()) {
                    return ViewerView::Tex {
                        source: source.clone(),
                        equations: extract_math(source),
                    };
                }
            }
            Format::Zip => {
                if !state.zip_entries.is_empty() {
                    return ViewerView::Zip {
                        entries: state.zip_entries.clone(),
                        selected: state.selected_zip_entry.clone(),
                        pane: zip_pane(state),
                    };
                }
            }
            Format::Other(_) => {}
        }
        ViewerView::Unsupported
    }

    pub fn phase(&self) -> ViewerPhase {
        match self {
            ViewerView::Idle => ViewerPhase::Idle,
            ViewerView::Loading => ViewerPhase::Loading,
            ViewerView::Error(_) => ViewerPhase::Error,
            ViewerView::Pdf { .. } => ViewerPhase::PdfLink,
            ViewerView::Docx { .. } => ViewerPhase::DocxBinary,
            ViewerView::Tex { .. } => ViewerPhase::TexSource,
            ViewerView::Zip { selected: None, .. } => ViewerPhase::ZipListing,
            ViewerView::Zip { .. } => ViewerPhase::ZipEntrySelected,
            ViewerView::Unsupported => ViewerPhase::Unsupported,
        }
    }

    /// Plain-text rendering for a terminal.
    pub fn to_text(&self) -> String {
        match self {
            ViewerView::Idle => String::new(),
            ViewerView::Loading => "Loading...".to_string(),
            ViewerView::Error(message) => format!("Error: {}", message),
            ViewerView::Pdf { url } => format!("PDF document: {}", url),
            ViewerView::Docx { size } => format!("DOCX document ({} bytes)", size),
            ViewerView::Tex { source, equations } => {
                let mut out = String::from("LaTeX Source\n");
                out.push_str(&listing(source));
                if !equations.is_empty() {
                    out.push_str("\nRendered Equations\n");
                    for (i, eq) in equations.iter().enumerate() {
                        out.push_str(&format!("  [{}] {}\n", i + 1, eq));
                    }
                }
                out
            }
            ViewerView::Zip {
                entries,
                selected,
                pane,
            } => {
                let mut out = String::from("ZIP Contents\n");
                for entry in entries {
                    let marker = if selected.as_deref() == Some(entry.as_str()) {
                        '>'
                    } else {
                        ' '
                    };
                    out.push_str(&format!("{} {}\n", marker, entry));
                }
                out.push('\n');
                if let Some(name) = selected {
                    out.push_str(&format!("{}\n", name));
                }
                out.push_str(&match pane {
                    ZipPane::Prompt => "Select a file from the list to view its contents\n".to_string(),
                    ZipPane::Loading => "Loading...\n".to_string(),
                    ZipPane::Image { content_type, base64 } => {
                        format!("[image {}, {} base64 chars]\n", content_type, base64.len())
                    }
                    ZipPane::UnsupportedBinary { .. } => {
                        "Binary file type not supported for preview.\n".to_string()
                    }
                    ZipPane::Text(text) => listing(text),
                });
                out
            }
            ViewerView::Unsupported => "No file available or unsupported file type.".to_string(),
        }
    }
}

fn zip_pane(state: &ViewerState) -> ZipPane {
    if state.selected_zip_entry.is_none() {
        return ZipPane::Prompt;
    }
    let Some(content) = &state.zip_entry_content else {
        return ZipPane::Loading;
    };
    if !content.is_binary {
        return ZipPane::Text(content.content.clone());
    }
    if content.content_type.starts_with("image/") {
        ZipPane::Image {
            content_type: content.content_type.clone(),
            base64: content.content.clone(),
        }
    } else {
        ZipPane::UnsupportedBinary {
            content_type: content.content_type.clone(),
        }
    }
}

/// Source listing with a line-number gutter.
fn listing(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let width = lines.len().max(1).to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} | {}\n", i + 1, line, width = width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::ZipEntryContent;

    fn zip_doc() -> DocumentRef {
        DocumentRef::new("1", "1", Format::Zip)
    }

    fn zip_state(content: Option<ZipEntryContent>) -> ViewerState {
        ViewerState {
            zip_entries: vec!["a.png".into(), "b.bin".into(), "c.txt".into()],
            selected_zip_entry: Some("a.png".into()),
            zip_entry_content: content,
            ..ViewerState::default()
        }
    }

    #[test]
    fn test_no_document_is_idle() {
        assert_eq!(ViewerView::build(None, &ViewerState::default()), ViewerView::Idle);
    }

    #[test]
    fn test_error_wins_over_content() {
        let state = ViewerState {
            error: Some("Failed to load tex file. nope".into()),
            tex_source: Some("x".into()),
            ..ViewerState::default()
        };
        let view = ViewerView::build(Some(&DocumentRef::new("1", "1", Format::Tex)), &state);
        assert_eq!(view.phase(), ViewerPhase::Error);
        assert_eq!(view.to_text(), "Error: Failed to load tex file. nope");
    }

    #[test]
    fn test_image_pane() {
        let view = ViewerView::build(
            Some(&zip_doc()),
            &zip_state(Some(ZipEntryContent {
                content: "iVBORw0KGgo=".into(),
                content_type: "image/png".into(),
                is_binary: true,
            })),
        );
        let ViewerView::Zip { pane, .. } = &view else {
            panic!("expected zip view, got {:?}", view);
        };
        assert_eq!(pane.data_uri().unwrap(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(
            pane.image_bytes().unwrap().unwrap(),
            vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]
        );
        assert_eq!(view.phase(), ViewerPhase::ZipEntrySelected);
        assert!(view
            .to_text()
            .ends_with("> a.png\n  b.bin\n  c.txt\n\na.png\n[image image/png, 12 base64 chars]\n"));
    }

    #[test]
    fn test_binary_non_image_pane() {
        let view = ViewerView::build(
            Some(&zip_doc()),
            &zip_state(Some(ZipEntryContent {
                content: "AAEC".into(),
                content_type: "application/octet-stream".into(),
                is_binary: true,
            })),
        );
        assert!(view
            .to_text()
            .contains("Binary file type not supported for preview."));
    }

    #[test]
    fn test_selected_without_content_is_loading_pane() {
        let view = ViewerView::build(Some(&zip_doc()), &zip_state(None));
        let ViewerView::Zip { pane, selected, .. } = view else {
            panic!("expected zip view");
        };
        assert_eq!(pane, ZipPane::Loading);
        assert_eq!(selected.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_empty_zip_is_unsupported() {
        let view = ViewerView::build(Some(&zip_doc()), &ViewerState::default());
        assert_eq!(view, ViewerView::Unsupported);
    }

    #[test]
    fn test_tex_text_rendering() {
        let state = ViewerState {
            tex_source: Some("Intro $x^2$\nthen \\[y=mx+b\\] end.".into()),
            ..ViewerState::default()
        };
        let view = ViewerView::build(Some(&DocumentRef::new("1", "1", Format::Tex)), &state);
        assert_eq!(
            view.to_text(),
            "LaTeX Source\n1 | Intro $x^2$\n2 | then \\[y=mx+b\\] end.\n\nRendered Equations\n  [1] x^2\n  [2] y=mx+b\n"
        );
    }
}
