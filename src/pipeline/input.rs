//! Input validation: turn the user-supplied path into a checked local file.
//!
//! pdfium reports every unreadable input as a generic load failure. Checking
//! existence, permissions and the `%PDF` header up front gives callers a
//! specific message for the common mistakes (typo in the path, picked the
//! wrong file) before any rendering work starts.

use crate::error::PdfColorError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use tracing::debug;

/// Readers tolerate up to this much junk before the `%PDF` header.
const HEADER_SEARCH_LEN: usize = 1024;

/// Validate a local PDF path: it must be a readable file whose header
/// contains the `%PDF` marker.
pub fn resolve_local(path_str: &str) -> Result<PathBuf, PdfColorError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(PdfColorError::FileNotFound { path });
    }

    let mut file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(PdfColorError::PermissionDenied { path });
        }
        Err(_) => return Err(PdfColorError::FileNotFound { path }),
    };

    let mut head = Vec::with_capacity(HEADER_SEARCH_LEN);
    if let Err(e) = file
        .by_ref()
        .take(HEADER_SEARCH_LEN as u64)
        .read_to_end(&mut head)
    {
        return Err(if e.kind() == ErrorKind::PermissionDenied {
            PdfColorError::PermissionDenied { path }
        } else {
            PdfColorError::CorruptPdf {
                path,
                detail: e.to_string(),
            }
        });
    }

    if !head.windows(4).any(|w| w == b"%PDF") {
        let magic = head.iter().take(4).copied().collect();
        return Err(PdfColorError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
