use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use escola_core::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// How a generated file is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Base64 payload inside the JSON response.
    Base64,
    /// Written to the output directory; the response carries its path.
    File,
}

impl Delivery {
    pub fn from_flag(return_base64: bool) -> Self {
        if return_base64 { Self::Base64 } else { Self::File }
    }
}

/// A rendered document, still in memory.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl GeneratedDocument {
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Write the document into `dir` (created when missing) and return the
    /// full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), size = self.bytes.len(), "document written");
        Ok(path)
    }
}

/// Result of a generator: the document plus, for file delivery, where it
/// was written.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub document: GeneratedDocument,
    pub path: Option<PathBuf>,
}
