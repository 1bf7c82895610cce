//! The document catalog: an in-memory view of the stored PDF directory.
//!
//! The filesystem is the source of truth. There is no manifest or index
//! file; every record is reconstructed from filesystem attributes (the
//! file's creation timestamp) and the filename itself. `refresh` replaces
//! the whole in-memory list and never mutates disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::RgbaImage;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// In-memory record of a stored PDF document.
#[derive(Clone)]
pub struct Document {
    /// Stable identity token; equality compares only this.
    pub id: Uuid,
    /// Display label
    pub name: String,
    /// Creation timestamp ("now" for synthesized records, the file's
    /// creation time for records reconstructed by a directory scan)
    pub created_at: DateTime<Local>,
    /// Backing file on persistent storage
    pub path: PathBuf,
    /// Source rasters used to build the file. Populated only right after
    /// assembly or a page edit; empty for scanned records.
    pub pages: Vec<RgbaImage>,
    /// Lazily computed PNG preview of page 0
    pub thumbnail: Option<Vec<u8>>,
}

impl Document {
    /// Record for a freshly written file.
    pub fn synthesized(name: impl Into<String>, path: PathBuf, pages: Vec<RgbaImage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Local::now(),
            path,
            pages,
            thumbnail: None,
        }
    }

    /// Record reconstructed from a directory scan. Carries no page cache.
    pub fn from_scan(path: PathBuf, created_at: DateTime<Local>) -> Self {
        let name = path
            .file_stem()
            .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().into_owned());

        Self {
            id: Uuid::new_v4(),
            name,
            created_at,
            path,
            pages: Vec::new(),
            thumbnail: None,
        }
    }

    /// Display label for a fresh conversion, e.g. `Document_03 Jan 2026, 14:05`.
    pub fn conversion_label() -> String {
        format!("Document_{}", Local::now().format("%d %b %Y, %H:%M"))
    }

    /// Display label for a merge result.
    pub fn merge_label() -> String {
        format!("Merged_{}", Local::now().format("%d %b %Y, %H:%M"))
    }
}

impl PartialEq for Document {
    /// Two records are the same document iff their identity tokens match.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .field("path", &self.path)
            .field("cached_pages", &self.pages.len())
            .field("has_thumbnail", &self.thumbnail.is_some())
            .finish()
    }
}

/// The in-memory collection of documents backed by one storage directory.
#[derive(Debug)]
pub struct Catalog {
    dir: PathBuf,
    documents: Vec<Document>,
}

impl Catalog {
    /// Create an empty catalog over `dir`. Call `refresh` to populate it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            documents: Vec::new(),
        }
    }

    /// Documents sorted by creation time, newest first.
    ///
    /// Ties are broken by filesystem enumeration order, which is
    /// unspecified; callers must not rely on it.
    pub fn list(&self) -> &[Document] {
        &self.documents
    }

    /// Re-scan the storage directory and replace the in-memory list.
    ///
    /// Files without a `.pdf` extension (case-insensitive) are ignored,
    /// as are files whose creation timestamp cannot be read. Safe to call
    /// repeatedly; never mutates disk.
    pub fn refresh(&mut self) -> Result<()> {
        let mut documents = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();

            let is_pdf = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                continue;
            }

            let created = match entry.metadata().and_then(|m| m.created()) {
                Ok(created) => created,
                Err(e) => {
                    debug!("Skipping {} (no creation time): {e}", path.display());
                    continue;
                }
            };

            documents.push(Document::from_scan(path, DateTime::from(created)));
        }

        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.documents = documents;

        debug!("Catalog refreshed: {} documents", self.documents.len());
        Ok(())
    }

    /// Insert a freshly synthesized record at the front of the list.
    pub fn insert_front(&mut self, document: Document) {
        self.documents.insert(0, document);
    }

    /// Look up a document by id.
    pub fn get(&self, id: Uuid) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Look up a document by id, mutably.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// Remove the record with the given id, if present.
    pub fn remove(&mut self, id: Uuid) {
        self.documents.retain(|d| d.id != id);
    }

    /// Resolve a user-supplied key (display name, file name, or path) to
    /// a document id.
    pub fn resolve(&self, key: &str) -> Option<Uuid> {
        let key_path = Path::new(key);
        self.documents
            .iter()
            .find(|d| {
                d.name == key
                    || d.path == key_path
                    || d.path.file_name().is_some_and(|f| f == key_path.as_os_str())
                    || d.path.file_stem().is_some_and(|s| s == key_path.as_os_str())
            })
            .map(|d| d.id)
    }
}
