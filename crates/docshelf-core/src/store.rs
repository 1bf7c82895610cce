//! High-level document store combining the catalog, the assembly engine,
//! the page editor, merging, and thumbnails.
//!
//! All mutation paths follow the same discipline: the replacement file is
//! fully written (write to a `.tmp` sibling, then rename) before any
//! catalog record points at it, and a superseded file is removed only
//! after its replacement exists. CPU-bound raster and assembly work runs
//! on the blocking pool; the catalog itself is only touched by the owner
//! of this store.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tokio::sync::broadcast;
use tokio::task;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{Catalog, Document};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::pdf::{PageIndex, PageRenderer, PdfDocument, assemble, merge_documents, thumbnail_png};
use crate::selection::SelectionBuffer;
use crate::util::fresh_pdf_path;

/// Typed change notification emitted after every successful mutation.
///
/// Other catalog views subscribe and call `refresh` on receipt instead of
/// listening on an implicit global channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    DocumentsChanged,
}

/// State of the two-document merge selection protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeSession {
    /// No merge in progress
    #[default]
    Idle,
    /// A pivot has been chosen; awaiting one more distinct selection
    AwaitingSecond(Uuid),
}

/// The document store facade.
pub struct DocumentStore {
    config: AppConfig,
    storage_dir: PathBuf,
    catalog: Catalog,
    merge_session: MergeSession,
    events: broadcast::Sender<StoreEvent>,
}

impl DocumentStore {
    /// Open a store over the configured storage directory, creating the
    /// directory if needed, and load the catalog from disk.
    pub fn open(config: AppConfig) -> Result<Self> {
        let storage_dir = config.storage_dir();
        std::fs::create_dir_all(&storage_dir)?;

        let mut catalog = Catalog::new(&storage_dir);
        catalog.refresh()?;

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            config,
            storage_dir,
            catalog,
            merge_session: MergeSession::Idle,
            events,
        })
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Documents sorted newest first.
    pub fn list(&self) -> &[Document] {
        self.catalog.list()
    }

    /// Re-scan the storage directory. Idempotent; never mutates disk.
    pub fn refresh(&mut self) -> Result<()> {
        self.catalog.refresh()
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Resolve a display name, file name, or path to a document id.
    pub fn resolve(&self, key: &str) -> Result<Uuid> {
        self.catalog
            .resolve(key)
            .ok_or_else(|| Error::UnknownDocument(key.to_string()))
    }

    // ==========================================================================
    // Conversion
    // ==========================================================================

    /// Convert the staged images into a new stored PDF.
    ///
    /// One page per image, in staging order, each page sized to its
    /// image's pixel dimensions. The buffer is cleared only on success.
    pub async fn convert(&mut self, buffer: &mut SelectionBuffer) -> Result<Uuid> {
        if buffer.is_empty() {
            return Err(Error::NoImagesStaged);
        }

        let images = buffer.images().to_vec();
        let (bytes, images) = task::spawn_blocking(move || {
            let bytes = assemble(&images)?;
            Ok::<_, Error>((bytes, images))
        })
        .await
        .map_err(join_error)??;

        let path = fresh_pdf_path(&self.storage_dir, "document");
        write_atomic(&bytes, &path).await?;
        info!("Converted {} images to {}", images.len(), path.display());

        let document = Document::synthesized(Document::conversion_label(), path, images);
        let id = document.id;
        self.catalog.insert_front(document);
        buffer.clear();
        self.emit();

        Ok(id)
    }

    // ==========================================================================
    // Deletion
    // ==========================================================================

    /// Delete a stored document and its backing file.
    ///
    /// If the file was already removed externally the error is surfaced
    /// and the record is left in place; the next `refresh` purges it.
    pub async fn delete_document(&mut self, id: Uuid) -> Result<()> {
        let doc = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::UnknownDocument(id.to_string()))?;
        let path = doc.path.clone();

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::FileNotFound(path));
        }

        tokio::fs::remove_file(&path).await?;
        self.catalog.remove(id);
        info!("Deleted {}", path.display());
        self.emit();

        Ok(())
    }

    // ==========================================================================
    // Page editing
    // ==========================================================================

    /// Remove one page from a stored document by full rebuild.
    ///
    /// Every page is rasterized at native resolution, the page at `index`
    /// is dropped, and the remainder is re-assembled into a fresh file.
    /// The catalog record keeps its identity but moves to the new file;
    /// the old file is deleted last. A failure during the rebuild leaves
    /// the old file and the catalog untouched.
    pub async fn delete_page(&mut self, id: Uuid, index: usize) -> Result<()> {
        let doc = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::UnknownDocument(id.to_string()))?;
        let old_path = doc.path.clone();

        if !tokio::fs::try_exists(&old_path).await.unwrap_or(false) {
            return Err(Error::FileNotFound(old_path));
        }

        let bytes = tokio::fs::read(&old_path).await?;
        let render_scale = self.config.render_scale;

        let (new_bytes, remaining) = task::spawn_blocking(move || {
            let pdf = PdfDocument::from_bytes(bytes)?;
            if pdf.page_count() <= 1 {
                return Err(Error::LastPage);
            }
            PageIndex::try_from_page_num(index, pdf.page_count())?;

            let renderer = PageRenderer::with_scale(&pdf, render_scale);
            let mut pages = renderer.render_all_pages()?;
            pages.remove(index);

            let bytes = assemble(&pages)?;
            Ok::<(Vec<u8>, Vec<RgbaImage>), Error>((bytes, pages))
        })
        .await
        .map_err(join_error)??;

        let new_path = fresh_pdf_path(&self.storage_dir, "document");
        write_atomic(&new_bytes, &new_path).await?;

        // New file confirmed on disk; now repoint the record and drop the
        // superseded file.
        if let Some(doc) = self.catalog.get_mut(id) {
            doc.path = new_path.clone();
            doc.created_at = chrono::Local::now();
            doc.pages = remaining;
            doc.thumbnail = None;
        }

        tokio::fs::remove_file(&old_path).await?;
        info!(
            "Deleted page {index} of {} -> {}",
            old_path.display(),
            new_path.display()
        );
        self.emit();

        Ok(())
    }

    // ==========================================================================
    // Merging
    // ==========================================================================

    /// Current state of the merge selection protocol.
    pub const fn merge_session(&self) -> MergeSession {
        self.merge_session
    }

    /// Enter merge mode with `pivot` as the first document.
    pub fn start_merge(&mut self, pivot: Uuid) -> Result<()> {
        if self.catalog.get(pivot).is_none() {
            return Err(Error::UnknownDocument(pivot.to_string()));
        }
        self.merge_session = MergeSession::AwaitingSecond(pivot);
        debug!("Merge mode entered, pivot {pivot}");
        Ok(())
    }

    /// Leave merge mode without merging.
    pub fn cancel_merge(&mut self) {
        self.merge_session = MergeSession::Idle;
    }

    /// Select the second document and execute the merge.
    ///
    /// Selecting the pivot again is rejected and merge mode stays active,
    /// awaiting a valid second choice. A distinct selection runs the merge
    /// immediately; merge mode exits whether or not the merge succeeds.
    /// Both source documents and files are left untouched.
    pub async fn select_second(&mut self, id: Uuid) -> Result<Uuid> {
        let MergeSession::AwaitingSecond(pivot) = self.merge_session else {
            return Err(Error::MergeNotActive);
        };

        if id == pivot {
            return Err(Error::DuplicateMergeSelection);
        }

        // Two distinct documents chosen: the selection set clears now,
        // regardless of how the merge itself goes.
        self.merge_session = MergeSession::Idle;
        self.merge(pivot, id).await
    }

    async fn merge(&mut self, first: Uuid, second: Uuid) -> Result<Uuid> {
        let first_path = self.existing_path(first)?.to_path_buf();
        let second_path = self.existing_path(second)?.to_path_buf();

        let first_bytes = tokio::fs::read(&first_path).await?;
        let second_bytes = tokio::fs::read(&second_path).await?;

        let merged = task::spawn_blocking(move || merge_documents(&first_bytes, &second_bytes))
            .await
            .map_err(join_error)??;

        let path = fresh_pdf_path(&self.storage_dir, "merged");
        write_atomic(&merged, &path).await?;
        info!(
            "Merged {} + {} -> {}",
            first_path.display(),
            second_path.display(),
            path.display()
        );

        let document = Document::synthesized(Document::merge_label(), path, Vec::new());
        let id = document.id;
        self.catalog.insert_front(document);
        self.emit();

        Ok(id)
    }

    // ==========================================================================
    // Viewing, export, thumbnails
    // ==========================================================================

    /// Existence-checked path handout for the reader / share surface.
    pub fn document_path(&self, id: Uuid) -> Result<&Path> {
        self.existing_path(id)
    }

    /// Copy a document's backing file to `dest`.
    pub async fn export(&self, id: Uuid, dest: &Path) -> Result<()> {
        let path = self.existing_path(id)?.to_path_buf();
        tokio::fs::copy(&path, dest).await?;
        info!("Exported {} to {}", path.display(), dest.display());
        Ok(())
    }

    /// Lazily compute and cache the document's thumbnail.
    ///
    /// Returns `None` when the preview cannot be produced; that is never
    /// an error.
    pub fn thumbnail(&mut self, id: Uuid) -> Option<&[u8]> {
        let scale = self.config.thumbnail_scale;
        let doc = self.catalog.get_mut(id)?;

        if doc.thumbnail.is_none() {
            doc.thumbnail = thumbnail_png(&doc.path, scale);
        }
        doc.thumbnail.as_deref()
    }

    fn existing_path(&self, id: Uuid) -> Result<&Path> {
        let doc = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::UnknownDocument(id.to_string()))?;
        if !doc.path.exists() {
            return Err(Error::FileNotFound(doc.path.clone()));
        }
        Ok(&doc.path)
    }

    fn emit(&self) {
        // A send error only means nobody is subscribed right now
        let _ = self.events.send(StoreEvent::DocumentsChanged);
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("storage_dir", &self.storage_dir)
            .field("documents", &self.catalog.list().len())
            .field("merge_session", &self.merge_session)
            .finish()
    }
}

/// Write `bytes` to `path` atomically: full write to a `.tmp` sibling,
/// then rename. No partial file is ever visible under the final name.
async fn write_atomic(bytes: &[u8], path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("tmp");

    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        // Best effort: don't leave a stray partial file behind
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Error::PdfSave(format!(
            "Failed to write {}: {e}",
            tmp_path.display()
        )));
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::PdfSave(format!("Failed to move {} into place: {e}", path.display())))
}

fn join_error(e: task::JoinError) -> Error {
    Error::Io(std::io::Error::other(format!("background task failed: {e}")))
}
