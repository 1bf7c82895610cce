use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for docshelf-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - PDF operations (opening, rendering, assembling, saving)
/// - Catalog and file operations (scanning, deleting, exporting)
/// - Merge selection protocol
/// - Configuration operations (loading, validation)
/// - General I/O operations
///
/// Every variant is recoverable: operations report failure to the caller
/// and leave prior on-disk and in-memory state intact.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to render a PDF page
    #[error("failed to render page {page}: {reason}")]
    PdfRender { page: usize, reason: String },

    /// Failed to assemble a PDF from images
    #[error("failed to assemble PDF: {0}")]
    PdfAssemble(String),

    /// Failed to save a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Catalog & Store Errors
    // ==========================================================================
    /// A document's backing file does not exist on disk
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No such document in the catalog
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    /// Conversion requested with no staged images
    #[error("no images staged for conversion")]
    NoImagesStaged,

    /// Page deletion would remove the only page of a document
    #[error("cannot delete the last page of a document")]
    LastPage,

    // ==========================================================================
    // Merge Selection Errors
    // ==========================================================================
    /// The same document was chosen twice for a merge
    #[error("document is already selected for merging")]
    DuplicateMergeSelection,

    /// A merge selection was made while no merge is in progress
    #[error("no merge in progress")]
    MergeNotActive,

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
