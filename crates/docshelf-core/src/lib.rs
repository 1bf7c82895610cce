//! docshelf Core Library
//!
//! This library provides the core functionality for an image-to-PDF
//! document shelf:
//! - PDF assembly from ordered image lists (one page per image)
//! - A file-backed document catalog reconstructed by directory scans
//! - Structural edits by full rebuild (page deletion) and object-level
//!   copy (two-document merge)
//! - First-page thumbnails

pub mod catalog;
pub mod config;
pub mod error;
pub mod pdf;
pub mod selection;
pub mod settings;
pub mod store;
pub mod util;

pub use catalog::{Catalog, Document};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use pdf::{PageRenderer, PdfDocument, assemble, merge_documents, thumbnail_png};
pub use selection::SelectionBuffer;
pub use settings::Settings;
pub use store::{DocumentStore, MergeSession, StoreEvent};
