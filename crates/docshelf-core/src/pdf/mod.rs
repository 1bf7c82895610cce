pub mod assemble;
mod document;
pub mod merge;
mod page_index;
mod render;

pub use assemble::assemble;
pub use document::PdfDocument;
pub use merge::merge_documents;
pub use page_index::PageIndex;
pub use render::{PageRenderer, thumbnail_png};
