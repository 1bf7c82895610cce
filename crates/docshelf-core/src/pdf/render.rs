//! Page rasterization.
//!
//! Two consumers: the page editor, which rasterizes every page at native
//! resolution before rebuilding a document, and the thumbnail generator,
//! which renders page 0 at a small fractional scale. Both composite onto
//! an opaque white background since PDF pages may have transparent regions.

use std::path::Path;

use image::{ImageEncoder, RgbaImage};
use mupdf::{Colorspace, Matrix};
use tracing::warn;

use super::document::PdfDocument;
use super::page_index::PageIndex;
use crate::error::{Error, Result};

/// Page renderer for PDF documents
pub struct PageRenderer<'a> {
    /// The PDF document to render
    pub doc: &'a PdfDocument,
    /// Scale factor for rendering (1.0 = one pixel per PDF point)
    pub scale: f32,
}

impl<'a> PageRenderer<'a> {
    /// Create a renderer with the given scale
    pub const fn with_scale(doc: &'a PdfDocument, scale: f32) -> Self {
        Self { doc, scale }
    }

    /// Render a page to an RGBA image buffer, composited on white.
    pub fn render_page(&self, page_num: usize) -> Result<RgbaImage> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;

        let doc = self.doc.open_document()?;
        let page = doc
            .load_page(page_index.into())
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to load page: {e}"),
            })?;

        let matrix = Matrix::new_scale(self.scale, self.scale);

        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to render: {e}"),
            })?;

        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        // mupdf may hand back RGB, RGBA, or grayscale samples
        let n = pixmap.n() as usize; // components per pixel
        // Multiply as usize; the pixel count alone can overflow u32
        let mut rgba_pixels = Vec::with_capacity(img_width as usize * img_height as usize * 4);

        for chunk in pixels.chunks(n) {
            match n {
                3 => {
                    // RGB, already opaque
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[1]);
                    rgba_pixels.push(chunk[2]);
                    rgba_pixels.push(255);
                }
                4 => {
                    // RGBA: composite over white so transparency never
                    // leaks into rebuilt pages or thumbnails
                    let a = u16::from(chunk[3]);
                    for &c in &chunk[..3] {
                        let blended = (u16::from(c) * a + 255 * (255 - a)) / 255;
                        #[allow(clippy::cast_possible_truncation)]
                        rgba_pixels.push(blended as u8);
                    }
                    rgba_pixels.push(255);
                }
                1 => {
                    // Grayscale -> RGBA
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(255);
                }
                _ => {
                    return Err(Error::PdfRender {
                        page: page_num,
                        reason: format!("Unexpected pixel format with {n} components"),
                    });
                }
            }
        }

        RgbaImage::from_raw(img_width, img_height, rgba_pixels).ok_or_else(|| Error::PdfRender {
            page: page_num,
            reason: "Failed to create image buffer".to_string(),
        })
    }

    /// Rasterize every page, in page order.
    pub fn render_all_pages(&self) -> Result<Vec<RgbaImage>> {
        let mut pages = Vec::with_capacity(self.doc.page_count());
        for page_num in 0..self.doc.page_count() {
            pages.push(self.render_page(page_num)?);
        }
        Ok(pages)
    }

    /// Render a page to PNG bytes
    pub fn render_page_png(&self, page_num: usize) -> Result<Vec<u8>> {
        let img = self.render_page(page_num)?;

        let mut png_data = Vec::new();
        // Fast compression, still lossless
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut png_data,
            image::codecs::png::CompressionType::Fast,
            image::codecs::png::FilterType::Adaptive,
        );

        encoder
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to encode PNG: {e}"),
            })?;

        Ok(png_data)
    }
}

/// Generate a PNG thumbnail of a document's first page.
///
/// `scale` is a fraction of the page's native size. Returns `None` when
/// the file cannot be opened or has no pages; a missing preview is never
/// an error.
pub fn thumbnail_png(path: &Path, scale: f32) -> Option<Vec<u8>> {
    let doc = match PdfDocument::from_file(path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Skipping thumbnail for {}: {e}", path.display());
            return None;
        }
    };

    if doc.page_count() == 0 {
        return None;
    }

    let renderer = PageRenderer::with_scale(&doc, scale);
    match renderer.render_page_png(0) {
        Ok(png) => Some(png),
        Err(e) => {
            warn!("Failed to render thumbnail for {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::assemble::assemble;
    use image::Rgba;
    use tempfile::TempDir;

    fn two_page_doc() -> PdfDocument {
        let images = vec![
            RgbaImage::from_pixel(100, 200, Rgba([200, 10, 10, 255])),
            RgbaImage::from_pixel(60, 80, Rgba([10, 200, 10, 255])),
        ];
        let bytes = assemble(&images).unwrap();
        PdfDocument::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_render_native_size_matches_page() {
        let doc = two_page_doc();
        let renderer = PageRenderer::with_scale(&doc, 1.0);

        let page = renderer.render_page(0).unwrap();
        assert_eq!((page.width(), page.height()), (100, 200));

        let page = renderer.render_page(1).unwrap();
        assert_eq!((page.width(), page.height()), (60, 80));
    }

    #[test]
    fn test_render_all_pages_in_order() {
        let doc = two_page_doc();
        let renderer = PageRenderer::with_scale(&doc, 1.0);

        let pages = renderer.render_all_pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].width(), 100);
        assert_eq!(pages[1].width(), 60);
    }

    #[test]
    fn test_render_invalid_page() {
        let doc = two_page_doc();
        let renderer = PageRenderer::with_scale(&doc, 1.0);
        assert!(renderer.render_page(5).is_err());
    }

    #[test]
    fn test_render_page_png_magic() {
        let doc = two_page_doc();
        let renderer = PageRenderer::with_scale(&doc, 1.0);

        let png = renderer.render_page_png(0).unwrap();
        assert!(png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[test]
    fn test_thumbnail_scaled_down() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        let doc = two_page_doc();
        std::fs::write(&path, doc.bytes()).unwrap();

        let png = thumbnail_png(&path, 0.1).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (10, 20));
    }

    #[test]
    fn test_thumbnail_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(thumbnail_png(&dir.path().join("missing.pdf"), 0.1).is_none());
    }
}
