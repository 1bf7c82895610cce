//! The image selection buffer: the ordered list of images staged for
//! conversion before a PDF is produced.

use std::path::Path;

use image::RgbaImage;
use tracing::warn;

/// Ordered staging area for images awaiting conversion.
#[derive(Default)]
pub struct SelectionBuffer {
    images: Vec<RgbaImage>,
}

impl SelectionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append already-decoded images, preserving their order.
    pub fn push_images(&mut self, images: impl IntoIterator<Item = RgbaImage>) {
        self.images.extend(images);
    }

    /// Decode an image file and append it. Undecodable files are skipped
    /// with a warning rather than failing the whole selection.
    pub fn push_file(&mut self, path: &Path) {
        match image::open(path) {
            Ok(img) => self.images.push(img.to_rgba8()),
            Err(e) => warn!("Skipping {}: {e}", path.display()),
        }
    }

    /// Remove the staged image at `index`. Out-of-range is a no-op.
    pub fn remove(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    /// Drop all staged images.
    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The staged images, in staging order.
    pub fn images(&self) -> &[RgbaImage] {
        &self.images
    }
}

impl std::fmt::Debug for SelectionBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionBuffer")
            .field("staged", &self.images.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn img(w: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, 10, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_push_preserves_order() {
        let mut buffer = SelectionBuffer::new();
        buffer.push_images([img(1), img(2), img(3)]);

        let widths: Vec<u32> = buffer.images().iter().map(image::RgbaImage::width).collect();
        assert_eq!(widths, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut buffer = SelectionBuffer::new();
        buffer.push_images([img(1)]);
        buffer.remove(5);
        assert_eq!(buffer.len(), 1);

        buffer.remove(0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_push_file_decodes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.png");
        img(8).save(&path).unwrap();

        let mut buffer = SelectionBuffer::new();
        buffer.push_file(&path);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.images()[0].width(), 8);
    }

    #[test]
    fn test_push_file_skips_undecodable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let mut buffer = SelectionBuffer::new();
        buffer.push_file(&path);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = SelectionBuffer::new();
        buffer.push_images([img(1), img(2)]);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
