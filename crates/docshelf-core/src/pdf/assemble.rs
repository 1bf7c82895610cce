//! PDF assembly from raster images.
//!
//! Builds a document with one page per input image, in input order. Each
//! page's MediaBox equals the image's pixel dimensions (one PDF point per
//! pixel, no scaling, no margins) and the page content is a single image
//! XObject drawn to fill the full page rectangle.

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::{Error, Result};

/// Assemble an ordered list of images into a single PDF byte stream.
///
/// Fails with `NoImagesStaged` on empty input; nothing is written anywhere.
pub fn assemble(images: &[RgbaImage]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(Error::NoImagesStaged);
    }

    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let mut page_ids: Vec<Object> = Vec::with_capacity(images.len());

    for image in images {
        let (width, height) = image.dimensions();

        // Source images may carry transparency; pages are opaque, so
        // composite onto white before embedding as DeviceRGB.
        let rgb = flatten_onto_white(image);

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb,
        ));

        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        });

        // Scale the unit image square up to the page rectangle.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        i64::from(width).into(),
                        0.into(),
                        0.into(),
                        i64::from(height).into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| Error::PdfAssemble(format!("Failed to encode page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => page_tree_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                i64::from(width).into(),
                i64::from(height).into(),
            ],
        });
        page_ids.push(page_id.into());
    }

    #[allow(clippy::cast_possible_wrap)]
    let page_count = page_ids.len() as i64;
    let page_tree = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids,
        "Count" => page_count,
    };
    doc.objects
        .insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => page_tree_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::PdfSave(format!("Failed to save assembled PDF: {e}")))?;

    Ok(output)
}

/// Composite an RGBA image over an opaque white background, returning
/// raw interleaved RGB samples.
fn flatten_onto_white(image: &RgbaImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    // Multiply as usize; the pixel count alone can overflow u32
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);

    for pixel in image.pixels() {
        let a = u16::from(pixel[3]);
        for channel in 0..3 {
            let c = u16::from(pixel[channel]);
            let blended = (c * a + 255 * (255 - a)) / 255;
            #[allow(clippy::cast_possible_truncation)]
            rgb.push(blended as u8);
        }
    }

    rgb
}
