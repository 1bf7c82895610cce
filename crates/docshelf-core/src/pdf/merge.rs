//! Two-document merge.
//!
//! Unlike the page editor, merging never rasterizes: page objects from
//! both sources are copied at the object level into a fresh document,
//! first document's pages followed by the second's, each in its original
//! order. Source bytes are left untouched.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId, dictionary};

use crate::error::{Error, Result};

/// Concatenate the page sequences of two PDFs into a new PDF byte stream.
pub fn merge_documents(first: &[u8], second: &[u8]) -> Result<Vec<u8>> {
    let mut max_id: u32 = 1;
    // Insertion order carries the final page order
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut carried_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut document = Document::with_version("1.5");

    for (i, source_bytes) in [first, second].into_iter().enumerate() {
        let mut doc = Document::load_mem(source_bytes)
            .map_err(|e| Error::Lopdf(format!("Failed to load source {}: {}", i + 1, e)))?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration is page order
        let source_pages = doc.get_pages();
        for &page_id in source_pages.values() {
            if let Ok(page_obj) = doc.get_object(page_id) {
                page_objects.push((page_id, page_obj.clone()));
            }
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    carried_objects.insert(object_id, object);
                }
            }
        }
    }

    for (object_id, object) in carried_objects {
        document.objects.insert(object_id, object);
    }

    // Every id below `max_id` is occupied by a carried object; advance the
    // allocator past them before minting ids for the new page tree.
    document.max_id = max_id;

    let pages_id = document.new_object_id();

    for (obj_id, object) in &page_objects {
        if let Object::Dictionary(dict) = object {
            let mut new_dict = dict.clone();
            new_dict.set("Parent", Object::Reference(pages_id));
            document
                .objects
                .insert(*obj_id, Object::Dictionary(new_dict));
        }
    }

    let kids: Vec<Object> = page_objects
        .iter()
        .map(|&(id, _)| Object::Reference(id))
        .collect();

    #[allow(clippy::cast_possible_wrap)]
    let total_pages = page_objects.len() as i64;

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => total_pages,
    };
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = document.new_object_id();
    let catalog_dict = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    document
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    document.trailer.set("Root", Object::Reference(catalog_id));

    #[allow(clippy::cast_possible_truncation)]
    let new_max_id = document.objects.len() as u32;
    document.max_id = new_max_id;

    document.renumber_objects();
    document.compress();

    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|e| Error::PdfSave(format!("Failed to save merged PDF: {e}")))?;

    Ok(output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::assemble::assemble;
    use image::{Rgba, RgbaImage};

    fn pdf_with_pages(dims: &[(u32, u32)]) -> Vec<u8> {
        let images: Vec<RgbaImage> = dims
            .iter()
            .map(|&(w, h)| RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255])))
            .collect();
        assemble(&images).unwrap()
    }

    fn page_widths(pdf_bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(pdf_bytes).unwrap();
        let pages = doc.get_pages();
        (1..=pages.len() as u32)
            .map(|n| {
                let dict = doc.get_object(pages[&n]).unwrap().as_dict().unwrap();
                let media_box = dict.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_merge_page_counts_add() {
        let a = pdf_with_pages(&[(100, 100), (110, 100)]);
        let b = pdf_with_pages(&[(120, 100), (130, 100), (140, 100)]);

        let merged = merge_documents(&a, &b).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 5);
    }

    #[test]
    fn test_merge_preserves_order_first_then_second() {
        let a = pdf_with_pages(&[(100, 100), (110, 100)]);
        let b = pdf_with_pages(&[(120, 100)]);

        let merged = merge_documents(&a, &b).unwrap();
        assert_eq!(page_widths(&merged), vec![100, 110, 120]);
    }

    /// The object a page's `/Im0` XObject entry points at, dereferenced.
    fn im0_object(doc: &Document, page_num: u32) -> Object {
        let deref = |obj: &Object| -> Object {
            match obj {
                Object::Reference(id) => doc.get_object(*id).unwrap().clone(),
                other => other.clone(),
            }
        };

        let page_id = doc.get_pages()[&page_num];
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = deref(page.get(b"Resources").unwrap());
        let xobjects = deref(resources.as_dict().unwrap().get(b"XObject").unwrap());
        deref(xobjects.as_dict().unwrap().get(b"Im0").unwrap())
    }

    #[test]
    fn test_merge_keeps_page_image_streams_intact() {
        let a = pdf_with_pages(&[(100, 100)]);
        let b = pdf_with_pages(&[(80, 80)]);

        let merged = merge_documents(&a, &b).unwrap();
        let doc = Document::load_mem(&merged).unwrap();

        // The new page tree and catalog must not reuse ids still occupied
        // by carried objects, so each page's image stream must survive.
        for (page_num, width) in [(1, 100), (2, 80)] {
            let Object::Stream(stream) = im0_object(&doc, page_num) else {
                panic!("page {page_num} Im0 is not a stream");
            };
            assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), width);
        }
    }

    #[test]
    fn test_merge_invalid_source_fails() {
        let a = pdf_with_pages(&[(100, 100)]);
        let result = merge_documents(&a, b"not a pdf");
        assert!(result.is_err());
    }

    #[test]
    fn test_merged_output_is_valid_pdf() {
        let a = pdf_with_pages(&[(100, 100)]);
        let b = pdf_with_pages(&[(200, 200)]);

        let merged = merge_documents(&a, &b).unwrap();
        assert!(merged.starts_with(b"%PDF"));
    }
}
