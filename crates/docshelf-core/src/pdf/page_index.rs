//! Page index newtype for safe conversion from usize to the i32 page
//! indices mupdf takes.

use crate::error::Error;

/// A validated, 0-based page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    /// Validate a usize page number against a document's page count.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::PdfInvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::PdfInvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_page_num() {
        let idx = PageIndex::try_from_page_num(5, 10).unwrap();
        assert_eq!(i32::from(idx), 5);
    }

    #[test]
    fn test_out_of_range() {
        assert!(PageIndex::try_from_page_num(10, 5).is_err());
        assert!(PageIndex::try_from_page_num(0, 0).is_err());
    }
}
