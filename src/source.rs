//! CSV-backed product draft source.
//!
//! Uses the `csv` crate so embedded commas and newlines inside quoted fields
//! are handled correctly. Columns map to draft fields by header name:
//! `name.<locale>` and `slug.<locale>` feed the localized name and slug,
//! `productType` sets the type reference, and every other non-empty column
//! becomes a master-variant attribute.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::catalog::entities::{AttributeDraft, ProductDraft, ProductVariantDraft};
use crate::error::AppError;

/// Header prefix for localized name columns.
const NAME_PREFIX: &str = "name.";
/// Header prefix for localized slug columns.
const SLUG_PREFIX: &str = "slug.";
/// Header for the product type reference column.
const PRODUCT_TYPE_COLUMN: &str = "productType";

/// Sequential reader that hands out product drafts in fixed-size chunks,
/// stopping after a configured record cap.
pub struct CsvDraftSource {
    reader: Reader<BufReader<File>>,
    headers: StringRecord,
    remaining: u64,
}

impl CsvDraftSource {
    /// Opens a CSV file for reading, capped at `max_records` data rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CsvInvalid` if the file cannot be opened or has no
    /// header row.
    pub fn open(path: &Path, max_records: u64) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::CsvInvalid(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(BufReader::new(file));

        let headers = reader
            .headers()
            .map_err(|e| AppError::CsvInvalid(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::CsvInvalid(
                "CSV file has no header row".to_string(),
            ));
        }

        Ok(Self {
            reader,
            headers,
            remaining: max_records,
        })
    }

    /// Reads up to `size` drafts. An empty vector means the source is
    /// exhausted or the record cap has been reached.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CsvInvalid` on malformed records.
    pub fn next_chunk(&mut self, size: usize) -> Result<Vec<ProductDraft>, AppError> {
        let mut drafts = Vec::with_capacity(size);

        while drafts.len() < size && self.remaining > 0 {
            let mut record = StringRecord::new();
            let read = self
                .reader
                .read_record(&mut record)
                .map_err(|e| AppError::CsvInvalid(format!("Failed to read CSV record: {}", e)))?;
            if !read {
                break;
            }
            drafts.push(self.map_record(&record));
            self.remaining -= 1;
        }

        Ok(drafts)
    }

    fn map_record(&self, record: &StringRecord) -> ProductDraft {
        let mut draft = ProductDraft::default();
        let mut attributes: Vec<AttributeDraft> = Vec::new();

        for (header, value) in self.headers.iter().zip(record.iter()) {
            if value.is_empty() {
                continue;
            }
            if let Some(locale) = header.strip_prefix(NAME_PREFIX) {
                draft.name.set(locale, value);
            } else if let Some(locale) = header.strip_prefix(SLUG_PREFIX) {
                draft.slug.set(locale, value);
            } else if header == PRODUCT_TYPE_COLUMN {
                draft.product_type = Some(value.to_string());
            } else {
                attributes.push(AttributeDraft::of(header, value.to_string()));
            }
        }

        draft.master_variant = ProductVariantDraft { attributes };
        draft
    }
}
