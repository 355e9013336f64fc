//! Receipt (CDR, constancia de recepción) parsing and storage.
//!
//! A receipt is an `ApplicationResponse` document zipped as `R-{name}.zip`.
//! Its `cbc:ResponseCode` decides the fate of the submitted document.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use serde::Serialize;
use thiserror::Error;

use crate::package::{self, DocumentName, PackageError};
use crate::ubl::ubl_ns;

/// Directory, relative to the storage root, that holds receipts.
pub const RECEIPT_DIR: &str = "cdr";

/// Errors raised while reading or storing receipts.
///
/// These never change the outcome of an accepted submission; callers log and
/// record them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReceiptError {
    #[error("receipt archive: {0}")]
    Archive(#[from] PackageError),

    #[error("receipt XML: {0}")]
    Xml(String),

    #[error("receipt has no ResponseCode")]
    MissingResponseCode,

    #[error("cannot store receipt: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of a receipt `ResponseCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Accepted,
    AcceptedWithObservations,
    Rejected,
    Exception,
    Unknown,
}

impl ReceiptStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim().parse::<u32>() {
            Ok(0) => ReceiptStatus::Accepted,
            Ok(4000..) => ReceiptStatus::AcceptedWithObservations,
            Ok(2000..=3999) => ReceiptStatus::Rejected,
            Ok(100..=1999) => ReceiptStatus::Exception,
            _ => ReceiptStatus::Unknown,
        }
    }

    /// Whether the authority rejected the document.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ReceiptStatus::Rejected | ReceiptStatus::Exception)
    }
}

/// Parsed receipt content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub id: Option<String>,
    pub response_code: String,
    pub description: Option<String>,
    pub response_date: Option<String>,
    pub response_time: Option<String>,
    pub referenced_document: Option<String>,
    pub notes: Vec<String>,
}

impl Receipt {
    pub fn status(&self) -> ReceiptStatus {
        ReceiptStatus::from_code(&self.response_code)
    }
}

/// Extract and parse the receipt XML for `name` from a receipt archive.
///
/// Looks for `R-{name}.xml` first and falls back to the archive's single
/// entry.
pub fn process_receipt(archive: &[u8], name: &DocumentName) -> Result<Receipt, ReceiptError> {
    let xml = receipt_xml(archive, name)?;
    let xml = String::from_utf8(xml)
        .map_err(|_| PackageError::NotUtf8(name.receipt_xml_name()))?;
    parse_receipt(&xml)
}

fn receipt_xml(archive: &[u8], name: &DocumentName) -> Result<Vec<u8>, ReceiptError> {
    match package::extract_entry(archive, &name.receipt_xml_name()) {
        Ok(xml) => Ok(xml),
        Err(PackageError::MissingEntry(_)) => {
            let (entry, xml) = package::extract_single(archive)?;
            tracing::debug!(entry = %entry, "receipt entry found by fallback");
            Ok(xml)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    ResponseCode,
    Description,
    ResponseDate,
    ResponseTime,
    ReferenceId,
    Note,
}

/// Parse an `ApplicationResponse` document.
pub fn parse_receipt(xml: &str) -> Result<Receipt, ReceiptError> {
    let mut reader = NsReader::from_str(xml);
    let mut receipt = Receipt {
        id: None,
        response_code: String::new(),
        description: None,
        response_date: None,
        response_time: None,
        referenced_document: None,
        notes: Vec::new(),
    };
    // Local names of the open elements in the cac namespace, innermost last.
    let mut aggregates: Vec<Vec<u8>> = Vec::new();
    let mut depth = 0usize;
    let mut field: Option<(Field, String)> = None;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| ReceiptError::Xml(e.to_string()))?;
        match event {
            Event::Start(ref e) => {
                depth += 1;
                let local = e.local_name().as_ref().to_vec();
                if is_bound(&ns, ubl_ns::CAC) {
                    aggregates.push(local);
                } else if is_bound(&ns, ubl_ns::CBC) {
                    let parent = aggregates.last().map(Vec::as_slice);
                    field = select(&receipt, depth, parent, &local).map(|f| (f, String::new()));
                }
            }
            Event::Text(ref t) => {
                if let Some((_, text)) = field.as_mut() {
                    let raw = t.unescape().map_err(|e| ReceiptError::Xml(e.to_string()))?;
                    text.push_str(&raw);
                }
            }
            Event::CData(ref c) => {
                if let Some((_, text)) = field.as_mut() {
                    text.push_str(&String::from_utf8_lossy(c));
                }
            }
            Event::End(_) => {
                if let Some((kind, text)) = field.take() {
                    store(&mut receipt, kind, text.trim().to_string());
                } else if is_bound(&ns, ubl_ns::CAC) {
                    aggregates.pop();
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if receipt.response_code.is_empty() {
        return Err(ReceiptError::MissingResponseCode);
    }
    Ok(receipt)
}

fn is_bound(ns: &ResolveResult<'_>, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(bound) if bound.as_ref() == uri.as_bytes())
}

fn select(receipt: &Receipt, depth: usize, parent: Option<&[u8]>, local: &[u8]) -> Option<Field> {
    match (parent, local) {
        (None, b"ID") if depth == 2 && receipt.id.is_none() => Some(Field::Id),
        (None, b"ResponseDate") => Some(Field::ResponseDate),
        (None, b"ResponseTime") => Some(Field::ResponseTime),
        (None, b"Note") => Some(Field::Note),
        (Some(b"Response"), b"ResponseCode") if receipt.response_code.is_empty() => {
            Some(Field::ResponseCode)
        }
        (Some(b"Response"), b"Description") if receipt.description.is_none() => {
            Some(Field::Description)
        }
        (Some(b"Response"), b"ReferenceID") if receipt.referenced_document.is_none() => {
            Some(Field::ReferenceId)
        }
        (Some(b"DocumentReference"), b"ID") => Some(Field::ReferenceId),
        _ => None,
    }
}

fn store(receipt: &mut Receipt, field: Field, text: String) {
    match field {
        Field::Id => receipt.id = Some(text),
        Field::ResponseCode => receipt.response_code = text,
        Field::Description => receipt.description = Some(text),
        Field::ResponseDate => receipt.response_date = Some(text),
        Field::ResponseTime => receipt.response_time = Some(text),
        Field::ReferenceId => receipt.referenced_document = Some(text),
        Field::Note if !text.is_empty() => receipt.notes.push(text),
        Field::Note => {}
    }
}

/// Paths of a stored receipt, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredReceipt {
    pub zip_path: String,
    pub xml_path: Option<String>,
}

/// Filesystem store for receipt archives under `{root}/cdr`.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    root: PathBuf,
}

impl ReceiptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `R-{name}.zip` and, when it can be extracted, `R-{name}.xml`.
    pub fn save(&self, archive: &[u8], name: &DocumentName) -> Result<StoredReceipt, ReceiptError> {
        let dir = self.root.join(RECEIPT_DIR);
        fs::create_dir_all(&dir)?;

        let zip_name = name.receipt_zip_name();
        fs::write(dir.join(&zip_name), archive)?;

        let xml_path = match receipt_xml(archive, name) {
            Ok(xml) => {
                let xml_name = name.receipt_xml_name();
                fs::write(dir.join(&xml_name), xml)?;
                Some(format!("{RECEIPT_DIR}/{xml_name}"))
            }
            Err(e) => {
                tracing::warn!(document = %name, error = %e, "receipt XML not extracted");
                None
            }
        };

        Ok(StoredReceipt {
            zip_path: format!("{RECEIPT_DIR}/{zip_name}"),
            xml_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_codes() {
        assert_eq!(ReceiptStatus::from_code("0"), ReceiptStatus::Accepted);
        assert_eq!(
            ReceiptStatus::from_code("4252"),
            ReceiptStatus::AcceptedWithObservations
        );
        assert_eq!(ReceiptStatus::from_code("2800"), ReceiptStatus::Rejected);
        assert_eq!(ReceiptStatus::from_code("3999"), ReceiptStatus::Rejected);
        assert_eq!(ReceiptStatus::from_code("1033"), ReceiptStatus::Exception);
        assert_eq!(ReceiptStatus::from_code("99"), ReceiptStatus::Unknown);
        assert_eq!(ReceiptStatus::from_code("abc"), ReceiptStatus::Unknown);
        assert!(ReceiptStatus::Exception.is_rejection());
        assert!(!ReceiptStatus::AcceptedWithObservations.is_rejection());
    }

    #[test]
    fn missing_response_code() {
        let xml = format!(
            "<ApplicationResponse xmlns:cbc=\"{}\"><cbc:ID>1</cbc:ID></ApplicationResponse>",
            ubl_ns::CBC
        );
        assert!(matches!(
            parse_receipt(&xml),
            Err(ReceiptError::MissingResponseCode)
        ));
    }
}
