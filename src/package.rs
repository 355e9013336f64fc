//! File naming and zip packaging of signed documents.
//!
//! SUNAT expects each document as a deflate zip holding exactly one XML
//! entry, both named `{issuerRuc}-{docType}-{series}-{number}`. Receipts come
//! back as `R-{name}.zip` containing `R-{name}.xml`.

use std::fmt;
use std::io::{Cursor, Read, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::{DocumentType, Invoice};

/// Errors raised while writing or reading archives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive entry {0} not found")]
    MissingEntry(String),

    #[error("expected exactly one entry, found {0}")]
    EntryCount(usize),

    #[error("archive entry {0} is not UTF-8")]
    NotUtf8(String),
}

/// Base name shared by a document's XML, zip and receipt files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentName {
    pub issuer_ruc: String,
    pub document_type: DocumentType,
    pub series: String,
    pub number: String,
}

impl DocumentName {
    pub fn new(
        issuer_ruc: impl Into<String>,
        document_type: DocumentType,
        series: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            issuer_ruc: issuer_ruc.into(),
            document_type,
            series: series.into(),
            number: number.into(),
        }
    }

    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self::new(
            invoice.issuer.id.clone(),
            invoice.document_type,
            invoice.series.clone(),
            invoice.number.clone(),
        )
    }

    pub fn xml_name(&self) -> String {
        format!("{self}.xml")
    }

    pub fn zip_name(&self) -> String {
        format!("{self}.zip")
    }

    pub fn receipt_xml_name(&self) -> String {
        format!("R-{self}.xml")
    }

    pub fn receipt_zip_name(&self) -> String {
        format!("R-{self}.zip")
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.issuer_ruc,
            self.document_type.code(),
            self.series,
            self.number
        )
    }
}

/// Zip `xml` into a single-entry deflate archive named `entry_name`.
///
/// Entry timestamps are pinned to the zip epoch so identical input yields
/// identical bytes.
pub fn pack(entry_name: &str, xml: &[u8]) -> Result<Vec<u8>, PackageError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    writer.start_file(entry_name, options)?;
    writer.write_all(xml)?;
    Ok(writer.finish()?.into_inner())
}

/// Read the entry called `name` from `archive`.
pub fn extract_entry(archive: &[u8], name: &str) -> Result<Vec<u8>, PackageError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(PackageError::MissingEntry(name.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut out)?;
    Ok(out)
}

/// Read the only entry of `archive`, returning its name and content.
pub fn extract_single(archive: &[u8]) -> Result<(String, Vec<u8>), PackageError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let names: Vec<String> = zip
        .file_names()
        .filter(|n| !n.ends_with('/'))
        .map(str::to_string)
        .collect();
    let [name] = names.as_slice() else {
        return Err(PackageError::EntryCount(names.len()));
    };
    let mut file = zip.by_name(name)?;
    let mut out = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut out)?;
    Ok((name.clone(), out))
}

/// List the file entries of `archive`.
pub fn entry_names(archive: &[u8]) -> Result<Vec<String>, PackageError> {
    let zip = ZipArchive::new(Cursor::new(archive))?;
    Ok(zip
        .file_names()
        .filter(|n| !n.ends_with('/'))
        .map(str::to_string)
        .collect())
}
