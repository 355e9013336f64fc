//! UBL 2.1 document generation.
//!
//! Produces the SUNAT profile of UBL 2.1 (`Invoice`, `CreditNote`,
//! `DebitNote`) with an empty `ext:ExtensionContent` placeholder that the
//! signer later fills.
//!
//! # Example
//!
//! ```no_run
//! use comprobante::core::*;
//! use comprobante::ubl;
//!
//! let invoice: Invoice = todo!(); // produced by validate_invoice
//! let xml = ubl::to_ubl_xml(&invoice).unwrap();
//! ```

mod document;
pub(crate) mod xml_utils;

pub use document::to_ubl_xml;
pub use xml_utils::{format_amount, format_decimal};

/// UBL version declared in `cbc:UBLVersionID`.
pub const UBL_VERSION_ID: &str = "2.1";

/// SUNAT customization declared in `cbc:CustomizationID`.
pub const CUSTOMIZATION_ID: &str = "2.0";

/// Catalog 51 operation type for domestic sales.
pub const OPERATION_TYPE: &str = "0101";

/// Id of the `ds:Signature` element, referenced from `cac:Signature`.
pub const SIGNATURE_ID: &str = "SignatureSP";

/// UBL 2.1 namespace URIs.
pub mod ubl_ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
    pub const DEBIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:DebitNote-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
}

/// Check whether `name` is the local name of a supported document root.
pub fn is_document_root(name: &str) -> bool {
    matches!(name, "Invoice" | "CreditNote" | "DebitNote")
}
