//! Untyped document payload as received from callers.
//!
//! Every scalar may arrive as a JSON string or number; nothing is checked
//! here. [`validate_invoice`](super::validate_invoice) turns a
//! [`RawInvoice`] into an [`Invoice`](super::Invoice).

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A scalar that may be sent either as text or as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(serde_json::Number),
}

impl RawValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s.trim()),
            Self::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInvoice {
    pub document_type: Option<RawValue>,
    pub series: Option<RawValue>,
    pub number: Option<RawValue>,
    pub issue_date: Option<RawValue>,
    pub issue_time: Option<RawValue>,
    pub due_date: Option<RawValue>,
    pub currency: Option<RawValue>,
    pub payment_terms: Option<RawValue>,
    pub gross_taxable: Option<RawValue>,
    pub tax: Option<RawValue>,
    pub tax_inclusive: Option<RawValue>,
    pub payable: Option<RawValue>,
    pub issuer: Option<RawParty>,
    pub customer: Option<RawParty>,
    pub reference: Option<RawReference>,
    pub lines: Option<Vec<RawLine>>,
}

impl RawInvoice {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawParty {
    pub id_type: Option<RawValue>,
    pub id: Option<RawValue>,
    pub legal_name: Option<RawValue>,
    pub address: Option<RawAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAddress {
    pub ubigeo: Option<RawValue>,
    pub line: Option<RawValue>,
    pub district: Option<RawValue>,
    pub province: Option<RawValue>,
    pub department: Option<RawValue>,
    pub country: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawLine {
    pub id: Option<RawValue>,
    pub quantity: Option<RawValue>,
    pub unit_code: Option<RawValue>,
    pub unit_price: Option<RawValue>,
    pub line_total: Option<RawValue>,
    pub tax_amount: Option<RawValue>,
    pub description: Option<RawValue>,
    pub product_code: Option<RawValue>,
    pub classification: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawReference {
    pub document_id: Option<RawValue>,
    pub document_type: Option<RawValue>,
    pub reason_code: Option<RawValue>,
    pub description: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_strings_both_accepted() {
        let raw = RawInvoice::from_json(
            r#"{"series": "F001", "number": 123, "grossTaxable": 156.78, "tax": "28.22"}"#,
        )
        .unwrap();
        assert_eq!(raw.series.unwrap().as_text(), "F001");
        assert_eq!(raw.number.unwrap().as_text(), "123");
        assert_eq!(raw.gross_taxable.unwrap().as_text(), "156.78");
        assert_eq!(raw.tax.unwrap().as_text(), "28.22");
        assert!(raw.lines.is_none());
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(RawValue::from("  F001 ").as_text(), "F001");
    }
}
