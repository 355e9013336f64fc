#![cfg(feature = "core")]

mod common;

use chrono::{NaiveDate, NaiveTime};
use common::*;
use comprobante::core::*;
use rust_decimal_macros::dec;
use serde_json::json;

fn stages(errors: &[ValidationError]) -> Vec<ValidationStage> {
    let mut s: Vec<_> = errors.iter().map(|e| e.stage).collect();
    s.dedup();
    s
}

fn fields(errors: &[ValidationError]) -> Vec<&str> {
    errors.iter().map(|e| e.field.as_str()).collect()
}

// --- Factura ---

#[test]
fn factura_is_validated() {
    let invoice = factura();
    assert_eq!(invoice.document_type, DocumentType::Invoice);
    assert_eq!(invoice.document_id(), "F001-00000123");
    assert_eq!(invoice.number, "00000123");
    assert_eq!(invoice.gross_taxable, dec!(156.78));
    assert_eq!(invoice.tax, dec!(28.22));
    assert_eq!(invoice.payable, dec!(185.00));
    assert_eq!(invoice.issuer.id, ISSUER_RUC);
    assert_eq!(invoice.customer.id, CUSTOMER_RUC);
    assert_eq!(invoice.customer.id_type, IdentityType::Ruc);
    assert_eq!(invoice.currency, Currency::Pen);
    assert_eq!(invoice.issue_time, NaiveTime::from_hms_opt(10, 15, 0).unwrap());
}

#[test]
fn line_tax_defaults_to_igv() {
    let invoice = factura();
    assert_eq!(invoice.lines[0].tax_amount, dec!(18.00));
    assert_eq!(invoice.lines[1].tax_amount, dec!(10.22));
    assert_eq!(invoice.lines[0].id, "1");
    assert_eq!(invoice.lines[1].id, "2");
}

#[test]
fn dates_default_to_now() {
    let mut payload = factura_json();
    payload.as_object_mut().unwrap().remove("issueDate");
    payload.as_object_mut().unwrap().remove("issueTime");
    let invoice = validate_invoice(&raw(payload), now()).unwrap();
    assert_eq!(invoice.issue_date, now().date());
    assert_eq!(invoice.issue_time, now().time());
    assert_eq!(invoice.due_date, invoice.issue_date);
}

#[test]
fn due_date_before_issue_is_rejected() {
    let mut payload = factura_json();
    payload["dueDate"] = json!("2025-02-01");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(fields(&errors), ["dueDate"]);
}

#[test]
fn due_date_is_kept() {
    let mut payload = factura_json();
    payload["dueDate"] = json!("2025-03-31");
    let invoice = validate_invoice(&raw(payload), now()).unwrap();
    assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
}

// --- Boleta ---

#[test]
fn boleta_is_validated() {
    let invoice = boleta();
    assert_eq!(invoice.document_type, DocumentType::Receipt);
    assert_eq!(invoice.document_id(), "B001-00000045");
    assert_eq!(invoice.customer.id_type, IdentityType::Dni);
    assert_eq!(invoice.lines[0].unit_code, "NIU");
}

#[test]
fn boleta_requires_dni_customer() {
    let mut payload = boleta_json();
    payload["customer"]["idType"] = json!("6");
    payload["customer"]["id"] = json!(CUSTOMER_RUC);
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(stages(&errors), [ValidationStage::Semantic]);
    assert!(fields(&errors).contains(&"customer.idType"));
}

#[test]
fn boleta_series_must_start_with_b() {
    let mut payload = boleta_json();
    payload["series"] = json!("F001");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(fields(&errors), ["series"]);
}

#[test]
fn factura_requires_ruc_customer() {
    let mut payload = factura_json();
    payload["customer"] = json!({ "idType": "1", "id": "45678912", "legalName": "JUAN PEREZ" });
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert!(fields(&errors).contains(&"customer.idType"));
}

// --- Stages ---

#[test]
fn structural_errors_are_collected_together() {
    let payload = json!({ "documentType": "01", "series": "f001", "number": "12a" });
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(stages(&errors), [ValidationStage::Structural]);
    let f = fields(&errors);
    for expected in ["series", "number", "currency", "grossTaxable", "issuer", "customer", "lines"] {
        assert!(f.contains(&expected), "missing error for {expected}: {f:?}");
    }
}

#[test]
fn structural_stops_before_semantic() {
    let mut payload = factura_json();
    payload["documentType"] = json!("99");
    payload["lines"] = json!([]);
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(fields(&errors), ["lines"]);
}

#[test]
fn bad_issuer_ruc_is_a_checksum_error() {
    let mut payload = factura_json();
    payload["issuer"]["id"] = json!("20100066604");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    let issuer = errors.iter().find(|e| e.field == "issuer.id").unwrap();
    assert_eq!(issuer.stage, ValidationStage::Checksum);
}

#[test]
fn issuer_address_is_required() {
    let mut payload = factura_json();
    payload["issuer"].as_object_mut().unwrap().remove("address");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(fields(&errors), ["issuer.address"]);
}

#[test]
fn totals_are_reconciled() {
    let mut payload = factura_json();
    payload["tax"] = json!("30.00");
    payload["taxInclusive"] = json!("186.78");
    payload["payable"] = json!("186.78");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(stages(&errors), [ValidationStage::CrossField]);
    assert_eq!(fields(&errors), ["tax"]);
}

#[test]
fn one_cent_tolerance() {
    let mut payload = factura_json();
    payload["tax"] = json!("28.23");
    payload["taxInclusive"] = json!("185.01");
    payload["payable"] = json!("185.01");
    assert!(validate_invoice(&raw(payload), now()).is_ok());
}

#[test]
fn line_total_must_match_quantity_times_price() {
    let mut payload = factura_json();
    payload["lines"][0]["lineTotal"] = json!("90.00");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert!(fields(&errors).contains(&"lines[0].lineTotal"));
}

#[test]
fn three_decimals_rejected() {
    let mut payload = factura_json();
    payload["lines"][1]["unitPrice"] = json!("56.785");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert!(fields(&errors).contains(&"lines[1].unitPrice"));
}

#[test]
fn unknown_unit_code_rejected() {
    let mut payload = factura_json();
    payload["lines"][0]["unitCode"] = json!("XYZ");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(fields(&errors), ["lines[0].unitCode"]);
}

// --- Range and character set ---

const DECIMAL_MAX: &str = "79228162514264337593543950335";

#[test]
fn line_product_out_of_range_is_an_error() {
    let mut payload = factura_json();
    payload["lines"][0]["quantity"] = json!(DECIMAL_MAX);
    payload["lines"][0]["unitPrice"] = json!("2");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(stages(&errors), [ValidationStage::Semantic]);
    assert!(
        errors
            .iter()
            .any(|e| e.field == "lines[0].lineTotal" && e.message.contains("out of range"))
    );
}

#[test]
fn unit_price_with_igv_out_of_range_is_an_error() {
    let mut payload = factura_json();
    payload["lines"][0]["quantity"] = json!("0.001");
    payload["lines"][0]["unitPrice"] = json!(DECIMAL_MAX);
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert!(fields(&errors).contains(&"lines[0].unitPrice"));
}

#[test]
fn line_sum_out_of_range_is_an_error() {
    let big = "50000000000000000000000000000";
    let line = json!({
        "quantity": "1",
        "unitCode": "NIU",
        "unitPrice": big,
        "lineTotal": big,
        "description": "Servidor"
    });
    let mut payload = factura_json();
    payload["lines"] = json!([line.clone(), line]);
    payload["grossTaxable"] = json!("1.00");
    payload["tax"] = json!("0.18");
    payload["taxInclusive"] = json!("1.18");
    payload["payable"] = json!("1.18");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(stages(&errors), [ValidationStage::CrossField]);
    assert_eq!(fields(&errors), ["grossTaxable"]);
    assert!(errors[0].message.contains("out of range"));
}

#[test]
fn header_sum_out_of_range_is_an_error() {
    let mut payload = factura_json();
    payload["grossTaxable"] = json!("70000000000000000000000000000");
    payload["tax"] = json!("70000000000000000000000000000");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert!(fields(&errors).contains(&"taxInclusive"));
}

#[test]
fn control_characters_in_free_text_are_rejected() {
    let mut payload = factura_json();
    payload["lines"][0]["description"] = json!("A\u{1}B");
    payload["customer"]["legalName"] = json!("CLIENTE\u{FFFF}");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(stages(&errors), [ValidationStage::Structural]);
    assert_eq!(fields(&errors), ["customer.legalName", "lines[0].description"]);
    assert!(errors[1].message.contains("U+0001"));
}

#[test]
fn tabs_and_newlines_are_allowed() {
    let mut payload = factura_json();
    payload["lines"][0]["description"] = json!("Teclado\tUSB\r\nespañol");
    assert!(validate_invoice(&raw(payload), now()).is_ok());
    assert_eq!(first_invalid_xml_char("Teclado\tUSB\r\n"), None);
    assert_eq!(first_invalid_xml_char("a\u{1F}b"), Some('\u{1F}'));
}

// --- Notes ---

#[test]
fn credit_note_carries_reference() {
    let note = credit_note();
    assert_eq!(note.document_type, DocumentType::CreditNote);
    let reference = note.reference.unwrap();
    assert_eq!(reference.id, "F001-00000123");
    assert_eq!(reference.document_type, DocumentType::Invoice);
    assert_eq!(reference.reason_code, "01");
}

#[test]
fn note_without_reference_is_rejected() {
    let mut payload = credit_note_json();
    payload.as_object_mut().unwrap().remove("reference");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert!(fields(&errors).contains(&"reference"));
}

#[test]
fn debit_note_reason_catalog() {
    let mut payload = credit_note_json();
    payload["documentType"] = json!("08");
    payload["reference"]["reasonCode"] = json!("07");
    let errors = validate_invoice(&raw(payload), now()).unwrap_err();
    assert_eq!(fields(&errors), ["reference.reasonCode"]);
}

// --- RUC ---

#[test]
fn ruc_check_digits() {
    assert!(is_valid_ruc(ISSUER_RUC));
    assert!(is_valid_ruc(CUSTOMER_RUC));
    assert_eq!(ruc_check_digit("2010006660"), Some(3));
    assert!(!is_valid_ruc("2010006660"));
    assert!(!is_valid_ruc("2010006660X"));
    assert!(!is_valid_ruc(""));
}

#[test]
fn errors_summarize_one_per_line() {
    let errors = validate_invoice(&RawInvoice::default(), now()).unwrap_err();
    let summary = summarize(&errors);
    assert_eq!(summary.lines().count(), errors.len());
    assert!(summary.starts_with("[structural]"));
}
