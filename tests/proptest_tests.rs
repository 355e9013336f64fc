//! Property-based tests for the comprobante crate.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "ubl")]

mod common;

use common::*;
use comprobante::core::*;
use comprobante::ubl;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rust_decimal::Decimal;
use serde_json::json;

/// Decimal text across the whole `Decimal` range, plus junk.
fn amount_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "-?[0-9]{1,29}(\\.[0-9]{1,4})?",
        "[0-9]{1,2}(\\.[0-9]{1,2})?[eE]-?[0-9]{1,2}",
        Just("79228162514264337593543950335".to_string()),
        Just("-79228162514264337593543950335".to_string()),
        Just("0.0000000000000000000000000001".to_string()),
        "\\PC{0,12}",
    ]
}

fn assert_totals_reconcile(invoice: &Invoice) -> Result<(), TestCaseError> {
    let line_sum = invoice
        .lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, l| sum.checked_add(l.line_total));
    prop_assert!(line_sum.is_some());
    let line_sum = line_sum.unwrap_or_default();
    prop_assert!((line_sum - invoice.gross_taxable).abs() <= AMOUNT_TOLERANCE);
    prop_assert!(
        (round_amount(invoice.gross_taxable * IGV_RATE) - invoice.tax).abs() <= AMOUNT_TOLERANCE
    );
    let expected_inclusive = invoice.gross_taxable.checked_add(invoice.tax);
    prop_assert!(expected_inclusive.is_some());
    let expected_inclusive = expected_inclusive.unwrap_or_default();
    prop_assert!((expected_inclusive - invoice.tax_inclusive).abs() <= AMOUNT_TOLERANCE);
    prop_assert!((invoice.payable - invoice.tax_inclusive).abs() <= AMOUNT_TOLERANCE);
    prop_assert!(invoice.payable > Decimal::ZERO);
    Ok(())
}

proptest! {
    #[test]
    fn ruc_with_computed_check_digit_is_valid(prefix in "[0-9]{10}") {
        let digit = ruc_check_digit(&prefix).unwrap();
        let ruc = format!("{prefix}{digit}");
        prop_assert!(is_valid_ruc(&ruc));
    }

    #[test]
    fn ruc_with_other_check_digit_is_invalid(prefix in "[0-9]{10}", offset in 1u8..10) {
        let digit = ruc_check_digit(&prefix).unwrap();
        let wrong = (digit + offset) % 10;
        let ruc = format!("{prefix}{wrong}");
        prop_assert!(!is_valid_ruc(&ruc));
    }

    #[test]
    fn ruc_check_never_panics(input in "\\PC{0,20}") {
        let _ = is_valid_ruc(&input);
        let _ = ruc_check_digit(&input);
    }

    #[test]
    fn ruc_requires_eleven_digits(input in "[0-9]{0,10}|[0-9]{12,15}") {
        prop_assert!(!is_valid_ruc(&input));
    }

    #[test]
    fn number_is_padded_to_eight_digits(n in 1u32..=99_999_999) {
        let mut payload = factura_json();
        payload["number"] = json!(n.to_string());
        let invoice = validate_invoice(&raw(payload), now()).unwrap();
        prop_assert_eq!(invoice.number.len(), 8);
        prop_assert_eq!(invoice.number.parse::<u32>().unwrap(), n);
    }

    #[test]
    fn validation_never_panics(
        series in "\\PC{0,6}",
        number in "\\PC{0,10}",
        amount in "\\PC{0,8}",
    ) {
        let mut payload = factura_json();
        payload["series"] = json!(series);
        payload["number"] = json!(number);
        payload["payable"] = json!(amount);
        let _ = validate_invoice(&raw(payload), now());
    }

    #[test]
    fn build_is_deterministic_for_any_quantity(quantity in 1u32..500, cents in 1u32..100_000) {
        let price = Decimal::new(i64::from(cents), 2);
        let total = price * Decimal::from(quantity);
        let tax = (total * IGV_RATE).round_dp(2);
        let mut payload = factura_json();
        payload["lines"] = json!([{
            "quantity": quantity.to_string(),
            "unitPrice": price.to_string(),
            "lineTotal": total.to_string(),
            "description": "Producto"
        }]);
        payload["grossTaxable"] = json!(total.to_string());
        payload["tax"] = json!(tax.to_string());
        payload["taxInclusive"] = json!((total + tax).to_string());
        payload["payable"] = json!((total + tax).to_string());

        let invoice = validate_invoice(&raw(payload), now()).unwrap();
        let first = ubl::to_ubl_xml(&invoice).unwrap();
        let second = ubl::to_ubl_xml(&invoice).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn validation_never_panics_on_amounts(
        quantity in amount_text(),
        unit_price in amount_text(),
        line_total in amount_text(),
        tax_amount in amount_text(),
        gross in amount_text(),
        tax in amount_text(),
        inclusive in amount_text(),
        payable in amount_text(),
    ) {
        let mut payload = factura_json();
        payload["lines"][0]["quantity"] = json!(quantity);
        payload["lines"][0]["unitPrice"] = json!(unit_price);
        payload["lines"][0]["lineTotal"] = json!(line_total);
        payload["lines"][0]["taxAmount"] = json!(tax_amount);
        payload["grossTaxable"] = json!(gross);
        payload["tax"] = json!(tax);
        payload["taxInclusive"] = json!(inclusive);
        payload["payable"] = json!(payable);
        if let Ok(invoice) = validate_invoice(&raw(payload), now()) {
            assert_totals_reconcile(&invoice)?;
            prop_assert!(ubl::to_ubl_xml(&invoice).is_ok());
        }
    }

    #[test]
    fn accepted_invoices_reconcile(
        lines in prop::collection::vec((1u32..50, 100u32..100_000), 1..6),
        tax_skew in -3i64..=3,
        payable_skew in -3i64..=3,
    ) {
        let mut gross = Decimal::ZERO;
        let mut items = Vec::new();
        for (quantity, cents) in lines {
            let price = Decimal::new(i64::from(cents), 2);
            let total = price * Decimal::from(quantity);
            gross += total;
            items.push(json!({
                "quantity": quantity.to_string(),
                "unitPrice": price.to_string(),
                "lineTotal": total.to_string(),
                "description": "Producto"
            }));
        }
        let tax = round_amount(gross * IGV_RATE) + Decimal::new(tax_skew, 2);
        let payable = gross + tax + Decimal::new(payable_skew, 2);

        let mut payload = factura_json();
        payload["lines"] = json!(items);
        payload["grossTaxable"] = json!(gross.to_string());
        payload["tax"] = json!(tax.to_string());
        payload["taxInclusive"] = json!((gross + tax).to_string());
        payload["payable"] = json!(payable.to_string());

        match validate_invoice(&raw(payload), now()) {
            Ok(invoice) => assert_totals_reconcile(&invoice)?,
            Err(errors) => prop_assert!(
                tax_skew.abs() > 1 || payable_skew.abs() > 1,
                "within tolerance but rejected: {errors:?}"
            ),
        }
    }

    #[test]
    fn free_text_never_breaks_the_document(
        description in "\\PC{0,40}|[\\x00-\\x1F\\x{FFFE}\\x{FFFF}a-z ]{1,20}",
        legal_name in "\\PC{1,30}|[\\x00-\\x1Fa-z]{1,10}",
    ) {
        let mut payload = factura_json();
        payload["lines"][0]["description"] = json!(description);
        payload["customer"]["legalName"] = json!(legal_name);
        match validate_invoice(&raw(payload), now()) {
            Ok(invoice) => {
                let xml = ubl::to_ubl_xml(&invoice);
                prop_assert!(xml.is_ok());
                prop_assert_eq!(first_invalid_xml_char(&xml.unwrap_or_default()), None);
            }
            Err(errors) => {
                if first_invalid_xml_char(&description).is_some() {
                    prop_assert!(errors.iter().any(|e| e.field == "lines[0].description"));
                }
                if first_invalid_xml_char(&legal_name).is_some() {
                    prop_assert!(errors.iter().any(|e| e.field == "customer.legalName"));
                }
            }
        }
    }
}
