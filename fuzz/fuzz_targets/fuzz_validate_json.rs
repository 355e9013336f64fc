#![no_main]

use comprobante::core::{RawInvoice, validate_invoice};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<RawInvoice>(data) else {
        return;
    };
    let now = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    if let Ok(invoice) = validate_invoice(&raw, now) {
        let _ = comprobante::ubl::to_ubl_xml(&invoice);
    }
});
