#![no_main]

use comprobante::core::DocumentType;
use comprobante::package::DocumentName;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = comprobante::sunat::cdr::parse_receipt(s);
    }
    // Arbitrary bytes as a receipt archive.
    let name = DocumentName::new("20100066603", DocumentType::Invoice, "F001", "00000001");
    let _ = comprobante::sunat::process_receipt(data, &name);
});
