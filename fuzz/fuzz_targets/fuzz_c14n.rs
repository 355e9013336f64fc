#![no_main]

use comprobante::sign::c14n;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Canonical output that parses again must be a fixed point.
        if let Ok(canonical) = c14n::canonicalize(s) {
            if let Ok(again) = c14n::canonicalize(&canonical) {
                assert_eq!(again, canonical);
            }
        }
        let _ = c14n::canonicalize_enveloped(s);
    }
});
