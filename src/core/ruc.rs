//! RUC (taxpayer registry number) check digit.
//!
//! A RUC has eleven digits; the last one is a modulo-11 check digit over the
//! first ten.

const WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

/// Compute the check digit for the first ten digits of a RUC.
///
/// Returns `None` unless `prefix` is exactly ten ASCII digits.
pub fn ruc_check_digit(prefix: &str) -> Option<u8> {
    if prefix.len() != 10 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sum: u32 = prefix
        .bytes()
        .zip(WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    let digit = match 11 - sum % 11 {
        10 => 1,
        11 => 0,
        d => d,
    };
    Some(digit as u8)
}

/// Check whether `ruc` is a well-formed RUC with a correct check digit.
///
/// Never panics; any input that is not eleven ASCII digits is invalid.
pub fn is_valid_ruc(ruc: &str) -> bool {
    if ruc.len() != 11 || !ruc.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let last = ruc.as_bytes()[10] - b'0';
    ruc_check_digit(&ruc[..10]) == Some(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_rucs() {
        assert!(is_valid_ruc("20100066603"));
        assert!(is_valid_ruc("20000000001"));
        assert!(is_valid_ruc("20601030013"));
        assert!(!is_valid_ruc("20100066604"));
    }

    #[test]
    fn remainder_edge_cases() {
        // 9 * 5 = 45, 45 % 11 = 1, 11 - 1 = 10 maps to 1
        assert_eq!(ruc_check_digit("9000000000"), Some(1));
        assert_eq!(ruc_check_digit("2000000000"), Some(1));
        // sum 0 gives 11 which maps to 0
        assert_eq!(ruc_check_digit("0000000000"), Some(0));
    }

    #[test]
    fn malformed_input() {
        assert!(!is_valid_ruc(""));
        assert!(!is_valid_ruc("2010006660"));
        assert!(!is_valid_ruc("201000666033"));
        assert!(!is_valid_ruc("2010006660A"));
        assert!(!is_valid_ruc("２0100066603"));
        assert_eq!(ruc_check_digit("20100-6660"), None);
    }
}
