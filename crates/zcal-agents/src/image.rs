//! Base64 image checks done before any provider call.

use once_cell::sync::Lazy;
use regex::Regex;

static DATA_URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/\w+;base64,").expect("valid data url regex"));

static BASE64_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("valid base64 regex"));

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Strips a leading `data:image/<kind>;base64,` prefix.
pub fn clean_base64(input: &str) -> &str {
    match DATA_URL_PREFIX.find(input) {
        Some(m) => &input[m.end()..],
        None => input,
    }
}

/// True when the (cleaned) input is non-empty base64 text.
pub fn validate_base64_image(input: &str) -> bool {
    let data = clean_base64(input);
    !data.is_empty() && BASE64_BODY.is_match(data)
}

/// Decoded size in bytes, derived from the encoded length and padding.
pub fn estimate_image_size(input: &str) -> u64 {
    let data = clean_base64(input);
    let padding = if data.ends_with("==") {
        2
    } else if data.ends_with('=') {
        1
    } else {
        0
    };
    ((data.len() as u64) * 3).div_ceil(4).saturating_sub(padding)
}

/// True when the decoded image fits within `max_mb` mebibytes.
pub fn validate_image_size(input: &str, max_mb: u32) -> bool {
    estimate_image_size(input) <= u64::from(max_mb) * BYTES_PER_MB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_base64() {
        assert!(validate_base64_image("iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJ"));
    }

    #[test]
    fn accepts_data_url() {
        assert!(validate_base64_image(
            "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJ=="
        ));
    }

    #[test]
    fn rejects_empty_or_malformed() {
        assert!(!validate_base64_image("this is not base64!@#$%"));
        assert!(!validate_base64_image(""));
        assert!(!validate_base64_image("data:image/png;base64,"));
        assert!(!validate_base64_image("QUJD==="));
    }

    #[test]
    fn clean_removes_prefix_only() {
        assert_eq!(clean_base64("data:image/jpeg;base64,ABC123=="), "ABC123==");
        assert_eq!(clean_base64("ZXhhbXBsZQ=="), "ZXhhbXBsZQ==");
    }

    #[test]
    fn size_follows_padding_arithmetic() {
        assert_eq!(estimate_image_size("QUJD"), 3);
        assert_eq!(estimate_image_size("YWJjZA=="), 4);
        assert_eq!(estimate_image_size("YWJjZGU="), 5);
        assert_eq!(estimate_image_size("data:image/png;base64,QUJD"), 3);
        assert_eq!(estimate_image_size(""), 0);
        assert_eq!(estimate_image_size("=="), 0);
    }

    #[test]
    fn size_limit_is_inclusive() {
        let five_mb = "A".repeat((5 * 1024 * 1024 * 4) / 3);
        let over_limit = format!("{five_mb}AAAA");

        assert!(validate_image_size(&five_mb, 5));
        assert!(!validate_image_size(&over_limit, 5));
    }
}
