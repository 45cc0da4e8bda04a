use std::sync::OnceLock;

use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_warranty_id, r"\b\d{6}\b");
re!(re_model, r"(?i)model\s*[:\-]?\s*(\S.+)");

// ── Extractors ───────────────────────────────────────────────────────────────

/// First standalone 6-digit run in the text. No checksum validation; later
/// candidates are ignored.
pub fn warranty_id(text: &str) -> Option<String> {
    re_warranty_id().find(text).map(|m| m.as_str().to_string())
}

/// Value of the first case-insensitive `model` label: optional `:` or `-`
/// after the label, then the rest of that line, trimmed. The label is not
/// anchored to a line start, so it can match mid-line; the first match in
/// document order wins.
pub fn model(text: &str) -> Option<String> {
    let caps = re_model().captures(text)?;
    let value = caps.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Warranty id ──────────────────────────────────────────────────────────

    #[test]
    fn warranty_id_first_six_digit_run() {
        let text = "Model: ACME-100\nWarranty 482913 valid";
        assert_eq!(warranty_id(text), Some("482913".to_string()));
    }

    #[test]
    fn warranty_id_requires_word_boundaries() {
        // Seven digits in a row is not a warranty id.
        assert_eq!(warranty_id("serial 1234567"), None);
        assert_eq!(warranty_id("x123456y"), None);
    }

    #[test]
    fn warranty_id_first_match_wins() {
        assert_eq!(
            warranty_id("ids 111111 and 222222"),
            Some("111111".to_string())
        );
    }

    #[test]
    fn warranty_id_none_without_a_run() {
        assert_eq!(warranty_id("no digits here"), None);
        assert_eq!(warranty_id(""), None);
    }

    #[test]
    fn warranty_id_matches_across_punctuation_boundaries() {
        assert_eq!(warranty_id("ID:482913."), Some("482913".to_string()));
    }

    // ── Model ────────────────────────────────────────────────────────────────

    #[test]
    fn model_with_colon() {
        assert_eq!(model("Model: ACME-100"), Some("ACME-100".to_string()));
    }

    #[test]
    fn model_with_dash_and_case_insensitive_label() {
        assert_eq!(model("MODEL- TX 9000"), Some("TX 9000".to_string()));
        assert_eq!(model("model:ACME-100"), Some("ACME-100".to_string()));
    }

    #[test]
    fn model_value_is_trimmed_to_its_line() {
        assert_eq!(
            model("Model: ACME-100  \nWarranty 482913"),
            Some("ACME-100".to_string())
        );
    }

    #[test]
    fn model_label_can_match_mid_line() {
        // The label is unanchored; the remainder of the line is the value.
        assert_eq!(model("no model here"), Some("here".to_string()));
    }

    #[test]
    fn model_none_without_label() {
        assert_eq!(model("ACME-100 warranty card"), None);
        assert_eq!(model(""), None);
    }

    #[test]
    fn model_first_match_wins() {
        assert_eq!(
            model("Model: FIRST-1\nModel: SECOND-2"),
            Some("FIRST-1".to_string())
        );
    }
}
