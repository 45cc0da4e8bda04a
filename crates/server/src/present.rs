//! Maps branch outcomes to the user-visible success/warning/error states.

use serde::Serialize;

use crate::pipeline::CheckOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowTable {
    pub columns: Vec<String>,
    pub row: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresentedCheck {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<RowTable>,
}

#[derive(Debug, Clone, Copy)]
pub enum CheckKind {
    Warranty,
    Product,
}

pub fn present(kind: CheckKind, outcome: &CheckOutcome) -> PresentedCheck {
    match outcome {
        CheckOutcome::NotDetected => PresentedCheck {
            severity: Severity::Warning,
            message: match kind {
                CheckKind::Warranty => {
                    "⚠️ Couldn't find a valid 6-digit warranty ID in the image.".to_string()
                }
                CheckKind::Product => "⚠️ Couldn't find Product in the text.".to_string(),
            },
            detected: None,
            table: None,
        },
        CheckOutcome::Invalid { detected } => PresentedCheck {
            severity: Severity::Error,
            message: match kind {
                CheckKind::Warranty => "❌ Invalid Warranty ID.".to_string(),
                CheckKind::Product => "❌ Invalid Product.".to_string(),
            },
            detected: Some(detected.clone()),
            table: None,
        },
        CheckOutcome::Valid { detected, result } => PresentedCheck {
            severity: Severity::Success,
            message: match kind {
                CheckKind::Warranty => "✅ Warranty is valid!".to_string(),
                CheckKind::Product => "✅ Product is valid!".to_string(),
            },
            detected: Some(detected.clone()),
            table: result.row.clone().map(|row| RowTable {
                columns: result.columns.clone(),
                row,
            }),
        },
        CheckOutcome::LookupFailed { detected, message } => PresentedCheck {
            severity: Severity::Error,
            message: match kind {
                CheckKind::Warranty => format!("❌ Warranty lookup failed: {message}"),
                CheckKind::Product => format!("❌ Product lookup failed: {message}"),
            },
            detected: Some(detected.clone()),
            table: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prestige_warehouse::LookupResult;

    #[test]
    fn not_detected_is_a_warning_without_detected_value() {
        let p = present(CheckKind::Warranty, &CheckOutcome::NotDetected);
        assert_eq!(p.severity, Severity::Warning);
        assert!(p.message.contains("6-digit warranty ID"));
        assert!(p.detected.is_none());
        assert!(p.table.is_none());
    }

    #[test]
    fn detected_but_unmatched_is_an_error() {
        let p = present(
            CheckKind::Product,
            &CheckOutcome::Invalid {
                detected: "ACME-100".to_string(),
            },
        );
        assert_eq!(p.severity, Severity::Error);
        assert_eq!(p.message, "❌ Invalid Product.");
        assert_eq!(p.detected.as_deref(), Some("ACME-100"));
    }

    #[test]
    fn matched_row_becomes_a_table() {
        let p = present(
            CheckKind::Warranty,
            &CheckOutcome::Valid {
                detected: "482913".to_string(),
                result: LookupResult {
                    columns: vec!["ID".to_string(), "STATUS".to_string()],
                    row: Some(vec!["482913".to_string(), "ACTIVE".to_string()]),
                },
            },
        );
        assert_eq!(p.severity, Severity::Success);
        let table = p.table.unwrap();
        assert_eq!(table.columns, vec!["ID", "STATUS"]);
        assert_eq!(table.row, vec!["482913", "ACTIVE"]);
    }

    #[test]
    fn lookup_failure_carries_the_service_message() {
        let p = present(
            CheckKind::Warranty,
            &CheckOutcome::LookupFailed {
                detected: "482913".to_string(),
                message: "connection reset".to_string(),
            },
        );
        assert_eq!(p.severity, Severity::Error);
        assert!(p.message.contains("connection reset"));
        assert_eq!(p.detected.as_deref(), Some("482913"));
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}
