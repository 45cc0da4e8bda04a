//! The per-upload orchestrator: prepare → detect text → extract → look up →
//! report. One warehouse session per upload, released on every exit path.

use thiserror::Error;
use tracing::{debug, info, warn};

use prestige_ocr::detect::BlockKind;
use prestige_ocr::{extract, joined_lines, prepare_from_bytes, OcrError, PrepareError, TextDetector};
use prestige_warehouse::{LookupResult, Warehouse, WarehouseSession};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload is not a decodable image; nothing downstream runs.
    #[error("image preparation failed: {0}")]
    Prepare(#[from] PrepareError),
    /// Text detection failed; no lookup is attempted.
    #[error("text extraction failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Outcome of one check branch (warranty or product).
#[derive(Debug)]
pub enum CheckOutcome {
    /// The extractor found nothing in the text.
    NotDetected,
    /// Extracted, but the warehouse has no matching row.
    Invalid { detected: String },
    /// Extracted and matched.
    Valid {
        detected: String,
        result: LookupResult,
    },
    /// Extracted, but the lookup itself failed.
    LookupFailed { detected: String, message: String },
}

#[derive(Debug)]
pub struct CheckReport {
    /// The enhanced image, JPEG-encoded, for display.
    pub image_jpeg: Vec<u8>,
    pub warranty: CheckOutcome,
    pub product: CheckOutcome,
}

/// Run the full pipeline for one uploaded image. Preparation and detection
/// failures abort the request; lookup failures are reported per branch.
pub async fn run_check(
    detector: &dyn TextDetector,
    warehouse: &dyn Warehouse,
    upload: &[u8],
) -> Result<CheckReport, PipelineError> {
    let prepared = prepare_from_bytes(upload)?;
    debug!(jpeg_bytes = prepared.jpeg.len(), "image prepared");

    let blocks = detector.detect_document_text(&prepared.jpeg).await?;
    let text = joined_lines(&blocks);
    info!(
        lines = blocks.iter().filter(|b| b.kind == BlockKind::Line).count(),
        chars = text.len(),
        "text extracted"
    );

    // Both extractors read the same text blob; neither sees the other.
    let detected_warranty = extract::warranty_id(&text);
    let detected_model = extract::model(&text);

    let (warranty, product) = match warehouse.open_session().await {
        Ok(session) => run_lookups(session, &detected_warranty, &detected_model).await,
        Err(e) => {
            warn!(error = %e, "could not open warehouse session");
            let message = e.to_string();
            (
                branch_failure(detected_warranty, &message),
                branch_failure(detected_model, &message),
            )
        }
    };

    Ok(CheckReport {
        image_jpeg: prepared.jpeg,
        warranty,
        product,
    })
}

/// Run both lookup branches on one session, then close it. A query-scoped
/// failure in the warranty branch still lets the product branch run; a
/// session-scoped failure skips it.
async fn run_lookups(
    mut session: Box<dyn WarehouseSession>,
    warranty_id: &Option<String>,
    model: &Option<String>,
) -> (CheckOutcome, CheckOutcome) {
    let mut session_broken = false;

    let warranty = match warranty_id {
        None => CheckOutcome::NotDetected,
        Some(id) => match session.find_warranty(id).await {
            Ok(result) if result.found() => CheckOutcome::Valid {
                detected: id.clone(),
                result,
            },
            Ok(_) => CheckOutcome::Invalid {
                detected: id.clone(),
            },
            Err(e) => {
                warn!(error = %e, "warranty lookup failed");
                session_broken = e.is_session();
                CheckOutcome::LookupFailed {
                    detected: id.clone(),
                    message: e.to_string(),
                }
            }
        },
    };

    let product = match model {
        None => CheckOutcome::NotDetected,
        Some(m) if session_broken => CheckOutcome::LookupFailed {
            detected: m.clone(),
            message: "warehouse session unusable after earlier failure".to_string(),
        },
        Some(m) => match session.find_product(m).await {
            Ok(result) if result.found() => CheckOutcome::Valid {
                detected: m.clone(),
                result,
            },
            Ok(_) => CheckOutcome::Invalid {
                detected: m.clone(),
            },
            Err(e) => {
                warn!(error = %e, "product lookup failed");
                CheckOutcome::LookupFailed {
                    detected: m.clone(),
                    message: e.to_string(),
                }
            }
        },
    };

    // Single release point for every path through the branches above.
    if let Err(e) = session.close().await {
        warn!(error = %e, "warehouse session close failed");
    }

    (warranty, product)
}

fn branch_failure(detected: Option<String>, message: &str) -> CheckOutcome {
    match detected {
        None => CheckOutcome::NotDetected,
        Some(detected) => CheckOutcome::LookupFailed {
            detected,
            message: message.to_string(),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
