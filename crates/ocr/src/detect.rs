use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("text detection service error: {0}")]
    Service(String),
}

/// Block classification as returned by the detection service. Only `Line`
/// blocks feed the extracted text; the rest are kept for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Line,
    Word,
    Other,
}

/// One typed block of recognized text, in service-returned order.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl TextBlock {
    pub fn line(text: impl Into<String>) -> Self {
        TextBlock {
            kind: BlockKind::Line,
            text: text.into(),
        }
    }
}

/// Abstraction over a document-text detection service.
/// Implementations accept JPEG bytes and return the typed blocks.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_document_text(&self, jpeg: &[u8]) -> Result<Vec<TextBlock>, OcrError>;
}

/// Join every `Line` block's text with a trailing newline, preserving the
/// order the service returned. No lines means an empty string; the
/// extractors downstream then report "not found" rather than failing.
pub fn joined_lines(blocks: &[TextBlock]) -> String {
    let mut text = String::new();
    for block in blocks {
        if block.kind == BlockKind::Line {
            text.push_str(&block.text);
            text.push('\n');
        }
    }
    text
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns preset blocks, or a preset failure — lets the whole pipeline run
/// without AWS credentials.
pub struct MockDetector {
    result: Result<Vec<TextBlock>, String>,
}

impl MockDetector {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self { result: Ok(blocks) }
    }

    /// One `Line` block per entry.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(TextBlock::line).collect())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

#[async_trait]
impl TextDetector for MockDetector {
    async fn detect_document_text(&self, _jpeg: &[u8]) -> Result<Vec<TextBlock>, OcrError> {
        match &self.result {
            Ok(blocks) => Ok(blocks.clone()),
            Err(message) => Err(OcrError::Service(message.clone())),
        }
    }
}
