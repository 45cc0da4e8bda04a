//! Text detection backed by AWS Textract.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::{BlockType, Document};
use async_trait::async_trait;
use tracing::debug;

use crate::detect::{BlockKind, OcrError, TextBlock, TextDetector};

/// Detector wrapping the Textract `DetectDocumentText` API. Credentials come
/// from the standard AWS chain (environment, profile, instance role).
pub struct TextractDetector {
    client: aws_sdk_textract::Client,
}

impl TextractDetector {
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::v2025_01_17())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: aws_sdk_textract::Client::new(&config),
        }
    }
}

#[async_trait]
impl TextDetector for TextractDetector {
    async fn detect_document_text(&self, jpeg: &[u8]) -> Result<Vec<TextBlock>, OcrError> {
        let document = Document::builder().bytes(Blob::new(jpeg.to_vec())).build();

        let response = self
            .client
            .detect_document_text()
            .document(document)
            .send()
            .await
            .map_err(|e| OcrError::Service(format!("AWS Textract error: {e:?}")))?;

        let blocks: Vec<TextBlock> = response
            .blocks()
            .iter()
            .map(|block| TextBlock {
                kind: match block.block_type() {
                    Some(BlockType::Line) => BlockKind::Line,
                    Some(BlockType::Word) => BlockKind::Word,
                    _ => BlockKind::Other,
                },
                text: block.text().unwrap_or_default().to_string(),
            })
            .collect();

        debug!(blocks = blocks.len(), "textract response mapped");
        Ok(blocks)
    }
}
