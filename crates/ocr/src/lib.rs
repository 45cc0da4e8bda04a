pub mod detect;
pub mod extract;
pub mod prepare;
pub mod textract;

pub use detect::{joined_lines, BlockKind, MockDetector, OcrError, TextBlock, TextDetector};
pub use extract::{model, warranty_id};
pub use prepare::{prepare_from_bytes, Prepared, PrepareError};
pub use textract::TextractDetector;
