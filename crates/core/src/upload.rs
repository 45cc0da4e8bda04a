use std::fmt;

/// The image formats accepted from the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpg,
    Jpeg,
}

impl ImageKind {
    /// Classify an upload by its declared content type, falling back to the
    /// file name extension. Anything else is rejected before decoding.
    pub fn from_upload(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        if let Some(ct) = content_type {
            if let Some(kind) = Self::from_content_type(ct) {
                return Some(kind);
            }
        }
        let ext = file_name?.rsplit('.').next()?;
        Self::from_extension(ext)
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" => Some(ImageKind::Jpeg),
            "image/jpg" => Some(ImageKind::Jpg),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" => Some(ImageKind::Jpg),
            "jpeg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Png => write!(f, "png"),
            ImageKind::Jpg => write!(f, "jpg"),
            ImageKind::Jpeg => write!(f, "jpeg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_three_allowed_content_types() {
        assert_eq!(ImageKind::from_content_type("image/png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_content_type("image/jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_content_type("image/jpg"), Some(ImageKind::Jpg));
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(ImageKind::from_content_type("image/webp"), None);
        assert_eq!(ImageKind::from_content_type("application/pdf"), None);
        assert_eq!(ImageKind::from_upload(Some("text/plain"), Some("invoice.txt")), None);
    }

    #[test]
    fn falls_back_to_file_extension() {
        assert_eq!(
            ImageKind::from_upload(Some("application/octet-stream"), Some("scan.JPG")),
            Some(ImageKind::Jpg)
        );
        assert_eq!(ImageKind::from_upload(None, Some("card.jpeg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_upload(None, None), None);
    }
}
