//! Photo attachment mixin shared by photo-bearing entities.
//!
//! # Responsibility
//! - Carry the original file reference together with the normalized binary
//!   payload derived from it.
//!
//! # Invariants
//! - When `source_path` is set, `payload`, `ext` and the pixel dimensions are
//!   re-derived from the file on every save.
//! - When `source_path` is absent, `payload` is empty and `ext`/dimensions
//!   are `None`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shared photo shape embedded in `Person`, `Event`, `Achievement` and
/// `ArticlePhotoReport`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    /// Reference to the uploaded file; `None` means "no photo".
    pub source_path: Option<PathBuf>,
    /// Alt text; defaults to the file name when left empty.
    pub alt: String,
    /// Pixel width derived from the decoded image.
    pub width: Option<u32>,
    /// Pixel height derived from the decoded image.
    pub height: Option<u32>,
    /// Re-encoded image bytes in the detected format.
    pub payload: Vec<u8>,
    /// Detected format label, e.g. `PNG` or `JPEG`.
    pub ext: Option<String>,
}

impl PhotoAttachment {
    /// Creates an attachment pointing at an uploaded file. Derived fields
    /// stay empty until the next normalization pass.
    pub fn from_file(path: impl Into<PathBuf>, alt: impl Into<String>) -> Self {
        Self {
            source_path: Some(path.into()),
            alt: alt.into(),
            ..Self::default()
        }
    }

    /// Creates an empty attachment ("no photo").
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_source(&self) -> bool {
        self.source_path.is_some()
    }

    /// Drops all derived state, leaving only the file reference and alt text.
    pub fn clear_derived(&mut self) {
        self.width = None;
        self.height = None;
        self.payload.clear();
        self.ext = None;
    }
}

#[cfg(test)]
mod tests {
    use super::PhotoAttachment;

    #[test]
    fn from_file_keeps_derived_fields_empty() {
        let photo = PhotoAttachment::from_file("uploads/portrait.png", "portrait");
        assert!(photo.has_source());
        assert!(photo.payload.is_empty());
        assert_eq!(photo.ext, None);
        assert_eq!(photo.width, None);
    }

    #[test]
    fn clear_derived_resets_everything_but_the_reference() {
        let mut photo = PhotoAttachment::from_file("uploads/portrait.png", "portrait");
        photo.payload = vec![1, 2, 3];
        photo.ext = Some("PNG".to_string());
        photo.width = Some(100);
        photo.height = Some(50);

        photo.clear_derived();
        assert!(photo.has_source());
        assert!(photo.payload.is_empty());
        assert_eq!(photo.ext, None);
        assert_eq!(photo.width, None);
        assert_eq!(photo.height, None);
    }
}
