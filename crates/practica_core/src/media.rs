//! Photo normalization pipeline.
//!
//! # Responsibility
//! - Decode an uploaded image, re-encode it in its detected format and fill
//!   the attachment's derived fields (payload, label, dimensions, alt text).
//!
//! # Invariants
//! - Runs on every save of every photo-bearing entity, even when the file is
//!   unchanged.
//! - An unreadable or unrecognized file fails the whole save; no partial
//!   derived state is left behind.

use crate::model::photo::PhotoAttachment;
use image::{GenericImageView, ImageFormat, ImageReader};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Cursor;
use std::path::PathBuf;

pub type PhotoResult<T> = Result<T, PhotoError>;

/// Failure while deriving the normalized representation of an uploaded image.
#[derive(Debug)]
pub enum PhotoError {
    /// The referenced file could not be opened or probed.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file content does not match any known raster format.
    UnknownFormat { path: PathBuf },
    /// The file matched a format but could not be decoded.
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    /// Re-encoding the decoded image failed.
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

impl Display for PhotoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read photo `{}`: {source}", path.display())
            }
            Self::UnknownFormat { path } => {
                write!(f, "photo `{}` is not a recognized image", path.display())
            }
            Self::Decode { path, source } => {
                write!(f, "cannot decode photo `{}`: {source}", path.display())
            }
            Self::Encode { path, source } => {
                write!(f, "cannot re-encode photo `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for PhotoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::UnknownFormat { .. } => None,
            Self::Decode { source, .. } | Self::Encode { source, .. } => Some(source),
        }
    }
}

/// Re-derives the attachment's payload, format label, dimensions and default
/// alt text from its file reference. Clears everything derived when no file
/// is attached.
pub fn normalize_photo(photo: &mut PhotoAttachment) -> PhotoResult<()> {
    let Some(path) = photo.source_path.clone() else {
        photo.clear_derived();
        return Ok(());
    };

    let reader = ImageReader::open(&path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| PhotoError::Read {
            path: path.clone(),
            source,
        })?;
    let format = reader.format().ok_or_else(|| PhotoError::UnknownFormat {
        path: path.clone(),
    })?;
    let image = reader.decode().map_err(|source| PhotoError::Decode {
        path: path.clone(),
        source,
    })?;

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(|source| PhotoError::Encode {
            path: path.clone(),
            source,
        })?;

    if photo.alt.trim().is_empty() {
        if let Some(name) = path.file_name() {
            photo.alt = name.to_string_lossy().into_owned();
        }
    }

    let (width, height) = image.dimensions();
    photo.width = Some(width);
    photo.height = Some(height);
    photo.payload = buffer.into_inner();
    photo.ext = Some(format_label(format));
    Ok(())
}

/// Canonical uppercase label for a detected format, e.g. `PNG` or `JPEG`.
pub fn format_label(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        other => other
            .extensions_str()
            .first()
            .map(|ext| ext.to_ascii_uppercase())
            .unwrap_or_default(),
    }
}
