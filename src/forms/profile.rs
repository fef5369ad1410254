use std::io::BufReader;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use image::{ImageFormat, ImageReader};
use tempfile::NamedTempFile;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::{ImageName, TypeConstraintError, base_name, has_image_extension};

/// Name of the multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Raster formats accepted for profile images.
const ACCEPTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Size is bounded by the multipart `total_limit` configured at startup.
#[derive(MultipartForm)]
pub struct UploadForm {
    pub image: Option<TempFile>,
}

/// Upload that passed validation and is ready to be stored.
#[derive(Debug)]
pub struct ValidUpload {
    pub name: ImageName,
    pub file: NamedTempFile,
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("no image submitted")]
    MissingImage,
    #[error("invalid image: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("invalid image name")]
    Name(#[from] TypeConstraintError),
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error("corrupt image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to read uploaded file")]
    Read(#[source] std::io::Error),
}

/// Fields extracted from the uploaded file for validation.
#[derive(Debug, Validate)]
struct ImageFields {
    #[validate(length(min = 1, max = 100), custom(function = "validate_extension"))]
    file_name: String,
    #[validate(range(min = 1))]
    size: usize,
}

fn validate_extension(name: &str) -> Result<(), ValidationError> {
    if has_image_extension(name) {
        Ok(())
    } else {
        Err(ValidationError::new("image_extension"))
    }
}

impl UploadForm {
    /// An unbound form, as rendered on the upload page.
    pub fn empty() -> Self {
        Self { image: None }
    }

    /// Validate the bound image and hand back the file for storage.
    ///
    /// The file must decode as one of the accepted formats; a matching
    /// signature alone is not enough.
    pub fn validate(self) -> Result<ValidUpload, FormError> {
        let image = self.image.ok_or(FormError::MissingImage)?;

        let fields = ImageFields {
            file_name: image
                .file_name
                .as_deref()
                .map(base_name)
                .unwrap_or_default()
                .to_string(),
            size: image.size,
        };
        fields.validate()?;

        let reader = ImageReader::new(BufReader::new(
            image.file.reopen().map_err(FormError::Read)?,
        ))
        .with_guessed_format()
        .map_err(FormError::Read)?;

        match reader.format() {
            Some(format) if ACCEPTED_FORMATS.contains(&format) => {}
            _ => return Err(FormError::UnsupportedFormat),
        }
        reader.decode().map_err(FormError::Decode)?;

        let name = ImageName::try_new(fields.file_name)?;

        Ok(ValidUpload {
            name,
            file: image.file,
        })
    }
}
