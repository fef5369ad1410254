use serde::Serialize;

use crate::domain::Profile;

/// Serializable profile for template rendering.
#[derive(Clone, Debug, Serialize)]
pub struct ProfileDto {
    pub id: u64,
    pub image: String,
    pub image_url: String,
}

impl ProfileDto {
    pub fn from_profile(profile: &Profile, media_url: &str) -> Self {
        Self {
            id: profile.id.value(),
            image: profile.image.as_str().to_string(),
            image_url: profile.image.url(media_url),
        }
    }
}

/// Empty upload form as rendered on the profile page.
#[derive(Clone, Debug, Serialize)]
pub struct UploadFormDto {
    pub field: &'static str,
    pub accept: &'static str,
}

impl Default for UploadFormDto {
    fn default() -> Self {
        Self {
            field: crate::forms::profile::IMAGE_FIELD,
            accept: "image/*",
        }
    }
}
