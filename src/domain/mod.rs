//! Strongly-typed domain structures for profile images.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory (relative to the media root) holding uploaded profile images.
pub const IMAGE_DIR: &str = "images";

/// Identifier of a persisted profile.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(u64);

impl ProfileId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directory uploaded media is stored under (e.g. `./media`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MediaRoot(PathBuf);

impl MediaRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory holding profile images.
    pub fn image_dir(&self) -> PathBuf {
        self.0.join(IMAGE_DIR)
    }
}

impl From<PathBuf> for MediaRoot {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

/// Sanitized image file name (single path component with an image extension).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ImageName(String);

impl ImageName {
    /// Keeps only the final segment of client-supplied paths, with either
    /// `/` or `\` as separator.
    pub fn try_new(value: String) -> Result<Self, TypeConstraintError> {
        let path = Path::new(base_name(&value));
        let mut components = path.components();
        let name = match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(component)), None) => {
                component.to_string_lossy().to_string()
            }
            _ => return Err(TypeConstraintError::InvalidFileName),
        };

        if !has_image_extension(&name) {
            return Err(TypeConstraintError::NotAnImage);
        }

        Ok(Self(name))
    }

    pub fn try_from_str(value: &str) -> Result<Self, TypeConstraintError> {
        Self::try_new(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem and extension (without the dot).
    pub fn split(&self) -> (&str, &str) {
        match self.0.rsplit_once('.') {
            Some((stem, ext)) => (stem, ext),
            None => (&self.0, ""),
        }
    }

    /// Same extension, with `suffix` appended to the stem.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let (stem, ext) = self.split();
        Self(format!("{stem}_{suffix}.{ext}"))
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Final segment of a file name sent by a browser, which may carry a
/// Unix or Windows style path (`C:\fakepath\a.png`).
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Returns true if the file name ends in a raster image extension.
pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"
            )
        })
        .unwrap_or(false)
}

/// Reference to a stored image, relative to the media root
/// (e.g. `images/avatar.png`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn for_image(name: &ImageName) -> Self {
        Self(format!("{IMAGE_DIR}/{}", name.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public URL of the image under the given media URL prefix.
    pub fn url(&self, media_url: &str) -> String {
        format!("{}/{}", media_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A persisted profile holding one uploaded image.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub image: ImageRef,
}

impl Profile {
    pub fn new(id: ProfileId, image: ImageRef) -> Self {
        Self { id, image }
    }
}

#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("invalid file name")]
    InvalidFileName,
    #[error("file is not an image")]
    NotAnImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_root_resolves_image_refs() {
        let root = MediaRoot::from(PathBuf::from("media"));
        let name = ImageName::try_new("avatar.png".to_string()).unwrap();
        let image = ImageRef::for_image(&name);

        assert_eq!(image.as_str(), "images/avatar.png");
        assert_eq!(
            root.as_path().join(image.as_str()),
            PathBuf::from("media/images/avatar.png")
        );
        assert_eq!(root.image_dir(), PathBuf::from("media/images"));
    }

    #[test]
    fn image_ref_url_joins_prefix() {
        let name = ImageName::try_from_str("a.jpg").unwrap();
        let image = ImageRef::for_image(&name);

        assert_eq!(image.url("/media/"), "/media/images/a.jpg");
        assert_eq!(image.url("/media"), "/media/images/a.jpg");
    }

    #[test]
    fn image_name_rejects_special_and_non_images() {
        for value in ["..", ".", "", "dir/..", r"a\.."] {
            assert!(
                matches!(
                    ImageName::try_from_str(value),
                    Err(TypeConstraintError::InvalidFileName)
                ),
                "{value}"
            );
        }
        assert!(matches!(
            ImageName::try_from_str("notes.txt"),
            Err(TypeConstraintError::NotAnImage)
        ));
        assert!(ImageName::try_from_str("photo.JPEG").is_ok());
    }

    #[test]
    fn image_name_drops_client_directories() {
        let cases = [
            ("../evil.png", "evil.png"),
            ("dir/photo.png", "photo.png"),
            (r"C:\fakepath\a.png", "a.png"),
            (r"..\..\b.gif", "b.gif"),
        ];
        for (value, expected) in cases {
            assert_eq!(ImageName::try_from_str(value).unwrap().as_str(), expected);
        }
        assert_eq!(base_name(r"dir\sub/c.bmp"), "c.bmp");
    }

    #[test]
    fn image_name_suffix_keeps_extension() {
        let name = ImageName::try_from_str("me.photo.png").unwrap();
        assert_eq!(name.with_suffix("abc1234").as_str(), "me.photo_abc1234.png");
    }

    #[test]
    fn profile_serializes_flat() {
        let profile = Profile::new(
            ProfileId::new(3),
            ImageRef::for_image(&ImageName::try_from_str("x.gif").unwrap()),
        );
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"id":3,"image":"images/x.gif"}"#);
    }
}
