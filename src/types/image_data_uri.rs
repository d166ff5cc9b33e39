use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Supported image media types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageMediaType {
    /// `image/jpeg`
    Jpeg,

    /// `image/png`
    Png,

    /// `image/gif`
    Gif,

    /// `image/webp`
    Webp,
}

impl ImageMediaType {
    /// Guesses the media type from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageMediaType::Jpeg),
            "png" => Some(ImageMediaType::Png),
            "gif" => Some(ImageMediaType::Gif),
            "webp" => Some(ImageMediaType::Webp),
            _ => None,
        }
    }

    /// The MIME string for this type.
    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Png => "image/png",
            ImageMediaType::Gif => "image/gif",
            ImageMediaType::Webp => "image/webp",
        }
    }
}

impl FromStr for ImageMediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image/jpeg" => Ok(ImageMediaType::Jpeg),
            "image/png" => Ok(ImageMediaType::Png),
            "image/gif" => Ok(ImageMediaType::Gif),
            "image/webp" => Ok(ImageMediaType::Webp),
            _ => Err(Error::validation(
                format!("unsupported image media type: {s}"),
                Some("image".to_string()),
            )),
        }
    }
}

/// An image encoded as a `data:<mime>;base64,<payload>` URI.
///
/// This is the form the widget displays and the form the completion
/// endpoint accepts inside an `image_url` part.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageDataUri(String);

impl ImageDataUri {
    /// Encodes raw image bytes.
    pub fn from_bytes(bytes: &[u8], media_type: ImageMediaType) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{};base64,{}", media_type.as_mime(), payload))
    }

    /// Reads an image file and encodes it.
    ///
    /// The media type is taken from the file extension; jpeg, png, gif and
    /// webp are accepted.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let media_type = ImageMediaType::from_path(path).ok_or_else(|| {
            Error::validation(
                format!(
                    "unsupported image file {}: must be jpeg, png, gif, or webp",
                    path.display()
                ),
                Some("image".to_string()),
            )
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        if bytes.is_empty() {
            return Err(Error::validation(
                format!("image file {} is empty", path.display()),
                Some("image".to_string()),
            ));
        }
        Ok(Self::from_bytes(&bytes, media_type))
    }

    /// Returns the media type declared in the URI header.
    pub fn media_type(&self) -> ImageMediaType {
        let header = self.0.split_once(";base64,").map(|(h, _)| h);
        header
            .and_then(|h| h.strip_prefix("data:"))
            .and_then(|mime| mime.parse().ok())
            .unwrap_or(ImageMediaType::Png)
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }

    /// The full URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ImageDataUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((header, payload)) = s.split_once(";base64,") else {
            return Err(Error::encoding("image URI is not base64 encoded"));
        };
        let Some(mime) = header.strip_prefix("data:") else {
            return Err(Error::encoding("image URI must start with data:"));
        };
        mime.parse::<ImageMediaType>()?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|err| Error::encoding(format!("invalid base64 image payload: {err}")))?;
        Ok(Self(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ImageDataUri {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// Payloads run to megabytes; keep them out of debug logs.
impl fmt::Debug for ImageDataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageDataUri({}, {} bytes)",
            self.media_type().as_mime(),
            self.encoded_len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_bytes_with_header() {
        let uri = ImageDataUri::from_bytes(b"Hello World", ImageMediaType::Jpeg);
        assert_eq!(uri.as_str(), "data:image/jpeg;base64,SGVsbG8gV29ybGQ=");
        assert_eq!(uri.media_type(), ImageMediaType::Jpeg);
    }

    #[test]
    fn parse_rejects_non_images() {
        assert!("data:text/plain;base64,SGk=".parse::<ImageDataUri>().is_err());
        assert!("https://example.com/x.png".parse::<ImageDataUri>().is_err());
        assert!("data:image/png;base64,@@@".parse::<ImageDataUri>().is_err());
        assert!("data:image/png;base64,SGk=".parse::<ImageDataUri>().is_ok());
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(
            ImageMediaType::from_path(Path::new("rash.JPG")),
            Some(ImageMediaType::Jpeg)
        );
        assert_eq!(
            ImageMediaType::from_path(Path::new("scan.webp")),
            Some(ImageMediaType::Webp)
        );
        assert_eq!(ImageMediaType::from_path(Path::new("notes.txt")), None);
        assert_eq!(ImageMediaType::from_path(Path::new("README")), None);
    }

    #[test]
    fn debug_hides_payload() {
        let uri = ImageDataUri::from_bytes(b"secret pixels", ImageMediaType::Png);
        let debug = format!("{uri:?}");
        assert!(debug.contains("image/png"));
        assert!(!debug.contains("base64"));
    }

    #[tokio::test]
    async fn from_path_reads_file() {
        let path = std::env::temp_dir().join(format!("sarthi-image-{}.png", std::process::id()));
        tokio::fs::write(&path, b"\x89PNG fake").await.unwrap();
        let uri = ImageDataUri::from_path(&path).await.unwrap();
        assert!(uri.as_str().starts_with("data:image/png;base64,"));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn from_path_rejects_unknown_extension() {
        let err = ImageDataUri::from_path("/tmp/does-not-matter.bmp")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
