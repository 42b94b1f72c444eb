use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a sprite sheet comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    File(PathBuf),
    Url(String),
    /// Encoded image bytes already in memory (PNG, JPEG, ...)
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// Interpret a reference string: http(s) URLs are fetched, anything else is a path
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ImageSource::Url(trimmed.to_string())
        } else {
            ImageSource::File(PathBuf::from(trimmed))
        }
    }

    /// Resolve a relative file path against `base`; other sources are returned unchanged
    pub fn resolved_against(self, base: &Path) -> Self {
        match self {
            ImageSource::File(path) if path.is_relative() => ImageSource::File(base.join(path)),
            other => other,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageSource::Url(_))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::File(path) => write!(f, "{}", path.display()),
            ImageSource::Url(url) => f.write_str(url),
            ImageSource::Bytes(data) => write!(f, "<{} bytes in memory>", data.len()),
        }
    }
}

impl From<&str> for ImageSource {
    fn from(reference: &str) -> Self {
        ImageSource::parse(reference)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(data: Vec<u8>) -> Self {
        ImageSource::Bytes(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            ImageSource::parse("https://example.com/knight.png"),
            ImageSource::Url("https://example.com/knight.png".to_string())
        );
        assert_eq!(
            ImageSource::parse("assets/knight.png"),
            ImageSource::File(PathBuf::from("assets/knight.png"))
        );
        assert!(ImageSource::parse(" http://localhost/a.png ").is_remote());
    }

    #[test]
    fn test_resolve_relative_paths_only() {
        let base = Path::new("/srv/sprites");

        let relative = ImageSource::parse("knight.png").resolved_against(base);
        assert_eq!(relative, ImageSource::File(PathBuf::from("/srv/sprites/knight.png")));

        let absolute = ImageSource::parse("/tmp/elf.png").resolved_against(base);
        assert_eq!(absolute, ImageSource::File(PathBuf::from("/tmp/elf.png")));

        let url = ImageSource::parse("https://cdn.test/ninja.png").resolved_against(base);
        assert!(url.is_remote());
    }
}
