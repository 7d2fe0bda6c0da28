//! Local references: classification, file reads, and `data:` URI encoding.

use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use percent_encoding::percent_decode_str;
use tracing::debug;
use url::Url;

use singlehtml_shared::{Result, SingleHtmlError};

/// Where an image's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Already a `data:` URI; nothing to do.
    Embedded,
    /// An `http`/`https` URL.
    Remote(String),
    /// A filesystem path, already resolved against the document's base directory.
    Local(PathBuf),
}

impl ImageSource {
    /// Classify an `src` value relative to `base_dir`.
    ///
    /// Remote means an `http://` or `https://` scheme, in any case. Local values
    /// are percent-decoded; `file:` URIs become paths; relative paths are joined
    /// to `base_dir`.
    pub fn classify(src: &str, base_dir: &Path) -> Self {
        let src = src.trim();

        if has_prefix_ignore_case(src, "data:") {
            return Self::Embedded;
        }
        if has_prefix_ignore_case(src, "http://") || has_prefix_ignore_case(src, "https://") {
            return Self::Remote(src.to_string());
        }
        if is_file_href(src) {
            if let Ok(path) = file_href_to_path(src) {
                return Self::Local(path);
            }
        }

        let decoded = percent_decode_str(src).decode_utf8_lossy();
        let path = Path::new(decoded.as_ref());
        if path.is_absolute() {
            Self::Local(path.to_path_buf())
        } else {
            Self::Local(base_dir.join(path))
        }
    }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// MIME type for an image file, derived from its extension.
///
/// `svg` maps to `image/svg+xml` and `jpg` to `image/jpeg`; anything else is
/// `image/<ext>`.
pub fn image_mime(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "" => "application/octet-stream".to_string(),
        "svg" => "image/svg+xml".to_string(),
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

/// Build a base64 `data:` URI. `charset` adds a `;charset=<value>` parameter.
pub fn encode_data_uri(mime: &str, bytes: &[u8], charset: Option<&str>) -> String {
    let payload = BASE64_STANDARD.encode(bytes);
    match charset {
        Some(charset) => format!("data:{mime};charset={charset};base64,{payload}"),
        None => format!("data:{mime};base64,{payload}"),
    }
}

/// Read a local image into a `data:` URI.
///
/// A missing or unreadable file is a `MissingReference`.
pub async fn load_local_image(path: &Path) -> Result<String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(SingleHtmlError::missing(
            path.display().to_string(),
            "file does not exist",
        ));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SingleHtmlError::missing(path.display().to_string(), e.to_string()))?;

    debug!(path = %path.display(), bytes = bytes.len(), "read local image");
    Ok(encode_data_uri(&image_mime(path), &bytes, None))
}

/// Whether a stylesheet `href` uses the `file:` scheme. Only these are inlined.
pub fn is_file_href(href: &str) -> bool {
    href.starts_with("file:")
}

/// Convert a `file:` URI to a filesystem path.
pub fn file_href_to_path(href: &str) -> Result<PathBuf> {
    Url::parse(href)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| {
            SingleHtmlError::io(
                href,
                io::Error::new(io::ErrorKind::InvalidInput, "not a local file URI"),
            )
        })
}

/// Read a `file:` stylesheet as UTF-8 text.
pub async fn read_stylesheet(href: &str) -> Result<String> {
    let path = file_href_to_path(href)?;
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| SingleHtmlError::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sh-{tag}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn classify_remote_is_case_insensitive() {
        let base = Path::new("/docs");
        assert_eq!(
            ImageSource::classify("HTTPS://img.example.com/a.png", base),
            ImageSource::Remote("HTTPS://img.example.com/a.png".into())
        );
        assert_eq!(
            ImageSource::classify("http://x/y.svg", base),
            ImageSource::Remote("http://x/y.svg".into())
        );
    }

    #[test]
    fn classify_http_named_files_as_local() {
        let base = Path::new("/docs");
        assert_eq!(
            ImageSource::classify("http_local.png", base),
            ImageSource::Local(PathBuf::from("/docs/http_local.png"))
        );
        assert_eq!(
            ImageSource::classify("https-diagram.svg", base),
            ImageSource::Local(PathBuf::from("/docs/https-diagram.svg"))
        );
    }

    #[test]
    fn classify_embedded() {
        let base = Path::new("/docs");
        assert_eq!(
            ImageSource::classify("data:image/png;base64,AAAA", base),
            ImageSource::Embedded
        );
    }

    #[test]
    fn classify_local_paths() {
        let base = Path::new("/docs");
        assert_eq!(
            ImageSource::classify("img/a.png", base),
            ImageSource::Local(PathBuf::from("/docs/img/a.png"))
        );
        assert_eq!(
            ImageSource::classify("/abs/b.png", base),
            ImageSource::Local(PathBuf::from("/abs/b.png"))
        );
        assert_eq!(
            ImageSource::classify("my%20image.png", base),
            ImageSource::Local(PathBuf::from("/docs/my image.png"))
        );
        assert_eq!(
            ImageSource::classify("file:///srv/c.gif", base),
            ImageSource::Local(PathBuf::from("/srv/c.gif"))
        );
    }

    #[test]
    fn mime_remaps_svg_and_jpg() {
        assert_eq!(image_mime(Path::new("icon.svg")), "image/svg+xml");
        assert_eq!(image_mime(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("shot.png")), "image/png");
        assert_eq!(image_mime(Path::new("anim.gif")), "image/gif");
        assert_eq!(image_mime(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn data_uri_encoding() {
        assert_eq!(
            encode_data_uri("image/png", b"abc", None),
            "data:image/png;base64,YWJj"
        );
        assert_eq!(
            encode_data_uri("image/svg+xml", b"abc", Some("utf8")),
            "data:image/svg+xml;charset=utf8;base64,YWJj"
        );
    }

    #[test]
    fn file_href_detection() {
        assert!(is_file_href("file:///a.css"));
        assert!(!is_file_href("https://cdn.example.com/a.css"));
        assert!(!is_file_href("a.css"));
        assert_eq!(
            file_href_to_path("file:///a/b.css").unwrap(),
            PathBuf::from("/a/b.css")
        );
        assert!(file_href_to_path("file://remote-host/x.css").is_err());
    }

    #[tokio::test]
    async fn load_local_image_reads_and_encodes() {
        let dir = temp_dir("local-img");
        let svg = dir.join("icon.svg");
        std::fs::write(&svg, "<svg/>").unwrap();

        let uri = load_local_image(&svg).await.unwrap();
        assert_eq!(uri, "data:image/svg+xml;base64,PHN2Zy8+");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn load_local_image_missing_is_recoverable() {
        let err = load_local_image(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn read_stylesheet_returns_literal_content() {
        let dir = temp_dir("css");
        let css = dir.join("a.css");
        std::fs::write(&css, "body{color:red}").unwrap();
        let href = Url::from_file_path(&css).unwrap().to_string();

        assert_eq!(read_stylesheet(&href).await.unwrap(), "body{color:red}");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
