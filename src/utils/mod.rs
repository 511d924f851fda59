use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Extension used when neither the URL nor the content type names one.
pub const DEFAULT_EXTENSION: &str = "jpg";

fn extension_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9]{1,4}$").ok())
        .as_ref()
}

/// Lowercase an extension candidate, dropping a leading dot.
/// Returns `None` for anything that is not 1-4 alphanumeric characters.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    extension_pattern()?
        .is_match(trimmed)
        .then(|| trimmed.to_ascii_lowercase())
}

/// Extension from the last path segment of a URL, ignoring query and fragment.
pub fn extension_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    normalize_extension(ext)
}

pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let ext = match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "audio/mp4" => "m4a",
        "audio/wav" | "audio/x-wav" => "wav",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        _ => return None,
    };
    Some(ext)
}

/// Human readable size, in the units the console report uses.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = bytes as f64;
    if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_url() {
        let url = Url::parse("https://cdn.example.com/media/photo.JPG?w=800#top").unwrap();
        assert_eq!(extension_from_url(&url).as_deref(), Some("jpg"));

        let url = Url::parse("https://cdn.example.com/media/archive.tar.gz").unwrap();
        assert_eq!(extension_from_url(&url).as_deref(), Some("gz"));

        // Too long to be a real extension
        let url = Url::parse("https://cdn.example.com/page.phtml5").unwrap();
        assert_eq!(extension_from_url(&url), None);

        let url = Url::parse("https://cdn.example.com/media/").unwrap();
        assert_eq!(extension_from_url(&url), None);

        let url = Url::parse("https://cdn.example.com/.hidden").unwrap();
        assert_eq!(extension_from_url(&url), None);
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(extension_from_content_type("image/png"), Some("png"));
        assert_eq!(
            extension_from_content_type("video/mp4; codecs=avc1"),
            Some("mp4")
        );
        assert_eq!(extension_from_content_type("text/html"), None);
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".MP4").as_deref(), Some("mp4"));
        assert_eq!(normalize_extension("webp").as_deref(), Some("webp"));
        assert_eq!(normalize_extension(""), None);
        assert_eq!(normalize_extension("../x"), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
