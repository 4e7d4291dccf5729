//! Input resolution: normalise a user-supplied path or URL to a local file
//! with a known [`DocumentFormat`].
//!
//! The declared type is settled first, in priority order: explicit MIME type
//! from the caller, then the HTTP `Content-Type` (URLs only), then the file
//! extension. An undeclarable type fails with `UnsupportedFormat` before any
//! bytes are parsed. The file's magic bytes must then agree with the declared
//! type. Downloads land in a `TempDir` that is removed when the
//! [`ResolvedInput`] is dropped.

use crate::document::DocumentFormat;
use crate::error::DocTranslateError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local { path: PathBuf, format: DocumentFormat },
    /// Input was a URL; the document was downloaded to a temporary directory.
    /// The `TempDir` is kept alive until processing completes.
    Downloaded {
        path: PathBuf,
        format: DocumentFormat,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    /// Path to the document regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local { path, .. } => path,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// Declared (and magic-checked) format of the document.
    pub fn format(&self) -> DocumentFormat {
        match self {
            ResolvedInput::Local { format, .. } => *format,
            ResolvedInput::Downloaded { format, .. } => *format,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local document of a supported type.
pub async fn resolve_input(
    input: &str,
    declared_mime: Option<&str>,
    timeout_secs: u64,
) -> Result<ResolvedInput, DocTranslateError> {
    if is_url(input) {
        download_url(input, declared_mime, timeout_secs).await
    } else {
        resolve_local(input, declared_mime)
    }
}

/// Resolve a local file path: declared type, existence, magic bytes.
fn resolve_local(
    path_str: &str,
    declared_mime: Option<&str>,
) -> Result<ResolvedInput, DocTranslateError> {
    let path = PathBuf::from(path_str);

    let format = match declared_mime {
        Some(mime) => DocumentFormat::from_mime(mime)?,
        None => DocumentFormat::from_path(&path)?,
    };

    if !path.exists() {
        return Err(DocTranslateError::FileNotFound { path });
    }

    let head = match std::fs::File::open(&path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(8);
            f.take(8)
                .read_to_end(&mut head)
                .map_err(|e| DocTranslateError::CorruptDocument {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
            head
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocTranslateError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DocTranslateError::FileNotFound { path });
        }
    };
    check_magic(&path, format, &head)?;

    debug!("Resolved local {} document: {}", format, path.display());
    Ok(ResolvedInput::Local { path, format })
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(
    url: &str,
    declared_mime: Option<&str>,
    timeout_secs: u64,
) -> Result<ResolvedInput, DocTranslateError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocTranslateError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocTranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocTranslateError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocTranslateError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let format = declared_format(declared_mime, content_type.as_deref(), &filename)?;

    let temp_dir = TempDir::new().map_err(|e| DocTranslateError::Internal(e.to_string()))?;
    let file_path = temp_dir
        .path()
        .join(with_extension(&filename, format));

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocTranslateError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| DocTranslateError::Internal(format!("Failed to write temp file: {e}")))?;

    check_magic(&file_path, format, &bytes)?;

    info!("Downloaded {} document to: {}", format, file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        format,
        _temp_dir: temp_dir,
    })
}

/// Settle the declared type of a download.
///
/// Generic content types (`application/octet-stream`, missing header) defer
/// to the URL's file extension.
fn declared_format(
    explicit: Option<&str>,
    content_type: Option<&str>,
    filename: &str,
) -> Result<DocumentFormat, DocTranslateError> {
    if let Some(mime) = explicit {
        return DocumentFormat::from_mime(mime);
    }
    match content_type {
        Some(ct) if !is_generic_mime(ct) => DocumentFormat::from_mime(ct),
        _ => DocumentFormat::from_path(Path::new(filename)),
    }
}

fn is_generic_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    essence.is_empty()
        || essence.eq_ignore_ascii_case("application/octet-stream")
        || essence.eq_ignore_ascii_case("binary/octet-stream")
}

fn check_magic(
    path: &Path,
    format: DocumentFormat,
    head: &[u8],
) -> Result<(), DocTranslateError> {
    if format.matches_magic(head) {
        return Ok(());
    }
    let shown: Vec<u8> = head.iter().take(4).copied().collect();
    Err(DocTranslateError::CorruptDocument {
        path: path.to_path_buf(),
        detail: format!(
            "declared as {} but starts with {:?}",
            format,
            String::from_utf8_lossy(&shown)
        ),
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded".to_string()
}

fn with_extension(filename: &str, format: DocumentFormat) -> PathBuf {
    Path::new(filename).with_extension(format.extension())
}
