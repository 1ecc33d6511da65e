use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A video chosen for upload. Only lives on the client until the upload ends.
#[derive(Debug, Clone)]
pub struct VideoFile {
    pub file_name: String,
    pub mime_type: String,
    source: VideoSource,
}

#[derive(Debug, Clone)]
enum VideoSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl VideoFile {
    pub fn from_path(path: impl Into<PathBuf>, mime_type: Option<String>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let mime_type = mime_type.unwrap_or_else(|| guess_mime(&path).to_string());
        Self { file_name, mime_type, source: VideoSource::Path(path) }
    }

    pub fn from_bytes(file_name: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_type.unwrap_or_else(|| guess_mime(Path::new(&file_name)).to_string());
        Self { file_name, mime_type, source: VideoSource::Bytes(bytes) }
    }

    /// Size in bytes without reading the payload.
    pub async fn size(&self) -> std::io::Result<u64> {
        match &self.source {
            VideoSource::Path(path) => Ok(tokio::fs::metadata(path).await?.len()),
            VideoSource::Bytes(bytes) => Ok(bytes.len() as u64),
        }
    }

    /// Reads the whole payload and encodes it as standard base64.
    pub async fn encode_base64(&self) -> std::io::Result<String> {
        let bytes = match &self.source {
            VideoSource::Path(path) => tokio::fs::read(path).await?,
            VideoSource::Bytes(bytes) => bytes.clone(),
        };

        tokio::task::spawn_blocking(move || STANDARD.encode(bytes))
            .await
            .map_err(std::io::Error::other)
    }
}

pub fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("3gp") => "video/3gpp",
        _ => "application/octet-stream",
    }
}
