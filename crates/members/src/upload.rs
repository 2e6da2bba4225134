//! Member photo and ID card uploads.
//!
//! File types are sniffed from the leading bytes; the client supplied
//! content type and file name are never trusted.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

use spk_config::UploadConfig;

pub const MIN_PHOTO_DIMENSION: u32 = 150;
pub const MAX_PHOTO_DIMENSION: u32 = 4000;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PDF_SIGNATURE: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Jpeg,
    Png,
    Pdf,
}

impl FileKind {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&PNG_SIGNATURE) {
            Some(FileKind::Png)
        } else if bytes.starts_with(&JPEG_SIGNATURE) {
            Some(FileKind::Jpeg)
        } else if bytes.starts_with(PDF_SIGNATURE) {
            Some(FileKind::Pdf)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Jpeg => "jpg",
            FileKind::Png => "png",
            FileKind::Pdf => "pdf",
        }
    }

    pub fn mime(&self) -> mime::Mime {
        match self {
            FileKind::Jpeg => mime::IMAGE_JPEG,
            FileKind::Png => mime::IMAGE_PNG,
            FileKind::Pdf => mime::APPLICATION_PDF,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FileKind::Jpeg | FileKind::Png)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("empty upload")]
    Empty,
    #[error("upload of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("unsupported file type")]
    UnsupportedType { allowed: &'static str },
    #[error("image dimensions could not be read")]
    UnreadableImage,
    #[error("image is {width}x{height}, smaller than the minimum {min}x{min}")]
    TooSmall { width: u32, height: u32, min: u32 },
    #[error("image is {width}x{height}, larger than the maximum {max}x{max}")]
    TooBig { width: u32, height: u32, max: u32 },
    #[error("failed to store upload: {0}")]
    Storage(String),
}

impl UploadError {
    /// Message shown to the member.
    pub fn localized(&self) -> String {
        match self {
            UploadError::Empty => "File tidak boleh kosong".to_string(),
            UploadError::TooLarge { limit, .. } => {
                format!("Ukuran file maksimal {}", human_size(*limit))
            }
            UploadError::UnsupportedType { allowed } => {
                format!("Format file harus {allowed}")
            }
            UploadError::UnreadableImage => "Gambar tidak dapat dibaca".to_string(),
            UploadError::TooSmall { min, .. } => {
                format!("Dimensi foto minimal {min}x{min} piksel")
            }
            UploadError::TooBig { max, .. } => {
                format!("Dimensi foto maksimal {max}x{max} piksel")
            }
            UploadError::Storage(_) => "File gagal disimpan, silakan coba lagi".to_string(),
        }
    }
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} byte")
    }
}

/// Width and height read from a PNG or JPEG header.
pub fn image_dimensions(kind: FileKind, bytes: &[u8]) -> Option<(u32, u32)> {
    match kind {
        FileKind::Png => png_dimensions(bytes),
        FileKind::Jpeg => jpeg_dimensions(bytes),
        FileKind::Pdf => None,
    }
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let slice = bytes.get(at..at + 2)?;
    Some(u16::from_be_bytes([slice[0], slice[1]]))
}

fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    // IHDR is always the first chunk.
    if bytes.get(12..16)? != b"IHDR" {
        return None;
    }
    Some((be_u32(bytes, 16)?, be_u32(bytes, 20)?))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        let mut marker = *bytes.get(pos + 1)?;
        while marker == 0xFF {
            pos += 1;
            marker = *bytes.get(pos + 1)?;
        }

        match marker {
            0xD0..=0xD9 | 0x01 => {
                pos += 2;
                continue;
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be_u16(bytes, pos + 5)?;
                let width = be_u16(bytes, pos + 7)?;
                return Some((u32::from(width), u32::from(height)));
            }
            _ => {
                let length = be_u16(bytes, pos + 2)? as usize;
                if length < 2 {
                    return None;
                }
                pos += 2 + length;
            }
        }
    }
}

fn check_size(bytes: &[u8], limit: u64) -> Result<(), UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    let size = bytes.len() as u64;
    if size > limit {
        return Err(UploadError::TooLarge { size, limit });
    }
    Ok(())
}

/// Photos must be JPEG or PNG within the size limit and between
/// [`MIN_PHOTO_DIMENSION`] and [`MAX_PHOTO_DIMENSION`] on both sides.
pub fn check_photo(bytes: &[u8], max_bytes: u64) -> Result<FileKind, UploadError> {
    check_size(bytes, max_bytes)?;
    let kind = FileKind::sniff(bytes)
        .filter(FileKind::is_image)
        .ok_or(UploadError::UnsupportedType { allowed: "JPG atau PNG" })?;

    let (width, height) = image_dimensions(kind, bytes).ok_or(UploadError::UnreadableImage)?;
    if width < MIN_PHOTO_DIMENSION || height < MIN_PHOTO_DIMENSION {
        return Err(UploadError::TooSmall { width, height, min: MIN_PHOTO_DIMENSION });
    }
    if width > MAX_PHOTO_DIMENSION || height > MAX_PHOTO_DIMENSION {
        return Err(UploadError::TooBig { width, height, max: MAX_PHOTO_DIMENSION });
    }
    Ok(kind)
}

/// ID card scans may be JPEG, PNG or PDF.
pub fn check_document(bytes: &[u8], max_bytes: u64) -> Result<FileKind, UploadError> {
    check_size(bytes, max_bytes)?;
    FileKind::sniff(bytes).ok_or(UploadError::UnsupportedType { allowed: "JPG, PNG atau PDF" })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSlot {
    Photo,
    IdCard,
}

impl UploadSlot {
    fn directory(&self) -> &'static str {
        match self {
            UploadSlot::Photo => "photos",
            UploadSlot::IdCard => "documents",
        }
    }
}

/// Writes checked uploads below the configured directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_photo_bytes: u64,
    max_document_bytes: u64,
}

impl UploadStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.directory),
            max_photo_bytes: config.max_photo_bytes,
            max_document_bytes: config.max_document_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn check(&self, slot: UploadSlot, bytes: &[u8]) -> Result<FileKind, UploadError> {
        match slot {
            UploadSlot::Photo => check_photo(bytes, self.max_photo_bytes),
            UploadSlot::IdCard => check_document(bytes, self.max_document_bytes),
        }
    }

    /// Checks and writes the file, returning its path relative to the upload root.
    pub async fn save(&self, slot: UploadSlot, member_id: i64, bytes: &[u8]) -> Result<String, UploadError> {
        let kind = self.check(slot, bytes)?;
        let relative = format!(
            "{}/member-{member_id}-{}.{}",
            slot.directory(),
            cuid2::create_id(),
            kind.extension()
        );
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| UploadError::Storage(err.to_string()))?;
        }
        fs::write(&target, bytes)
            .await
            .map_err(|err| UploadError::Storage(err.to_string()))?;

        info!(member_id, path = %relative, kind = ?kind, "member upload stored");
        Ok(relative)
    }

    /// Removes a previously stored file; missing files are ignored.
    pub async fn remove(&self, relative: &str) {
        let target = self.root.join(relative);
        if let Err(err) = fs::remove_file(&target).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %target.display(), error = %err, "failed to remove old upload");
            }
        }
    }
}
