// src/upload_validator.rs
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};

use crate::utils::{format_file_size, get_file_extension};

pub const MAX_RESUME_SIZE: u64 = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

const PDF_SIGNATURE: &[u8] = b"%PDF";
const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const ZIP_SIGNATURE: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeErrorType {
    FileNotFound,
    UnreadableFile,
    EmptyFile,
    TooLarge,
    WrongFormat,
    CorruptedFile,
}

impl ResumeErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound => "RESUME_NOT_FOUND",
            Self::UnreadableFile => "RESUME_UNREADABLE",
            Self::EmptyFile => "RESUME_EMPTY",
            Self::TooLarge => "RESUME_TOO_LARGE",
            Self::WrongFormat => "RESUME_WRONG_FORMAT",
            Self::CorruptedFile => "RESUME_CORRUPTED",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{file_name}: {message}")]
pub struct UploadValidationError {
    pub file_name: String,
    pub error_type: ResumeErrorType,
    pub message: String,
    pub suggestion: String,
}

impl UploadValidationError {
    fn new(file_name: &str, error_type: ResumeErrorType, message: String, suggestion: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            error_type,
            message,
            suggestion: suggestion.to_string(),
        }
    }
}

/// A resume that passed local validation and is ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Get content type for an accepted resume file name
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    match get_file_extension(file_name).as_deref() {
        Some("pdf") => Some("application/pdf"),
        Some("doc") => Some("application/msword"),
        Some("docx") => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}

/// Checks resume files before any byte goes over the network
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_size: u64,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(MAX_RESUME_SIZE)
    }
}

impl UploadValidator {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Read and validate a resume from disk. The size is checked from
    /// metadata first so oversized files are never read.
    pub async fn load(&self, path: &Path) -> Result<ResumeFile, UploadValidationError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        if !path.exists() {
            return Err(UploadValidationError::new(
                &file_name,
                ResumeErrorType::FileNotFound,
                format!("File not found: {}", path.display()),
                "Check the path and try again",
            ));
        }

        let metadata = fs::metadata(path).await.map_err(|_| {
            UploadValidationError::new(
                &file_name,
                ResumeErrorType::UnreadableFile,
                "Cannot read file metadata".to_string(),
                "Check file permissions",
            )
        })?;

        self.check_format(&file_name)?;
        self.check_size(&file_name, metadata.len())?;

        let bytes = fs::read(path).await.map_err(|e| {
            UploadValidationError::new(
                &file_name,
                ResumeErrorType::UnreadableFile,
                format!("Cannot read file: {}", e),
                "Check file permissions",
            )
        })?;

        let resume = self.validate_bytes(&file_name, bytes)?;
        info!(
            "Resume validation passed: {} ({})",
            resume.file_name,
            format_file_size(resume.size())
        );
        Ok(resume)
    }

    /// Validate an in-memory resume
    pub fn validate_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ResumeFile, UploadValidationError> {
        let content_type = self.check_format(file_name)?;
        self.check_size(file_name, bytes.len() as u64)?;
        Self::check_signature(file_name, &bytes)?;

        Ok(ResumeFile {
            file_name: file_name.to_string(),
            content_type,
            bytes,
        })
    }

    fn check_format(&self, file_name: &str) -> Result<&'static str, UploadValidationError> {
        content_type_for(file_name).ok_or_else(|| {
            error!("Unsupported resume format: {}", file_name);
            UploadValidationError::new(
                file_name,
                ResumeErrorType::WrongFormat,
                "Unsupported file format".to_string(),
                "Please use PDF, DOC or DOCX",
            )
        })
    }

    fn check_size(&self, file_name: &str, size: u64) -> Result<(), UploadValidationError> {
        if size == 0 {
            return Err(UploadValidationError::new(
                file_name,
                ResumeErrorType::EmptyFile,
                "File is empty".to_string(),
                "Please choose a non-empty resume",
            ));
        }

        if size > self.max_size {
            error!("Resume too large: {} ({} bytes)", file_name, size);
            return Err(UploadValidationError::new(
                file_name,
                ResumeErrorType::TooLarge,
                format!(
                    "File too large: {} (max {})",
                    format_file_size(size),
                    format_file_size(self.max_size)
                ),
                "Please compress the document and try again",
            ));
        }

        Ok(())
    }

    fn check_signature(file_name: &str, bytes: &[u8]) -> Result<(), UploadValidationError> {
        let expected = match get_file_extension(file_name).as_deref() {
            Some("pdf") => PDF_SIGNATURE,
            Some("doc") => OLE_SIGNATURE,
            _ => ZIP_SIGNATURE,
        };

        if bytes.starts_with(expected) {
            return Ok(());
        }

        // Name the real format when the extension is simply wrong
        let actual = if bytes.starts_with(PDF_SIGNATURE) {
            Some("PDF")
        } else if bytes.starts_with(OLE_SIGNATURE) {
            Some("DOC")
        } else if bytes.starts_with(ZIP_SIGNATURE) {
            Some("DOCX")
        } else {
            None
        };

        Err(match actual {
            Some(actual) => UploadValidationError::new(
                file_name,
                ResumeErrorType::WrongFormat,
                format!("File is {} but has a different extension", actual),
                "Rename the file with the matching extension",
            ),
            None => UploadValidationError::new(
                file_name,
                ResumeErrorType::CorruptedFile,
                "File content does not match its extension".to_string(),
                "Please upload a valid PDF, DOC or DOCX document",
            ),
        })
    }
}
