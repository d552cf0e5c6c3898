// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scoped staging files for uploaded images
//!
//! A [`StagedImage`] owns exactly one temporary file. The file is removed when
//! the value is released or dropped, whichever comes first, so every exit path
//! of a request (success, provider error, panic) cleans up after itself.

use bytes::Bytes;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use super::payload::ImageReference;

/// Content type assumed when the upload does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

const STAGING_PREFIX: &str = "image-relay-";

/// Raw image part received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Declared image content type, falling back to PNG for generic uploads
    pub fn effective_content_type(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => ct,
            _ => DEFAULT_CONTENT_TYPE,
        }
    }
}

/// File suffix for a staged image of the given content type
pub fn suffix_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        _ => ".png",
    }
}

/// Where staging files are created
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    dir: Option<PathBuf>,
}

impl StagingArea {
    /// Stage into `dir`, or the system temp directory when `None`
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write the upload to a fresh temporary file
    pub fn stage(&self, upload: &ImageUpload) -> io::Result<StagedImage> {
        let content_type = upload.effective_content_type().to_string();
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(suffix_for(&content_type));

        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&upload.bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!(
            "Staged {} byte upload at {} ({})",
            upload.bytes.len(),
            path.display(),
            content_type
        );

        Ok(StagedImage {
            file: Some(file),
            path,
            content_type,
        })
    }
}

/// An uploaded image held in a temporary file for the lifetime of one provider call
#[derive(Debug)]
pub struct StagedImage {
    file: Option<NamedTempFile>,
    path: PathBuf,
    content_type: String,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Reference handed to the provider payload
    pub fn reference(&self) -> ImageReference {
        ImageReference::new(&self.path, &self.content_type)
    }

    /// Close the handle and remove the file
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        // Already gone is fine; nothing else to do on failure.
        if let Err(e) = file.close() {
            debug!(
                "Staging file {} not removed cleanly: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        self.remove();
    }
}
