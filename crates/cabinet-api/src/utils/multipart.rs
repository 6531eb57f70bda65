//! Buffered multipart bodies
//!
//! A part with a filename is a file; anything else is a text field. The
//! entity JSON may arrive either way, so [`MultipartForm::json`] checks both.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use cabinet_core::{AppError, UploadedFile};
use serde::de::DeserializeOwned;

use crate::error::HttpAppError;

#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, Bytes>,
    files: Vec<(String, UploadedFile)>,
}

/// Reject a file larger than `max_size` bytes
pub fn validate_file_size(file: &UploadedFile, max_size: usize) -> Result<(), AppError> {
    if file.data.len() > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File {} exceeds the maximum allowed size of {} MB",
            file.filename,
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart, max_file_size: usize) -> Result<Self, HttpAppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string).unwrap_or_default();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;

            match filename {
                Some(filename) => {
                    let file = UploadedFile::new(filename, content_type, data);
                    validate_file_size(&file, max_file_size)?;
                    form.files.push((name, file));
                }
                None => {
                    form.texts.insert(name, data);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.texts
            .get(name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    /// Deserialize the JSON carried by `name`, sent as a text or a file part.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<T, AppError> {
        let raw = self
            .texts
            .get(name)
            .or_else(|| {
                self.files
                    .iter()
                    .find(|(field, _)| field == name)
                    .map(|(_, file)| &file.data)
            })
            .ok_or_else(|| AppError::InvalidInput(format!("Missing multipart field '{}'", name)))?;

        serde_json::from_slice(raw).map_err(|e| {
            AppError::InvalidInput(format!("Invalid JSON in multipart field '{}': {}", name, e))
        })
    }

    /// At most one file named `name`.
    pub fn take_file(&mut self, name: &str) -> Result<Option<UploadedFile>, AppError> {
        let mut files = self.take_files(name);
        if files.len() > 1 {
            return Err(AppError::InvalidInput(format!(
                "Multiple '{}' fields are not allowed; send exactly one",
                name
            )));
        }
        Ok(files.pop())
    }

    /// Exactly one file named `name`.
    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        self.take_file(name)?
            .ok_or_else(|| AppError::InvalidInput(format!("No '{}' field provided", name)))
    }

    /// Every file named `name`, in the order they were sent.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        taken.into_iter().map(|(_, file)| file).collect()
    }
}
