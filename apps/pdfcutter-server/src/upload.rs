//! Multipart form decoding for PDF uploads

use std::collections::HashMap;

use axum::extract::Multipart;
use pdfcutter_core::{naming, InputFile};
use tracing::debug;

use crate::error::ServerError;

/// A fully buffered multipart form: uploaded files plus plain text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<(String, InputFile)>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await?;
                    debug!(field = %name, file = %filename, size = bytes.len(), "received upload");
                    form.files.push((name, InputFile::new(filename, bytes.to_vec())));
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// The single PDF uploaded under `field`
    pub fn take_pdf(&mut self, field: &str) -> Result<InputFile, ServerError> {
        let index = self
            .files
            .iter()
            .position(|(name, file)| name == field && !file.filename.is_empty())
            .ok_or_else(|| ServerError::InvalidRequest("No file uploaded".into()))?;

        let (_, file) = self.files.remove(index);
        check_pdf_name(&file)?;
        Ok(file)
    }

    /// Every PDF uploaded under `field`, in upload order
    pub fn take_pdfs(&mut self, field: &str) -> Result<Vec<InputFile>, ServerError> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(name, _)| name == field);
        self.files = rest;

        let files: Vec<InputFile> = matching
            .into_iter()
            .map(|(_, file)| file)
            .filter(|file| !file.filename.is_empty())
            .collect();

        for file in &files {
            check_pdf_name(file)?;
        }
        Ok(files)
    }

    /// A text field, or `None` when absent or blank
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// A required text field
    pub fn require_text(&self, field: &str) -> Result<&str, ServerError> {
        self.text(field)
            .ok_or_else(|| ServerError::InvalidRequest(format!("Missing form field '{}'", field)))
    }
}

fn check_pdf_name(file: &InputFile) -> Result<(), ServerError> {
    if naming::is_pdf_filename(&file.filename) {
        Ok(())
    } else {
        Err(ServerError::InvalidRequest(format!(
            "Only PDF files are accepted: '{}'",
            file.filename
        )))
    }
}
