//! API handlers for the PDF cutter server
//!
//! Every mutating endpoint takes a multipart upload, runs the page operation
//! on the blocking pool, stores the results in the download directory and
//! answers with download URLs.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::Response,
    Json,
};
use pdfcutter_core::{
    naming, parse_order, parse_selection, Limits, LopdfCodec, PageEditor, PageSpecification,
};
use serde::Serialize;
use tracing::info;

use crate::error::ServerError;
use crate::storage::{self, DownloadStore};
use crate::upload::UploadForm;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<PageEditor<LopdfCodec>>,
    pub downloads: DownloadStore,
    /// Largest accepted request body in bytes
    pub max_content_length: usize,
}

/// Run CPU-bound PDF work off the async executor
async fn run_blocking<T, F>(work: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub limits: Limits,
    pub max_content_length: usize,
}

/// Handler: GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfcutter-server",
        version: env!("CARGO_PKG_VERSION"),
        limits: *state.editor.limits(),
        max_content_length: state.max_content_length,
    })
}

#[derive(Serialize)]
pub struct PdfInfoResponse {
    pub success: bool,
    pub filename: String,
    pub total_pages: u32,
    pub version: Option<String>,
    pub encrypted: bool,
}

/// Handler: POST /get_pdf_info
pub async fn handle_pdf_info(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PdfInfoResponse>, ServerError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_pdf("file")?;

    let editor = state.editor.clone();
    let info = run_blocking(move || Ok(editor.inspect(&file)?)).await?;

    Ok(Json(PdfInfoResponse {
        success: true,
        filename: info.filename,
        total_pages: info.total_pages,
        version: info.version,
        encrypted: info.encrypted,
    }))
}

/// One page of a split result
#[derive(Serialize)]
pub struct SplitFileInfo {
    pub filename: String,
    pub page: u32,
    pub download_url: String,
}

#[derive(Serialize)]
pub struct SplitResponse {
    pub success: bool,
    pub message: String,
    pub files: Vec<SplitFileInfo>,
    pub zip_filename: String,
    pub zip_url: String,
    pub total_pages: u32,
}

/// Handler: POST /split
pub async fn handle_split(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SplitResponse>, ServerError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_pdf("file")?;
    let split_type = form.text("split_type").unwrap_or("all").to_string();
    let start_page = form.text("start_page").map(str::to_string);
    let end_page = form.text("end_page").map(str::to_string);
    let specific_pages = form.text("specific_pages").map(str::to_string);

    info!("Split request: file={}, type={}", file.filename, split_type);

    let editor = state.editor.clone();
    let (pages, archive, archive_name, total_pages) = run_blocking(move || {
        let doc = editor.open(&file)?;
        let spec = PageSpecification::from_split_form(
            &split_type,
            start_page.as_deref(),
            end_page.as_deref(),
            specific_pages.as_deref(),
            doc.total_pages(),
        )?;
        let pages = editor.split(&doc, &spec)?;

        let archive = storage::zip_pages(
            pages
                .iter()
                .map(|page| (page.display_name.as_str(), page.bytes.as_slice())),
        )
        .map_err(|e| ServerError::Internal(format!("Failed to build archive: {}", e)))?;

        Ok((
            pages,
            archive,
            naming::archive_name(doc.base_name()),
            doc.total_pages(),
        ))
    })
    .await?;

    // Pages and archive are stored together or not at all
    let entries: Vec<(&str, &[u8])> = pages
        .iter()
        .map(|page| (page.display_name.as_str(), page.bytes.as_slice()))
        .chain(std::iter::once((archive_name.as_str(), archive.as_slice())))
        .collect();
    let mut stored = state.downloads.save_all(entries).await?;
    let zip = stored
        .pop()
        .ok_or_else(|| ServerError::Internal("Split archive was not stored".into()))?;

    let files: Vec<SplitFileInfo> = pages
        .iter()
        .zip(&stored)
        .map(|(page, file)| SplitFileInfo {
            filename: file.display_name.clone(),
            page: page.page_number,
            download_url: file.download_url(),
        })
        .collect();

    info!("Split produced {} files", files.len());

    Ok(Json(SplitResponse {
        success: true,
        message: format!("Split into {} file(s)", files.len()),
        files,
        zip_filename: zip.display_name.clone(),
        zip_url: zip.download_url(),
        total_pages,
    }))
}

/// Response for operations producing a single document
#[derive(Serialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub download_url: String,
    pub total_pages: u32,
}

/// Handler: POST /merge
pub async fn handle_merge(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, ServerError> {
    let mut form = UploadForm::read(multipart).await?;
    let files = form.take_pdfs("files[]")?;
    let file_count = files.len();

    info!("Merge request: {} files", file_count);

    let editor = state.editor.clone();
    let merged = run_blocking(move || Ok(editor.merge(&files)?)).await?;
    let stored = state.downloads.save(&merged.display_name, &merged.bytes).await?;

    Ok(Json(DocumentResponse {
        success: true,
        message: format!("Merged {} files into {} pages", file_count, merged.page_count),
        filename: stored.display_name.clone(),
        download_url: stored.download_url(),
        total_pages: merged.page_count,
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub download_url: String,
    pub deleted_pages: Vec<u32>,
    pub remaining_pages: u32,
}

/// Handler: POST /delete-pages
pub async fn handle_delete_pages(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DeleteResponse>, ServerError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_pdf("file")?;
    let selection = form.require_text("pages_to_delete")?.to_string();

    info!("Delete request: file={}, pages={}", file.filename, selection);

    let editor = state.editor.clone();
    let (output, deleted) = run_blocking(move || {
        let doc = editor.open(&file)?;
        let deleted = parse_selection(&selection, doc.total_pages());
        let output = editor.delete(&doc, &PageSpecification::from_pages(&deleted))?;
        Ok((output, deleted))
    })
    .await?;
    let stored = state.downloads.save(&output.display_name, &output.bytes).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Deleted {} page(s)", deleted.len()),
        filename: stored.display_name.clone(),
        download_url: stored.download_url(),
        deleted_pages: deleted,
        remaining_pages: output.page_count,
    }))
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub download_url: String,
    pub extracted_pages: Vec<u32>,
}

/// Handler: POST /extract-pages
pub async fn handle_extract_pages(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ServerError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_pdf("file")?;
    let selection = form.require_text("pages_to_extract")?.to_string();

    info!("Extract request: file={}, pages={}", file.filename, selection);

    let editor = state.editor.clone();
    let (output, extracted) = run_blocking(move || {
        let doc = editor.open(&file)?;
        let extracted = parse_selection(&selection, doc.total_pages());
        let output = editor.extract(&doc, &PageSpecification::from_pages(&extracted))?;
        Ok((output, extracted))
    })
    .await?;
    let stored = state.downloads.save(&output.display_name, &output.bytes).await?;

    Ok(Json(ExtractResponse {
        success: true,
        message: format!("Extracted {} page(s)", extracted.len()),
        filename: stored.display_name.clone(),
        download_url: stored.download_url(),
        extracted_pages: extracted,
    }))
}

/// Handler: POST /reorder
pub async fn handle_reorder(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, ServerError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_pdf("file")?;
    let page_order = form.require_text("page_order")?.to_string();

    info!("Reorder request: file={}", file.filename);

    let editor = state.editor.clone();
    let output = run_blocking(move || {
        let doc = editor.open(&file)?;
        let order = parse_order(&page_order, doc.total_pages())?;
        Ok(editor.reorder(&doc, &order)?)
    })
    .await?;
    let stored = state.downloads.save(&output.display_name, &output.bytes).await?;

    Ok(Json(DocumentResponse {
        success: true,
        message: "Pages reordered".to_string(),
        filename: stored.display_name.clone(),
        download_url: stored.download_url(),
        total_pages: output.page_count,
    }))
}

/// Handler: GET /download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ServerError> {
    let (path, display_name) = state.downloads.resolve(&filename).await?;
    let bytes = tokio::fs::read(&path).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, storage::content_type(&display_name))
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", display_name),
        )
        .body(Body::from(bytes))
        .map_err(|e| ServerError::Internal(e.to_string()))
}
