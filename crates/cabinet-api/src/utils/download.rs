use axum::{
    body::Body,
    http::{header, Response, StatusCode},
};
use cabinet_core::{AppError, DownloadedFile};

/// Serve downloaded bytes as an attachment.
pub fn file_response(file: DownloadedFile) -> Result<Response<Body>, AppError> {
    let content_type = file
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    let filename = file.filename.replace(['"', '\r', '\n'], "_");
    let content_disposition = format!("attachment; filename=\"{}\"", filename);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CONTENT_LENGTH, file.data.len())
        .body(Body::from(file.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_headers_and_filename_escaping() {
        let response = file_response(DownloadedFile {
            filename: "we\"ird.txt".to_string(),
            content_type: None,
            data: Bytes::from_static(b"Hello"),
        })
        .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"we_ird.txt\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "5");
    }
}
