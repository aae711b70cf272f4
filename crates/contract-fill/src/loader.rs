//! Template loading
//!
//! The template fetch is the only network-bound step of a render, so it is
//! the only place with timeout and retry semantics: every failure here maps
//! to [`FillError::TemplateLoad`] and the caller is free to try again.

use std::path::Path;

use crate::error::FillError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Read template bytes from the local filesystem.
pub fn read_template(path: impl AsRef<Path>) -> Result<Vec<u8>, FillError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| FillError::TemplateLoad(format!("{}: {}", path.display(), e)))?;
    check_pdf_header(&bytes)?;
    Ok(bytes)
}

/// Fetch template bytes over HTTP, bounded by `timeout`. Network errors,
/// non-success statuses and the timeout itself all surface as
/// [`FillError::TemplateLoad`].
#[cfg(feature = "fetch")]
pub async fn fetch_template(
    url: &str,
    timeout: std::time::Duration,
) -> Result<Vec<u8>, FillError> {
    let fetch = async {
        let response = reqwest::get(url)
            .await
            .map_err(|e| FillError::TemplateLoad(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FillError::TemplateLoad(format!(
                "template fetch returned HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FillError::TemplateLoad(e.to_string()))?;
        Ok(bytes.to_vec())
    };

    let bytes = match tokio::time::timeout(timeout, fetch).await {
        Ok(result) => result?,
        Err(_elapsed) => {
            return Err(FillError::TemplateLoad(format!(
                "template fetch timed out after {}ms",
                timeout.as_millis()
            )));
        }
    };
    check_pdf_header(&bytes)?;
    Ok(bytes)
}

fn check_pdf_header(bytes: &[u8]) -> Result<(), FillError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(FillError::TemplateLoad(
            "not a PDF document (missing %PDF- header)".to_string(),
        ));
    }
    Ok(())
}
