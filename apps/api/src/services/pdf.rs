//! PDF-to-image rendering via poppler's `pdftoppm`.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

use crate::errors::AppError;

/// A rendered page image ready for upload.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Renders page one of the PDF to a raster image.
    /// Errors map to the pipeline's conversion failure.
    async fn render_first_page(&self, pdf: &[u8]) -> Result<RenderedPage, AppError>;
}

/// Shells out to `pdftoppm` through a temp directory.
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    const DPI: u32 = 144;

    pub async fn check_ready(&self) -> Result<(), AppError> {
        let output = Command::new("pdftoppm")
            .arg("-v")
            .output()
            .await
            .map_err(|e| {
                AppError::ConversionFailed(format!(
                    "pdftoppm not available (install poppler-utils): {e}"
                ))
            })?;
        // pdftoppm -v prints its version to stderr and exits 0 or 99
        if output.status.success() || !output.stderr.is_empty() {
            Ok(())
        } else {
            Err(AppError::ConversionFailed(
                "pdftoppm did not report a version".to_string(),
            ))
        }
    }
}

#[async_trait]
impl PdfRenderer for PdftoppmRenderer {
    async fn render_first_page(&self, pdf: &[u8]) -> Result<RenderedPage, AppError> {
        let dir = tempfile::tempdir()
            .map_err(|e| AppError::ConversionFailed(format!("temp dir: {e}")))?;
        let input = dir.path().join("input.pdf");
        tokio::fs::write(&input, pdf)
            .await
            .map_err(|e| AppError::ConversionFailed(format!("writing temp pdf: {e}")))?;

        let prefix = dir.path().join("page");
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg("1")
            .arg("-singlefile")
            .arg("-r")
            .arg(Self::DPI.to_string())
            .arg(&input)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AppError::ConversionFailed(
                        "pdftoppm not found (install poppler-utils)".to_string(),
                    )
                } else {
                    AppError::ConversionFailed(format!("pdftoppm failed to start: {e}"))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ConversionFailed(format!(
                "pdftoppm exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let image = tokio::fs::read(prefix.with_extension("png"))
            .await
            .map_err(|_| {
                AppError::ConversionFailed(
                    "conversion finished but no image was produced".to_string(),
                )
            })?;
        if image.is_empty() {
            return Err(AppError::ConversionFailed(
                "conversion produced an empty image".to_string(),
            ));
        }

        Ok(RenderedPage {
            file_name: "resume-page-1.png".to_string(),
            content_type: "image/png",
            bytes: Bytes::from(image),
        })
    }
}
