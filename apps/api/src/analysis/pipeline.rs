//! The upload-to-analysis pipeline.
//!
//! Strictly ordered: upload source → render page one → upload image →
//! generate id → invoke AI → sanitize → persist. Each step is an await
//! point; the first failure aborts everything after it and surfaces a
//! user-facing description. A record only becomes durable once its feedback
//! has parsed cleanly, so the store never holds a record with null feedback.
//!
//! Uploaded blobs from steps 1–3 are not rolled back on a later failure;
//! orphan cleanup belongs to the blob store's lifecycle tooling.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::prompts::feedback_instructions;
use crate::analysis::sanitize::sanitize;
use crate::analysis::status::{FailureKind, PipelineStatus};
use crate::errors::AppError;
use crate::models::analysis::{storage_key, AnalysisRecord, AnalysisRequest};
use crate::services::ai::{ChatMessage, ChatOptions, ContentPart};
use crate::services::blob::UploadFile;
use crate::services::Services;

/// Drives one analysis run. Instances are cheap and single-use: every
/// submission gets its own pipeline with its own status channel, so
/// concurrent runs share nothing but the external stores.
pub struct AnalysisPipeline {
    services: Arc<Services>,
    status: watch::Sender<PipelineStatus>,
}

impl AnalysisPipeline {
    pub fn new(services: Arc<Services>) -> Self {
        let (status, _) = watch::channel(PipelineStatus::Idle);
        Self { services, status }
    }

    /// Observe status transitions for this pipeline instance.
    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }

    fn advance(&self, next: PipelineStatus) {
        if self.status.borrow().can_transition_to(&next) {
            info!(status = %next.message(), "pipeline status");
            self.status.send_replace(next);
        }
    }

    /// Runs the full workflow and returns the id of the persisted record.
    pub async fn run(&self, request: AnalysisRequest) -> Result<Uuid, AppError> {
        match self.run_inner(request).await {
            Ok(id) => {
                self.advance(PipelineStatus::Succeeded);
                Ok(id)
            }
            Err(e) => {
                if let AppError::FeedbackParse(parse) = &e {
                    error!(raw = %parse.raw, "raw AI text that failed to parse");
                }
                error!("analysis pipeline failed: {e}");
                self.advance(PipelineStatus::Failed {
                    kind: FailureKind::from(&e),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_inner(&self, request: AnalysisRequest) -> Result<Uuid, AppError> {
        request.validate()?;

        // 1. Upload the original resume.
        self.advance(PipelineStatus::Uploading);
        let resume_path = self
            .services
            .blobs
            .upload(UploadFile {
                file_name: request.file_name.clone(),
                content_type: "application/pdf".to_string(),
                bytes: request.file.clone(),
            })
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        // 2. Render page one to an image.
        self.advance(PipelineStatus::Converting);
        let page = self.services.renderer.render_first_page(&request.file).await?;
        if page.bytes.is_empty() {
            return Err(AppError::ConversionFailed(
                "conversion finished but produced no image".to_string(),
            ));
        }

        // 3. Upload the rendered image.
        self.advance(PipelineStatus::UploadingImage);
        let image_path = self
            .services
            .blobs
            .upload(UploadFile {
                file_name: page.file_name,
                content_type: page.content_type.to_string(),
                bytes: page.bytes,
            })
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        // 4. Identifier for the record, the store key, and the result route.
        let id = Uuid::new_v4();

        // 5. Ask the AI for feedback on the uploaded resume.
        self.advance(PipelineStatus::Analyzing);
        let instructions =
            feedback_instructions(&request.job_title, &request.job_description);
        let message = ChatMessage::user(vec![
            ContentPart::File {
                locator: resume_path.clone(),
            },
            ContentPart::Text { text: instructions },
        ]);
        let response = self
            .services
            .chat
            .invoke(vec![message], ChatOptions::default())
            .await?;
        if response.message.content.is_empty() {
            return Err(AppError::AiInvocationFailed(
                "AI returned an empty message".to_string(),
            ));
        }

        // 6. Sanitize. A parse failure aborts before anything is written.
        let feedback = sanitize(&response.message.content)?;

        let record = AnalysisRecord {
            id,
            resume_path,
            image_path,
            company_name: request.company_name,
            job_title: request.job_title,
            job_description: request.job_description,
            feedback: Some(feedback),
            created_at: Utc::now(),
        };

        // 7. Persist the fully-populated record in one write.
        self.advance(PipelineStatus::Persisting);
        let serialized = serde_json::to_string(&record)
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;
        self.services
            .kv
            .set(&storage_key(id), &serialized)
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

        Ok(id)
    }
}
