use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Largest accepted resume upload.
pub const MAX_PDF_BYTES: usize = 20 * 1024 * 1024;

/// Key under which an analysis record is persisted in the key-value store.
pub fn storage_key(id: Uuid) -> String {
    format!("resume:{id}")
}

/// One analysis submission: form fields plus the selected PDF.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file_name: String,
    pub file: Bytes,
}

impl AnalysisRequest {
    /// Checked before the pipeline starts; a request that fails here never
    /// reaches the blob store.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.company_name.trim().is_empty() {
            return Err(AppError::Validation("company name cannot be empty".to_string()));
        }
        if self.job_title.trim().is_empty() {
            return Err(AppError::Validation("job title cannot be empty".to_string()));
        }
        if self.file.is_empty() {
            return Err(AppError::Validation("a resume file is required".to_string()));
        }
        if self.file.len() > MAX_PDF_BYTES {
            return Err(AppError::Validation(format!(
                "resume exceeds the {} MiB limit",
                MAX_PDF_BYTES / (1024 * 1024)
            )));
        }
        if !self.file.starts_with(b"%PDF-") {
            return Err(AppError::Validation("resume must be a PDF file".to_string()));
        }
        Ok(())
    }
}

/// The persisted unit: one analysis run. Written exactly once by the
/// pipeline; the read path never mutates it.
///
/// Serialized with camelCase keys to keep the stored wire format compatible
/// with records written by earlier versions of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    /// Null until the AI step succeeds; replaced atomically as a whole value.
    pub feedback: Option<FeedbackRecord>,
    pub created_at: DateTime<Utc>,
}

/// Sanitized AI feedback. Every score is an integer in [0, 100]; the
/// sanitizer rejects anything outside that range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub overall_score: u8,
    pub tone_style_score: u8,
    pub content_score: u8,
    pub structure_score: u8,
    pub skills_score: u8,
    pub improvement_tips: Vec<String>,
    pub missing_keywords: Vec<String>,
}

impl FeedbackRecord {
    /// Score fields paired with their wire names, for range validation and
    /// diagnostics.
    pub fn scores(&self) -> [(&'static str, u8); 5] {
        [
            ("overallScore", self.overall_score),
            ("toneStyleScore", self.tone_style_score),
            ("contentScore", self.content_score),
            ("structureScore", self.structure_score),
            ("skillsScore", self.skills_score),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn valid_request() -> AnalysisRequest {
        AnalysisRequest {
            company_name: "Google".to_string(),
            job_title: "Backend Developer".to_string(),
            job_description: "Build and run distributed services.".to_string(),
            file_name: "resume.pdf".to_string(),
            file: Bytes::from_static(b"%PDF-1.7 fake resume body"),
        }
    }

    #[test]
    fn test_valid_request_passes_validation() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_empty_company_name_is_rejected() {
        let mut request = valid_request();
        request.company_name = "  ".to_string();
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_empty_job_title_is_rejected() {
        let mut request = valid_request();
        request.job_title = String::new();
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_empty_job_description_is_allowed() {
        let mut request = valid_request();
        request.job_description = String::new();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_non_pdf_payload_is_rejected() {
        let mut request = valid_request();
        request.file = Bytes::from_static(b"PK\x03\x04 this is a zip");
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let mut request = valid_request();
        let mut big = b"%PDF-".to_vec();
        big.resize(MAX_PDF_BYTES + 1, 0u8);
        request.file = Bytes::from(big);
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_storage_key_uses_resume_prefix() {
        let id = Uuid::new_v4();
        assert_eq!(storage_key(id), format!("resume:{id}"));
    }

    #[test]
    fn test_record_serializes_with_camel_case_keys() {
        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            resume_path: "uploads/a/resume.pdf".to_string(),
            image_path: "uploads/b/page.png".to_string(),
            company_name: "Google".to_string(),
            job_title: "Backend Developer".to_string(),
            job_description: String::new(),
            feedback: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"resumePath\""));
        assert!(json.contains("\"imagePath\""));
        assert!(json.contains("\"companyName\""));
        assert!(json.contains("\"feedback\":null"));
    }

    #[test]
    fn test_feedback_round_trips_through_json() {
        let feedback = FeedbackRecord {
            overall_score: 85,
            tone_style_score: 80,
            content_score: 78,
            structure_score: 90,
            skills_score: 70,
            improvement_tips: vec!["Quantify your impact".to_string()],
            missing_keywords: vec!["Kubernetes".to_string()],
        };
        let json = serde_json::to_string(&feedback).unwrap();
        assert!(json.contains("\"overallScore\":85"));
        let back: FeedbackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, feedback);
    }

    /// 10,000 generated identifiers must not collide.
    #[test]
    fn test_generated_ids_do_not_collide() {
        let ids: HashSet<Uuid> = (0..10_000).map(|_| Uuid::new_v4()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
