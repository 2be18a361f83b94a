//! Pipeline progress as a closed set of states.
//!
//! The UI layer only renders the current state's message; it never drives
//! transitions. Transitions move strictly forward, and `Succeeded` /
//! `Failed` are terminal.

/// What went wrong, when a run ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Upload,
    Conversion,
    AiInvocation,
    FeedbackParse,
    Persistence,
    Internal,
}

impl From<&crate::errors::AppError> for FailureKind {
    fn from(error: &crate::errors::AppError) -> Self {
        use crate::errors::AppError;
        match error {
            AppError::Validation(_) => FailureKind::Validation,
            AppError::UploadFailed(_) => FailureKind::Upload,
            AppError::ConversionFailed(_) => FailureKind::Conversion,
            AppError::AiInvocationFailed(_) => FailureKind::AiInvocation,
            AppError::FeedbackParse(_) => FailureKind::FeedbackParse,
            AppError::PersistenceFailed(_) => FailureKind::Persistence,
            _ => FailureKind::Internal,
        }
    }
}

/// Progress of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStatus {
    Idle,
    Uploading,
    Converting,
    UploadingImage,
    Analyzing,
    Persisting,
    Succeeded,
    Failed { kind: FailureKind, message: String },
}

impl PipelineStatus {
    /// Human-readable progress line shown while a run is in flight.
    pub fn message(&self) -> String {
        match self {
            PipelineStatus::Idle => "Ready".to_string(),
            PipelineStatus::Uploading => "Uploading resume...".to_string(),
            PipelineStatus::Converting => "Converting to image...".to_string(),
            PipelineStatus::UploadingImage => "Uploading the image...".to_string(),
            PipelineStatus::Analyzing => "AI is analyzing...".to_string(),
            PipelineStatus::Persisting => "Saving results...".to_string(),
            PipelineStatus::Succeeded => "Analysis complete!".to_string(),
            PipelineStatus::Failed { message, .. } => message.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PipelineStatus::Idle => 0,
            PipelineStatus::Uploading => 1,
            PipelineStatus::Converting => 2,
            PipelineStatus::UploadingImage => 3,
            PipelineStatus::Analyzing => 4,
            PipelineStatus::Persisting => 5,
            PipelineStatus::Succeeded => 6,
            PipelineStatus::Failed { .. } => 7,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Succeeded | PipelineStatus::Failed { .. }
        )
    }

    /// Whether `next` is a legal successor: one step forward through the
    /// workflow, or a jump to `Failed` from any non-terminal state.
    pub fn can_transition_to(&self, next: &PipelineStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, PipelineStatus::Failed { .. }) {
            return true;
        }
        next.rank() == self.rank() + 1
    }
}
