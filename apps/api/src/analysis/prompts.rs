// Prompt constants for the analysis pipeline.

/// Instruction sent alongside the uploaded resume. Replace `{job_title}`
/// and `{job_description}` before sending.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"Analyze this resume for the position of {job_title}.
Job Description: {job_description}.
Provide feedback in JSON format with the following keys:
- overallScore: (0-100)
- toneStyleScore: (0-100)
- contentScore: (0-100)
- structureScore: (0-100)
- skillsScore: (0-100)
- improvementTips: (array of strings)
- missingKeywords: (array of strings)
IMPORTANT: Return ONLY the JSON object."#;

/// Builds the analysis instruction deterministically from the request fields.
pub fn feedback_instructions(job_title: &str, job_description: &str) -> String {
    FEEDBACK_PROMPT_TEMPLATE
        .replace("{job_title}", job_title)
        .replace("{job_description}", job_description)
}
