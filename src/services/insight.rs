use crate::services::chat::{AiError, ChatService, OutputMode};
use crate::services::performance::{BatchAnalytics, RankedStudent};

const INSIGHT_TEMPERATURE: f64 = 0.3;

pub(crate) const BATCH_SUMMARY_FALLBACK: &str =
    "Batch performance summary unavailable due to AI service error.";

const STUDENT_SUMMARY_PROMPT: &str = r#"You are an academic performance analyst.

Given a student's concept performance, write a short professional performance summary for faculty.

Data:
{data}

Rules:
- 2 to 3 lines
- Mention strengths
- Mention weaknesses
- Do not repeat numeric scores
- Clear academic tone
"#;

const BATCH_SUMMARY_PROMPT: &str = r#"You are an academic performance analyst.

Generate a concise batch performance summary for faculty.

Batch Data (JSON):
{data}

Rules:
- 2 to 3 lines
- Mention strong areas
- Mention weak or moderate areas
- Professional academic tone
"#;

/// Narrative summaries are regenerated on every call; there is no caching and no
/// idempotence guarantee for repeated requests.
#[derive(Debug, Clone)]
pub(crate) struct InsightGenerator {
    chat: ChatService,
}

impl InsightGenerator {
    pub(crate) fn new(chat: ChatService) -> Self {
        Self { chat }
    }

    pub(crate) async fn summarize_student(
        &self,
        student: &RankedStudent,
    ) -> Result<String, AiError> {
        let data = serde_json::to_string_pretty(student).unwrap_or_default();
        let prompt = STUDENT_SUMMARY_PROMPT.replace("{data}", &data);
        self.chat.complete("student_summary", &prompt, INSIGHT_TEMPERATURE, OutputMode::Text).await
    }

    /// Unlike the student summary, a failed batch summary degrades to a fixed
    /// fallback sentence instead of failing the whole request.
    pub(crate) async fn summarize_batch(&self, analytics: &BatchAnalytics) -> String {
        let data = serde_json::to_string_pretty(analytics).unwrap_or_default();
        let prompt = BATCH_SUMMARY_PROMPT.replace("{data}", &data);

        match self
            .chat
            .complete("batch_summary", &prompt, INSIGHT_TEMPERATURE, OutputMode::Text)
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                tracing::error!(error = %err, "Batch summary generation failed; using fallback");
                BATCH_SUMMARY_FALLBACK.to_string()
            }
        }
    }
}
