use serde_json::Value;

use crate::services::chat::{AiError, ChatService, OutputMode};
use crate::services::json_extract::parse_model_json;

const INTERPRET_TEMPERATURE: f64 = 0.0;

pub(crate) const DEFAULT_QUERY_LIMIT: i64 = 10;

const INTERPRET_PROMPT: &str = r#"You are an academic dashboard assistant.

Convert the faculty question into structured JSON.

Question:
{question}

Return JSON ONLY:

{
 "intent": "top_performers | batch_insight",
 "subject": "python/java/dsa/aptitude/unknown",
 "limit": number_or_10_default
}
"#;

/// Recognized analytics intents. Anything else the model produces is carried through
/// unchanged so the orchestrator can answer with its fallback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryIntent {
    TopPerformers,
    BatchInsight,
    Other(String),
}

impl QueryIntent {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "top_performers" => QueryIntent::TopPerformers,
            "batch_insight" => QueryIntent::BatchInsight,
            other => QueryIntent::Other(other.to_string()),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            QueryIntent::TopPerformers => "top_performers",
            QueryIntent::BatchInsight => "batch_insight",
            QueryIntent::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InterpretedQuery {
    pub(crate) intent: QueryIntent,
    pub(crate) subject: Option<String>,
    pub(crate) limit: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct QueryInterpreter {
    chat: ChatService,
}

impl QueryInterpreter {
    pub(crate) fn new(chat: ChatService) -> Self {
        Self { chat }
    }

    pub(crate) async fn interpret(&self, question: &str) -> Result<InterpretedQuery, AiError> {
        let prompt = INTERPRET_PROMPT.replace("{question}", question);
        let raw = self
            .chat
            .complete("interpret", &prompt, INTERPRET_TEMPERATURE, OutputMode::JsonObject)
            .await?;
        parse_interpretation(&raw)
    }
}

pub(crate) fn parse_interpretation(raw: &str) -> Result<InterpretedQuery, AiError> {
    let value = parse_model_json(raw).map_err(|err| AiError::Malformed(err.to_string()))?;

    let intent = value
        .get("intent")
        .and_then(Value::as_str)
        .map(QueryIntent::from_raw)
        .ok_or_else(|| AiError::Malformed("missing intent field".to_string()))?;

    let subject = value.get("subject").and_then(Value::as_str).map(str::to_string);

    let limit = value
        .get("limit")
        .and_then(|entry| entry.as_i64().or_else(|| entry.as_f64().map(|number| number as i64)))
        .unwrap_or(DEFAULT_QUERY_LIMIT);

    Ok(InterpretedQuery { intent, subject, limit })
}
