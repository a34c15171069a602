use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

/// One cached classification per unique question text. Never mutated after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub(crate) struct QuestionClassification {
    pub(crate) id: String,
    pub(crate) question: String,
    pub(crate) domain: String,
    pub(crate) concept: String,
    pub(crate) difficulty: String,
    #[serde(serialize_with = "serialize_primitive")]
    pub(crate) created_at: PrimitiveDateTime,
}

fn serialize_primitive<S>(value: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&crate::core::time::format_primitive(*value))
}
