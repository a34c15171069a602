use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::db::models::QuestionClassification;

const COLUMNS: &str = "id, question, domain, concept, difficulty, created_at";

pub(crate) type SharedClassificationStore = Arc<dyn ClassificationStore>;

#[derive(Debug)]
pub(crate) enum StoreHealth {
    Healthy,
    Unhealthy(String),
}

/// Classification cache: one record per unique question text, exact-match lookup.
/// Backend is chosen once at startup; there is no runtime migration between them.
#[async_trait]
pub(crate) trait ClassificationStore: Send + Sync {
    async fn find_by_question(
        &self,
        question: &str,
    ) -> anyhow::Result<Option<QuestionClassification>>;

    /// Atomic insert-if-absent. Returns the record that ended up in the store, which
    /// is the existing one when another writer got there first.
    async fn insert_if_absent(
        &self,
        record: QuestionClassification,
    ) -> anyhow::Result<QuestionClassification>;

    async fn health(&self) -> StoreHealth;

    fn backend(&self) -> &'static str;
}

/// Process-local ordered list, used when no external store is configured.
#[derive(Default)]
pub(crate) struct MemoryClassificationStore {
    records: Mutex<Vec<QuestionClassification>>,
}

impl MemoryClassificationStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClassificationStore for MemoryClassificationStore {
    async fn find_by_question(
        &self,
        question: &str,
    ) -> anyhow::Result<Option<QuestionClassification>> {
        let records = self.records.lock().await;
        Ok(records.iter().find(|record| record.question == question).cloned())
    }

    async fn insert_if_absent(
        &self,
        record: QuestionClassification,
    ) -> anyhow::Result<QuestionClassification> {
        let mut records = self.records.lock().await;
        if let Some(existing) = records.iter().find(|entry| entry.question == record.question) {
            return Ok(existing.clone());
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn health(&self) -> StoreHealth {
        StoreHealth::Healthy
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

pub(crate) struct PgClassificationStore {
    pool: PgPool,
}

impl PgClassificationStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassificationStore for PgClassificationStore {
    async fn find_by_question(
        &self,
        question: &str,
    ) -> anyhow::Result<Option<QuestionClassification>> {
        let record = sqlx::query_as::<_, QuestionClassification>(&format!(
            "SELECT {COLUMNS} FROM question_classifications WHERE question = $1"
        ))
        .bind(question)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert_if_absent(
        &self,
        record: QuestionClassification,
    ) -> anyhow::Result<QuestionClassification> {
        sqlx::query(
            "INSERT INTO question_classifications \
             (id, question, domain, concept, difficulty, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (question) DO NOTHING",
        )
        .bind(&record.id)
        .bind(&record.question)
        .bind(&record.domain)
        .bind(&record.concept)
        .bind(&record.difficulty)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        // Re-select so a losing writer observes the winning record.
        let winner = sqlx::query_as::<_, QuestionClassification>(&format!(
            "SELECT {COLUMNS} FROM question_classifications WHERE question = $1"
        ))
        .bind(&record.question)
        .fetch_one(&self.pool)
        .await?;

        Ok(winner)
    }

    async fn health(&self) -> StoreHealth {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => StoreHealth::Healthy,
            Err(err) => StoreHealth::Unhealthy(err.to_string()),
        }
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
