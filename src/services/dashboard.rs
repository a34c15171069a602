use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::QuestionClassification;
use crate::repositories::classifications::SharedClassificationStore;
use crate::services::chat::{AiError, ChatService};
use crate::services::classifier::QuestionClassifier;
use crate::services::insight::InsightGenerator;
use crate::services::interpreter::{InterpretedQuery, QueryIntent, QueryInterpreter};
use crate::services::performance::{
    self, BatchAnalytics, BatchReport, RankedReport, RankedStudent, Submission,
};

#[derive(Debug, Error)]
pub(crate) enum DashboardError {
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("classification store error: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug)]
pub(crate) enum QueryOutcome {
    TopPerformers { students: Vec<RankedStudent>, skipped_submissions: usize },
    BatchInsight { analytics: BatchAnalytics, summary: String, skipped_submissions: usize },
    Unrecognized { intent: String },
}

/// Per-request coordinator over classifier, interpreter, analyzer and insight
/// generation. Holds no request state of its own; everything durable lives in the
/// classification store.
#[derive(Clone)]
pub(crate) struct DashboardService {
    classifier: QuestionClassifier,
    interpreter: QueryInterpreter,
    insights: InsightGenerator,
    store: SharedClassificationStore,
}

impl DashboardService {
    pub(crate) fn new(chat: ChatService, store: SharedClassificationStore) -> Self {
        Self {
            classifier: QuestionClassifier::new(chat.clone()),
            interpreter: QueryInterpreter::new(chat.clone()),
            insights: InsightGenerator::new(chat),
            store,
        }
    }

    /// Read-through classification: cached questions never reach the LLM again.
    /// On a concurrent duplicate insert the stored winner is returned.
    pub(crate) async fn analyze_question(
        &self,
        question: &str,
    ) -> Result<QuestionClassification, DashboardError> {
        if let Some(existing) = self.store.find_by_question(question).await? {
            metrics::counter!("classification_cache_total", "result" => "hit").increment(1);
            return Ok(existing);
        }
        metrics::counter!("classification_cache_total", "result" => "miss").increment(1);

        let classified = self.classifier.classify(question).await?;
        let record = QuestionClassification {
            id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            domain: classified.domain,
            concept: classified.concept,
            difficulty: classified.difficulty,
            created_at: primitive_now_utc(),
        };

        let winner = self.store.insert_if_absent(record).await?;
        Ok(winner)
    }

    /// Classifies every submission question not yet in the cache, serially, one LLM
    /// round-trip per distinct unclassified text. A repeated text later in the batch
    /// hits the cache entry inserted mid-loop. Any failure aborts the request here.
    async fn ensure_classified(&self, submissions: &[Submission]) -> Result<usize, DashboardError> {
        let mut newly_classified = 0usize;
        for submission in submissions {
            if self.store.find_by_question(&submission.question).await?.is_none() {
                self.analyze_question(&submission.question).await?;
                newly_classified += 1;
            }
        }
        if newly_classified > 0 {
            tracing::info!(newly_classified, "Classified new submission questions");
        }
        Ok(newly_classified)
    }

    pub(crate) async fn top_performers(
        &self,
        submissions: &[Submission],
        top_n: usize,
    ) -> Result<RankedReport, DashboardError> {
        Ok(performance::top_performers(self.store.as_ref(), submissions, top_n).await?)
    }

    /// Student summaries are generated serially; any summary failure propagates and
    /// fails the whole ranking request.
    pub(crate) async fn top_performers_with_insight(
        &self,
        submissions: &[Submission],
        top_n: usize,
    ) -> Result<RankedReport, DashboardError> {
        let mut report = self.top_performers(submissions, top_n).await?;
        for student in &mut report.students {
            let summary = self.insights.summarize_student(student).await?;
            student.summary = Some(summary);
        }
        Ok(report)
    }

    pub(crate) async fn batch_insight(
        &self,
        submissions: &[Submission],
    ) -> Result<(BatchReport, String), DashboardError> {
        let report = performance::batch_insight(self.store.as_ref(), submissions).await?;
        let summary = self.insights.summarize_batch(&report.analytics).await;
        Ok((report, summary))
    }

    /// Full dashboard routing: classify everything, interpret the faculty query,
    /// dispatch to the matching analytics path.
    pub(crate) async fn query(
        &self,
        question: &str,
        submissions: &[Submission],
    ) -> Result<QueryOutcome, DashboardError> {
        self.ensure_classified(submissions).await?;

        let parsed = self.interpreter.interpret(question).await?;
        tracing::debug!(
            intent = parsed.intent.as_str(),
            subject = parsed.subject.as_deref().unwrap_or("-"),
            limit = parsed.limit,
            "Interpreted dashboard query"
        );

        self.dispatch(parsed, submissions).await
    }

    async fn dispatch(
        &self,
        parsed: InterpretedQuery,
        submissions: &[Submission],
    ) -> Result<QueryOutcome, DashboardError> {
        match parsed.intent {
            QueryIntent::TopPerformers => {
                let top_n = usize::try_from(parsed.limit.max(0)).unwrap_or(0);
                let report = self.top_performers_with_insight(submissions, top_n).await?;
                Ok(QueryOutcome::TopPerformers {
                    students: report.students,
                    skipped_submissions: report.skipped_submissions,
                })
            }
            QueryIntent::BatchInsight => {
                let (report, summary) = self.batch_insight(submissions).await?;
                Ok(QueryOutcome::BatchInsight {
                    analytics: report.analytics,
                    summary,
                    skipped_submissions: report.skipped_submissions,
                })
            }
            QueryIntent::Other(intent) => Ok(QueryOutcome::Unrecognized { intent }),
        }
    }
}
