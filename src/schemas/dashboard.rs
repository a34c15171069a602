use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::QuestionClassification;
use crate::services::performance::{BatchAnalytics, RankedStudent, Submission};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionAnalysisRequest {
    #[validate(length(min = 1, max = 4000, message = "question must be 1..4000 characters"))]
    pub(crate) question: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionAnalysisResponse {
    pub(crate) domain: String,
    pub(crate) concept: String,
    pub(crate) difficulty: String,
}

impl From<QuestionClassification> for QuestionAnalysisResponse {
    fn from(record: QuestionClassification) -> Self {
        Self { domain: record.domain, concept: record.concept, difficulty: record.difficulty }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TopPerformersRequest {
    pub(crate) submissions: Vec<Submission>,
    #[serde(default = "default_top_n")]
    #[validate(range(min = 1, message = "top_n must be at least 1"))]
    pub(crate) top_n: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopPerformersResponse {
    pub(crate) items: Vec<RankedStudent>,
    pub(crate) skipped_submissions: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BatchInsightRequest {
    pub(crate) submissions: Vec<Submission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchInsightResponse {
    pub(crate) analytics: BatchAnalytics,
    pub(crate) summary: String,
    pub(crate) skipped_submissions: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct DashboardQueryRequest {
    #[validate(length(min = 1, max = 2000, message = "question must be 1..2000 characters"))]
    pub(crate) question: String,
    pub(crate) submissions: Vec<Submission>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum DashboardQueryResponse {
    TopPerformers {
        #[serde(rename = "type")]
        kind: &'static str,
        message: &'static str,
        data: Vec<RankedStudent>,
        skipped_submissions: usize,
    },
    BatchInsight {
        #[serde(rename = "type")]
        kind: &'static str,
        message: &'static str,
        analytics: BatchAnalytics,
        summary: String,
        skipped_submissions: usize,
    },
    Unrecognized {
        message: &'static str,
    },
}

impl DashboardQueryResponse {
    pub(crate) fn top_performers(data: Vec<RankedStudent>, skipped_submissions: usize) -> Self {
        Self::TopPerformers {
            kind: "top_performers",
            message: "Top performing students based on overall concept mastery",
            data,
            skipped_submissions,
        }
    }

    pub(crate) fn batch_insight(
        analytics: BatchAnalytics,
        summary: String,
        skipped_submissions: usize,
    ) -> Self {
        Self::BatchInsight {
            kind: "batch_insight",
            message: "Overall batch performance analysis",
            analytics,
            summary,
            skipped_submissions,
        }
    }

    pub(crate) fn unrecognized() -> Self {
        Self::Unrecognized { message: "Unable to understand the query" }
    }
}

fn default_top_n() -> i64 {
    10
}
