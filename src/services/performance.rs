use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::repositories::classifications::ClassificationStore;

const STRONG_TOPIC_THRESHOLD: f64 = 70.0;
const WEAK_TOPIC_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Submission {
    pub(crate) student_id: String,
    pub(crate) question: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RankedStudent {
    pub(crate) student_id: String,
    pub(crate) overall_score: f64,
    pub(crate) concept_breakdown: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BatchAnalytics {
    pub(crate) strong_topics: Vec<String>,
    pub(crate) weak_topics: Vec<String>,
    pub(crate) average_scores: BTreeMap<String, f64>,
}

#[derive(Debug)]
pub(crate) struct RankedReport {
    pub(crate) students: Vec<RankedStudent>,
    pub(crate) skipped_submissions: usize,
}

#[derive(Debug)]
pub(crate) struct BatchReport {
    pub(crate) analytics: BatchAnalytics,
    pub(crate) skipped_submissions: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct StudentProfile {
    pub(crate) student_id: String,
    pub(crate) concepts: BTreeMap<String, f64>,
}

#[derive(Debug)]
pub(crate) struct ProfileSet {
    /// Profiles in first-appearance order of the student in the submission list, so
    /// downstream stable sorts keep a deterministic tie order.
    pub(crate) profiles: Vec<StudentProfile>,
    pub(crate) skipped_submissions: usize,
}

/// Single pass over the submissions joining each against the classification cache by
/// exact question text. Submissions whose question has no cached classification do not
/// contribute to any profile; they are only counted in `skipped_submissions`.
pub(crate) async fn build_profiles(
    store: &dyn ClassificationStore,
    submissions: &[Submission],
) -> anyhow::Result<ProfileSet> {
    let mut order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, BTreeMap<String, (u32, u32)>> = HashMap::new();
    let mut concept_by_question: HashMap<String, Option<String>> = HashMap::new();
    let mut skipped = 0usize;

    for submission in submissions {
        let concept = match concept_by_question.get(&submission.question) {
            Some(known) => known.clone(),
            None => {
                let concept = store
                    .find_by_question(&submission.question)
                    .await?
                    .map(|record| record.concept);
                concept_by_question.insert(submission.question.clone(), concept.clone());
                concept
            }
        };

        let Some(concept) = concept else {
            skipped += 1;
            continue;
        };

        if !stats.contains_key(&submission.student_id) {
            order.push(submission.student_id.clone());
        }
        let counts =
            stats.entry(submission.student_id.clone()).or_default().entry(concept).or_insert((0, 0));
        counts.1 += 1;
        if submission.is_correct {
            counts.0 += 1;
        }
    }

    let profiles = order
        .into_iter()
        .map(|student_id| {
            let concepts = stats
                .remove(&student_id)
                .unwrap_or_default()
                .into_iter()
                .map(|(concept, (correct, total))| {
                    let accuracy = if total == 0 {
                        0.0
                    } else {
                        round2(100.0 * f64::from(correct) / f64::from(total))
                    };
                    (concept, accuracy)
                })
                .collect();
            StudentProfile { student_id, concepts }
        })
        .collect();

    Ok(ProfileSet { profiles, skipped_submissions: skipped })
}

/// Ranks students by the unweighted mean of their concept percentages. Students whose
/// every submission was unclassified have an empty profile and are excluded rather
/// than scored as zero.
pub(crate) async fn top_performers(
    store: &dyn ClassificationStore,
    submissions: &[Submission],
    top_n: usize,
) -> anyhow::Result<RankedReport> {
    let profile_set = build_profiles(store, submissions).await?;

    let mut students: Vec<RankedStudent> = profile_set
        .profiles
        .into_iter()
        .filter(|profile| !profile.concepts.is_empty())
        .map(|profile| {
            let overall =
                profile.concepts.values().sum::<f64>() / profile.concepts.len() as f64;
            RankedStudent {
                student_id: profile.student_id,
                overall_score: round2(overall),
                concept_breakdown: profile.concepts,
                summary: None,
            }
        })
        .collect();

    // Stable sort: tied students keep their first-appearance order.
    students.sort_by(|a, b| {
        b.overall_score.partial_cmp(&a.overall_score).unwrap_or(std::cmp::Ordering::Equal)
    });
    students.truncate(top_n);

    Ok(RankedReport { students, skipped_submissions: profile_set.skipped_submissions })
}

/// Batch-wide aggregation: a concept's average is the simple mean over the students
/// who have any score for it; students missing the concept do not contribute a zero.
pub(crate) async fn batch_insight(
    store: &dyn ClassificationStore,
    submissions: &[Submission],
) -> anyhow::Result<BatchReport> {
    let profile_set = build_profiles(store, submissions).await?;

    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for profile in &profile_set.profiles {
        for (concept, score) in &profile.concepts {
            let entry = totals.entry(concept.clone()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }

    let average_scores: BTreeMap<String, f64> = totals
        .into_iter()
        .map(|(concept, (total, count))| (concept, round2(total / count as f64)))
        .collect();

    let strong_topics = average_scores
        .iter()
        .filter(|(_, average)| **average >= STRONG_TOPIC_THRESHOLD)
        .map(|(concept, _)| concept.clone())
        .collect();
    let weak_topics = average_scores
        .iter()
        .filter(|(_, average)| **average <= WEAK_TOPIC_THRESHOLD)
        .map(|(concept, _)| concept.clone())
        .collect();

    Ok(BatchReport {
        analytics: BatchAnalytics { strong_topics, weak_topics, average_scores },
        skipped_submissions: profile_set.skipped_submissions,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::QuestionClassification;
    use crate::repositories::classifications::MemoryClassificationStore;

    fn submission(student_id: &str, question: &str, is_correct: bool) -> Submission {
        Submission {
            student_id: student_id.to_string(),
            question: question.to_string(),
            is_correct,
        }
    }

    async fn seeded_store(entries: &[(&str, &str)]) -> MemoryClassificationStore {
        let store = MemoryClassificationStore::new();
        for (question, concept) in entries {
            store
                .insert_if_absent(QuestionClassification {
                    id: uuid::Uuid::new_v4().to_string(),
                    question: question.to_string(),
                    domain: "Python".to_string(),
                    concept: concept.to_string(),
                    difficulty: "Easy".to_string(),
                    created_at: primitive_now_utc(),
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn profiles_match_correct_over_total() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "q1", false),
            submission("B", "q1", true),
        ];

        let profile_set = build_profiles(&store, &submissions).await.unwrap();
        assert_eq!(profile_set.skipped_submissions, 0);
        assert_eq!(profile_set.profiles.len(), 2);

        let a = &profile_set.profiles[0];
        assert_eq!(a.student_id, "A");
        assert_eq!(a.concepts.get("Loops"), Some(&50.0));

        let b = &profile_set.profiles[1];
        assert_eq!(b.student_id, "B");
        assert_eq!(b.concepts.get("Loops"), Some(&100.0));
    }

    #[tokio::test]
    async fn profile_accuracy_rounds_to_two_decimals() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "q1", false),
            submission("A", "q1", false),
        ];

        let profile_set = build_profiles(&store, &submissions).await.unwrap();
        assert_eq!(profile_set.profiles[0].concepts.get("Loops"), Some(&33.33));
    }

    #[tokio::test]
    async fn unclassified_submissions_are_skipped_and_counted() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "mystery question", true),
            submission("B", "another mystery", false),
        ];

        let profile_set = build_profiles(&store, &submissions).await.unwrap();
        assert_eq!(profile_set.skipped_submissions, 2);
        assert_eq!(profile_set.profiles.len(), 1);
        assert_eq!(profile_set.profiles[0].student_id, "A");
        assert_eq!(profile_set.profiles[0].concepts.len(), 1);
    }

    #[tokio::test]
    async fn top_performers_ranks_descending() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "q1", false),
            submission("B", "q1", true),
        ];

        let report = top_performers(&store, &submissions, 10).await.unwrap();
        let ids: Vec<&str> =
            report.students.iter().map(|student| student.student_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(report.students[0].overall_score, 100.0);
        assert_eq!(report.students[1].overall_score, 50.0);
    }

    #[tokio::test]
    async fn top_performers_truncates_to_limit() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("B", "q1", false),
            submission("C", "q1", true),
        ];

        let report = top_performers(&store, &submissions, 2).await.unwrap();
        assert_eq!(report.students.len(), 2);
    }

    #[tokio::test]
    async fn top_performers_keeps_tie_order_stable() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("C", "q1", true),
            submission("A", "q1", true),
            submission("B", "q1", true),
        ];

        let report = top_performers(&store, &submissions, 10).await.unwrap();
        let ids: Vec<&str> =
            report.students.iter().map(|student| student.student_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn top_performers_excludes_empty_profiles() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("B", "unclassified question", true),
        ];

        let report = top_performers(&store, &submissions, 10).await.unwrap();
        assert_eq!(report.students.len(), 1);
        assert_eq!(report.students[0].student_id, "A");
        assert_eq!(report.skipped_submissions, 1);
    }

    #[tokio::test]
    async fn overall_score_weights_concepts_equally() {
        let store = seeded_store(&[("q1", "Loops"), ("q2", "Recursion")]).await;
        // Loops: 1/1 = 100, Recursion: 1/3 = 33.33; mean is 66.66 regardless of the
        // uneven submission volume.
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "q2", true),
            submission("A", "q2", false),
            submission("A", "q2", false),
        ];

        let report = top_performers(&store, &submissions, 10).await.unwrap();
        assert_eq!(report.students[0].overall_score, 66.66);
    }

    #[tokio::test]
    async fn batch_insight_classifies_strong_and_weak_topics() {
        let store = seeded_store(&[("q_oop", "OOP"), ("q_rec", "Recursion")]).await;
        // OOP averages (100 + 60) / 2 = 80, Recursion averages (0 + 60) / 2 = 30.
        let mut submissions = vec![submission("S1", "q_oop", true), submission("S1", "q_rec", false)];
        for index in 0..5 {
            submissions.push(submission("S2", "q_oop", index < 3));
            submissions.push(submission("S2", "q_rec", index < 3));
        }

        let report = batch_insight(&store, &submissions).await.unwrap();
        assert_eq!(report.analytics.strong_topics, vec!["OOP".to_string()]);
        assert_eq!(report.analytics.weak_topics, vec!["Recursion".to_string()]);
        assert_eq!(report.analytics.average_scores.get("OOP"), Some(&80.0));
        assert_eq!(report.analytics.average_scores.get("Recursion"), Some(&30.0));
    }

    #[tokio::test]
    async fn batch_insight_middle_band_is_neither_strong_nor_weak() {
        let store = seeded_store(&[("q1", "Loops")]).await;
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "q1", false),
        ];

        let report = batch_insight(&store, &submissions).await.unwrap();
        assert!(report.analytics.strong_topics.is_empty());
        assert!(report.analytics.weak_topics.is_empty());
        assert_eq!(report.analytics.average_scores.get("Loops"), Some(&50.0));
    }

    #[tokio::test]
    async fn batch_insight_averages_only_students_with_the_concept() {
        let store = seeded_store(&[("q1", "Loops"), ("q2", "Recursion")]).await;
        // Only A touches Recursion; B must not drag the average down with a zero.
        let submissions = vec![
            submission("A", "q1", true),
            submission("A", "q2", true),
            submission("B", "q1", false),
        ];

        let report = batch_insight(&store, &submissions).await.unwrap();
        assert_eq!(report.analytics.average_scores.get("Recursion"), Some(&100.0));
        assert_eq!(report.analytics.average_scores.get("Loops"), Some(&50.0));
    }

    #[tokio::test]
    async fn boundary_averages_are_classified_inclusively() {
        let store = seeded_store(&[("q_strong", "Strings"), ("q_weak", "Arrays")]).await;
        // Strings: 7/10 = 70 exactly; Arrays: 4/10 = 40 exactly.
        let mut submissions = Vec::new();
        for index in 0..10 {
            submissions.push(submission("A", "q_strong", index < 7));
            submissions.push(submission("A", "q_weak", index < 4));
        }

        let report = batch_insight(&store, &submissions).await.unwrap();
        assert_eq!(report.analytics.strong_topics, vec!["Strings".to_string()]);
        assert_eq!(report.analytics.weak_topics, vec!["Arrays".to_string()]);
    }
}
