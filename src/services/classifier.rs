use serde::{Deserialize, Serialize};

use crate::services::chat::{AiError, ChatService, OutputMode};
use crate::services::json_extract::parse_model_json;

const CLASSIFY_TEMPERATURE: f64 = 0.0;

const CLASSIFY_PROMPT: &str = r#"You are an academic question classifier.

Analyze the following question and return STRICT JSON only.

Question:
{question}

Return ONLY JSON:
{
  "domain": "Python / Java / DSA / Aptitude / SQL / Other",
  "concept": "specific topic",
  "difficulty": "Easy / Medium / Hard"
}
"#;

/// Canonical concept mapping. Keys are compared against the lower-cased, trimmed
/// concept the model returned; the table is applied to model output only, never to
/// cached question lookups.
const CONCEPT_ALIASES: &[(&str, &str)] = &[
    ("oop", "OOP"),
    ("object oriented programming", "OOP"),
    ("object-oriented programming", "OOP"),
    ("object-oriented programming (oop) principles", "OOP"),
    ("classes and objects", "OOP"),
    ("inheritance", "OOP"),
    ("polymorphism", "OOP"),
    ("encapsulation", "OOP"),
    ("object-oriented programming (inheritance)", "OOP"),
    ("oop principles", "OOP"),
    ("inheritance concept", "OOP"),
    ("oop inheritance", "OOP"),
    ("loops", "Loops"),
    ("loop", "Loops"),
    ("for loop", "Loops"),
    ("while loop", "Loops"),
    ("control structures", "Loops"),
    ("list comprehension", "List Comprehension"),
    ("lists", "List Comprehension"),
    ("recursion", "Recursion"),
    ("functions", "Functions"),
    ("strings", "Strings"),
    ("arrays", "Arrays"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Classification {
    pub(crate) domain: String,
    pub(crate) concept: String,
    pub(crate) difficulty: String,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionClassifier {
    chat: ChatService,
}

impl QuestionClassifier {
    pub(crate) fn new(chat: ChatService) -> Self {
        Self { chat }
    }

    /// One LLM round-trip turning raw question text into a classification with a
    /// canonicalized concept label. Failures are never retried.
    pub(crate) async fn classify(&self, question: &str) -> Result<Classification, AiError> {
        let prompt = CLASSIFY_PROMPT.replace("{question}", question);
        let raw = self
            .chat
            .complete("classify", &prompt, CLASSIFY_TEMPERATURE, OutputMode::JsonObject)
            .await?;

        let mut classification = parse_classification(&raw)?;
        classification.concept = normalize_concept(&classification.concept);
        Ok(classification)
    }
}

pub(crate) fn parse_classification(raw: &str) -> Result<Classification, AiError> {
    let value = parse_model_json(raw).map_err(|err| AiError::Malformed(err.to_string()))?;
    serde_json::from_value(value).map_err(|err| AiError::Malformed(err.to_string()))
}

pub(crate) fn normalize_concept(concept: &str) -> String {
    let key = concept.trim().to_lowercase();
    for (alias, canonical) in CONCEPT_ALIASES {
        if *alias == key {
            return (*canonical).to_string();
        }
    }
    title_case(concept.trim())
}

fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_alphabetic = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_alphabetic {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            prev_alphabetic = true;
        } else {
            result.push(ch);
            prev_alphabetic = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_concept_maps_aliases() {
        assert_eq!(normalize_concept("oop"), "OOP");
        assert_eq!(normalize_concept("Inheritance"), "OOP");
        assert_eq!(normalize_concept("  POLYMORPHISM  "), "OOP");
        assert_eq!(normalize_concept("for loop"), "Loops");
        assert_eq!(normalize_concept("control structures"), "Loops");
        assert_eq!(normalize_concept("lists"), "List Comprehension");
        assert_eq!(normalize_concept("recursion"), "Recursion");
    }

    #[test]
    fn normalize_concept_title_cases_unmapped() {
        assert_eq!(normalize_concept("dynamic programming"), "Dynamic Programming");
        assert_eq!(normalize_concept("  binary SEARCH trees "), "Binary Search Trees");
        assert_eq!(normalize_concept("object-oriented design"), "Object-Oriented Design");
    }

    #[test]
    fn parse_classification_accepts_strict_json() {
        let raw = r#"{"domain": "Python", "concept": "loops", "difficulty": "Easy"}"#;
        let parsed = parse_classification(raw).unwrap();
        assert_eq!(parsed.domain, "Python");
        assert_eq!(parsed.concept, "loops");
        assert_eq!(parsed.difficulty, "Easy");
    }

    #[test]
    fn parse_classification_accepts_prose_wrapped_json() {
        let raw = "Here is the result:\n{\"domain\": \"DSA\", \"concept\": \"recursion\", \"difficulty\": \"Hard\"}";
        let parsed = parse_classification(raw).unwrap();
        assert_eq!(parsed.domain, "DSA");
    }

    #[test]
    fn parse_classification_rejects_missing_keys() {
        let raw = r#"{"domain": "Python", "concept": "loops"}"#;
        assert!(matches!(parse_classification(raw), Err(AiError::Malformed(_))));
    }

    #[test]
    fn parse_classification_rejects_prose() {
        assert!(matches!(
            parse_classification("I could not classify this question."),
            Err(AiError::Malformed(_))
        ));
    }
}
