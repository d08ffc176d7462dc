use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::models::Quiz;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Quiz set not found: {0}")]
    NotFound(String),

    #[error("Failed to read quiz set {name}: {reason}")]
    Io { name: String, reason: String },

    #[error("Invalid quiz set: {0}")]
    Invalid(String),
}

/// Source of named, ordered quiz sets
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    async fn load(&self, name: &str) -> Result<Vec<Quiz>, CatalogError>;
}

/// Parses and validates a client-supplied quiz set
pub fn parse_quiz_set(raw: &serde_json::Value) -> Result<Vec<Quiz>, CatalogError> {
    let quizzes: Vec<Quiz> = match raw {
        // Some clients send the set as a JSON string rather than an array
        serde_json::Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    }
    .map_err(|e| CatalogError::Invalid(e.to_string()))?;

    for quiz in &quizzes {
        quiz.validate().map_err(CatalogError::Invalid)?;
    }

    Ok(quizzes)
}

/// Default quiz set for a question language; "0" selects the second set
pub fn quiz_set_for_language(language: Option<&str>) -> &'static str {
    match language {
        Some("0") => "quiz-2",
        _ => "quiz-1",
    }
}

/// Catalog holding pre-registered quiz sets in memory
#[derive(Default)]
pub struct InMemoryQuizCatalog {
    sets: HashMap<String, Vec<Quiz>>,
}

impl InMemoryQuizCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(mut self, name: &str, quizzes: Vec<Quiz>) -> Self {
        self.sets.insert(name.to_string(), quizzes);
        self
    }
}

#[async_trait]
impl QuizCatalog for InMemoryQuizCatalog {
    async fn load(&self, name: &str) -> Result<Vec<Quiz>, CatalogError> {
        self.sets
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }
}

/// Catalog reading `<dir>/<name>.json` files
pub struct FileQuizCatalog {
    dir: PathBuf,
}

impl FileQuizCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, CatalogError> {
        // Names come from clients, keep them inside the catalog directory
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(CatalogError::NotFound(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

#[async_trait]
impl QuizCatalog for FileQuizCatalog {
    #[instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<Vec<Quiz>, CatalogError> {
        let path = self.path_for(name)?;
        debug!(path = %path.display(), "Loading quiz set from file");

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound(name.to_string())
            } else {
                CatalogError::Io {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| CatalogError::Invalid(e.to_string()))?;
        let quizzes = parse_quiz_set(&value)?;

        if quizzes.is_empty() {
            warn!(quiz_set = %name, "Quiz set is empty");
        }
        info!(quiz_set = %name, count = quizzes.len(), "Quiz set loaded");

        Ok(quizzes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Some("0"), "quiz-2")]
    #[case(Some("1"), "quiz-1")]
    #[case(None, "quiz-1")]
    fn test_quiz_set_for_language(#[case] language: Option<&str>, #[case] expected: &str) {
        assert_eq!(quiz_set_for_language(language), expected);
    }

    #[test]
    fn test_parse_quiz_set_accepts_array_and_string() {
        let array = json!([{"id": "q0", "prompt": "?", "options": ["A", "B"], "answer": 0}]);
        assert_eq!(parse_quiz_set(&array).unwrap().len(), 1);

        let text = json!(r#"[{"id":"q0","prompt":"?","options":["A","B"],"answer":1}]"#);
        assert_eq!(parse_quiz_set(&text).unwrap()[0].correct_option_index, 1);
    }

    #[test]
    fn test_parse_quiz_set_rejects_bad_answer() {
        let raw = json!([{"id": "q9", "prompt": "?", "options": ["A"], "answer": 3}]);
        let err = parse_quiz_set(&raw).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(msg) if msg.contains("q9")));
    }

    #[test]
    fn test_parse_quiz_set_rejects_wrong_shape() {
        assert!(parse_quiz_set(&json!({"not": "a list"})).is_err());
    }

    #[tokio::test]
    async fn test_in_memory_catalog() {
        let catalog = InMemoryQuizCatalog::new()
            .with_set("quiz-1", vec![Quiz::new("q0", "?", &["A", "B"], 0)]);

        assert_eq!(catalog.load("quiz-1").await.unwrap().len(), 1);
        assert!(matches!(
            catalog.load("missing").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_catalog_loads_json() {
        let dir = std::env::temp_dir().join(format!("livequiz-catalog-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(
            dir.join("quiz-1.json"),
            r#"[{"id":"q0","prompt":"?","options":["A","B","C"],"answer":2,"timeout":5}]"#,
        )
        .await
        .unwrap();

        let catalog = FileQuizCatalog::new(&dir);
        let quizzes = catalog.load("quiz-1").await.unwrap();
        assert_eq!(quizzes[0].options.len(), 3);
        assert_eq!(quizzes[0].timeout_seconds, Some(5));

        assert!(matches!(
            catalog.load("quiz-9").await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.load("../quiz-1").await,
            Err(CatalogError::NotFound(_))
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
