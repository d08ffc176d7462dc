// Public API - what other modules can use
pub use catalog::{
    parse_quiz_set, quiz_set_for_language, CatalogError, FileQuizCatalog, InMemoryQuizCatalog,
    QuizCatalog,
};
pub use models::{Quiz, QuizPayload, DEFAULT_TIMEOUT_SECS};

// Internal modules
mod catalog;
mod models;
