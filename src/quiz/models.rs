use serde::{Deserialize, Serialize};

/// Advisory answer window sent to clients when neither the quiz nor the room sets one
pub const DEFAULT_TIMEOUT_SECS: u32 = 20;

/// A single multiple choice question as stored in a quiz set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "answer")]
    pub correct_option_index: usize,
    #[serde(rename = "timeout", default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
}

/// Outbound form of a quiz: the correct answer is stripped and round metadata attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPayload {
    pub id: String,
    pub sequence: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub total: usize,
    pub timeout: u32,
}

impl Quiz {
    pub fn new(id: &str, prompt: &str, options: &[&str], correct_option_index: usize) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option_index,
            timeout_seconds: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Checks that the quiz can actually be answered
    pub fn validate(&self) -> Result<(), String> {
        if self.options.is_empty() {
            return Err(format!("quiz {} has no options", self.id));
        }
        if self.correct_option_index >= self.options.len() {
            return Err(format!(
                "quiz {} answer {} is outside its {} options",
                self.id,
                self.correct_option_index,
                self.options.len()
            ));
        }
        Ok(())
    }

    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_option_index
    }

    /// Builds the client-facing payload for this quiz
    pub fn to_payload(&self, sequence: usize, total: usize, default_timeout: u32) -> QuizPayload {
        QuizPayload {
            id: self.id.clone(),
            sequence,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
            total,
            timeout: self.timeout_seconds.unwrap_or(default_timeout),
        }
    }
}
