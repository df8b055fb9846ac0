//! Job submission request and its local precondition checks.

use serde::Serialize;

use crate::error::CoreError;

/// Body of a processing job submission.
///
/// Serialized with the service's camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmission {
    /// Storage URLs of the recordings to process.
    pub audio_urls: Vec<String>,
    pub chapter_title: String,
    pub chapter_description: String,
    /// Free-form narrative preferences forwarded to the service.
    pub user_preferences: serde_json::Value,
}

impl JobSubmission {
    pub fn new(
        audio_urls: Vec<String>,
        chapter_title: impl Into<String>,
        chapter_description: impl Into<String>,
    ) -> Self {
        Self {
            audio_urls,
            chapter_title: chapter_title.into(),
            chapter_description: chapter_description.into(),
            user_preferences: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_preferences(mut self, preferences: serde_json::Value) -> Self {
        self.user_preferences = preferences;
        self
    }

    /// Collect every precondition violation.
    ///
    /// Returns an empty `Vec` if the submission may be sent.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.audio_urls.is_empty() {
            problems.push("At least one audio URL is required".to_string());
        }

        for (index, url) in self.audio_urls.iter().enumerate() {
            if url.trim().is_empty() {
                problems.push(format!("Audio URL at position {index} is empty"));
            }
        }

        if self.chapter_title.trim().is_empty() {
            problems.push("Chapter title must not be empty".to_string());
        }

        if self.chapter_description.trim().is_empty() {
            problems.push("Chapter description must not be empty".to_string());
        }

        problems
    }

    /// Check the submission before any network call is made.
    pub fn validate(&self) -> Result<(), CoreError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(problems.join("; ")))
        }
    }
}
