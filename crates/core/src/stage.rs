//! Coarse stage classification for progress display.
//!
//! Stage and task labels are free text chosen by the processing
//! service. This module buckets them into a handful of phases by
//! substring matching so the UI and logs can show a stable phase name.
//! The result is never used for control decisions.

use serde::Serialize;

/// Phase of the remote pipeline, as far as the labels reveal it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Queued,
    Transcription,
    Analysis,
    Generation,
    Finalizing,
    Unknown,
}

/// Keyword table, checked in order. The first match wins.
const STAGE_KEYWORDS: &[(ProcessingStage, &[&str])] = &[
    (ProcessingStage::Queued, &["queue", "waiting", "initializ", "loading"]),
    (ProcessingStage::Transcription, &["transcri", "whisper", "audio", "download"]),
    (ProcessingStage::Analysis, &["analy", "graph", "extract", "entit"]),
    (ProcessingStage::Generation, &["generat", "narrative", "writing", "chapter", "question"]),
    (ProcessingStage::Finalizing, &["final", "saving", "upload", "complet", "clean"]),
];

impl ProcessingStage {
    /// Classify from the stage label, falling back to the task label.
    pub fn classify(current_stage: &str, current_task: &str) -> Self {
        match Self::match_label(current_stage) {
            Self::Unknown => Self::match_label(current_task),
            stage => stage,
        }
    }

    fn match_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.trim().is_empty() {
            return Self::Unknown;
        }
        STAGE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| label.contains(k)))
            .map(|(stage, _)| *stage)
            .unwrap_or(Self::Unknown)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Transcription => "transcription",
            Self::Analysis => "analysis",
            Self::Generation => "generation",
            Self::Finalizing => "finalizing",
            Self::Unknown => "unknown",
        }
    }
}
