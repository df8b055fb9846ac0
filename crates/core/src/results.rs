//! Canonical processing results and the result transformer.
//!
//! Results are produced once, when a session completes. The remote
//! payload is frequently partial, so [`transform`] fills every missing
//! field with its zero value: numbers become `0`, arrays become empty,
//! strings become `""`. A chapter's reading time is derived from its
//! word count when the service omits it.

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::fields::Fields;

/// Reading speed used to derive a chapter's estimated reading time.
pub const WORDS_PER_MINUTE: u64 = 200;

const RESULTS_ENVELOPE: &[&str] = &["results"];

const CHAPTERS: &[&str] = &["chapters"];
const FOLLOW_UP_QUESTIONS: &[&str] = &["followUpQuestions", "follow_up_questions"];
const STORYLINES: &[&str] = &["storylines", "storyline_summaries"];
const GRAPH_SUMMARY: &[&str] = &["graphSummary", "graph_summary"];
const PROCESSING_SUMMARY: &[&str] = &["processingSummary", "processing_summary"];

const ID: &[&str] = &["id"];
const TITLE: &[&str] = &["title"];
const CONTENT: &[&str] = &["content"];
const SUMMARY: &[&str] = &["summary"];
const WORD_COUNT: &[&str] = &["wordCount", "word_count"];
const READING_TIME: &[&str] = &["estimatedReadingTime", "estimated_reading_time"];
const THEMES: &[&str] = &["themes"];
const PEOPLE: &[&str] = &["people", "peopleMentioned", "people_mentioned"];
const PLACES: &[&str] = &["places", "placesMentioned", "places_mentioned"];
const TIME_PERIOD: &[&str] = &["timePeriod", "time_period"];
const SOURCE_RECORDINGS: &[&str] = &["sourceRecordings", "source_recordings"];

const QUESTION: &[&str] = &["question", "text"];
const CATEGORY: &[&str] = &["category"];
const CONTEXT: &[&str] = &["context"];
const PRIORITY: &[&str] = &["priority"];
const RELATED_CHAPTER: &[&str] = &["relatedChapter", "related_chapter"];

const CHAPTER_IDS: &[&str] = &["chapterIds", "chapter_ids"];
const KEY_PEOPLE: &[&str] = &["keyPeople", "key_people"];

const TOTAL_NODES: &[&str] = &["totalNodes", "total_nodes"];
const TOTAL_RELATIONSHIPS: &[&str] = &["totalRelationships", "total_relationships"];
const TOP_THEMES: &[&str] = &["topThemes", "top_themes"];

const TOTAL_RECORDINGS: &[&str] = &["totalRecordings", "total_recordings"];
const TOTAL_DURATION: &[&str] = &["totalDurationSeconds", "total_duration_seconds", "totalDuration", "total_duration"];
const TOTAL_WORDS: &[&str] = &["totalWords", "total_words"];
const CHAPTERS_GENERATED: &[&str] = &["chaptersGenerated", "chapters_generated"];
const QUESTIONS_GENERATED: &[&str] = &["questionsGenerated", "questions_generated"];
const PROCESSING_TIME: &[&str] = &["processingTimeSeconds", "processing_time_seconds", "processingTime", "processing_time"];

/// Everything a completed session produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingResults {
    pub chapters: Vec<Chapter>,
    pub follow_up_questions: Vec<FollowUpQuestion>,
    pub storylines: Vec<Storyline>,
    pub graph_summary: GraphSummary,
    pub processing_summary: ProcessingSummary,
}

/// A generated story chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub word_count: u64,
    /// Minutes, rounded up.
    pub estimated_reading_time: u64,
    pub themes: Vec<String>,
    pub people: Vec<String>,
    pub places: Vec<String>,
    pub time_period: String,
    pub source_recordings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FollowUpQuestion {
    pub id: String,
    pub question: String,
    pub category: String,
    pub context: String,
    pub priority: u64,
    pub related_chapter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Storyline {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub chapter_ids: Vec<String>,
    pub themes: Vec<String>,
    pub key_people: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSummary {
    pub total_nodes: u64,
    pub total_relationships: u64,
    pub people: Vec<String>,
    pub places: Vec<String>,
    pub top_themes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub total_recordings: u64,
    pub total_duration_seconds: f64,
    pub total_words: u64,
    pub chapters_generated: u64,
    pub questions_generated: u64,
    pub processing_time_seconds: f64,
}

/// Transform a raw results payload into canonical [`ProcessingResults`].
///
/// Accepts the results either at the top level or wrapped in a
/// `{"results": {...}}` envelope. Fails only when the payload is not a
/// JSON object.
pub fn transform(raw: &Value) -> Result<ProcessingResults, CoreError> {
    let outer = Fields::new(raw).ok_or_else(|| {
        CoreError::MalformedResponse("results payload must be a JSON object".to_string())
    })?;
    let fields = outer.object(RESULTS_ENVELOPE).unwrap_or(outer);

    Ok(ProcessingResults {
        chapters: objects(fields.array(CHAPTERS)).map(chapter).collect(),
        follow_up_questions: objects(fields.array(FOLLOW_UP_QUESTIONS))
            .map(follow_up_question)
            .collect(),
        storylines: objects(fields.array(STORYLINES)).map(storyline).collect(),
        graph_summary: fields
            .object(GRAPH_SUMMARY)
            .map(graph_summary)
            .unwrap_or_default(),
        processing_summary: fields
            .object(PROCESSING_SUMMARY)
            .map(processing_summary)
            .unwrap_or_default(),
    })
}

/// Reading time in whole minutes, rounded up.
pub fn reading_time_minutes(word_count: u64) -> u64 {
    word_count.div_ceil(WORDS_PER_MINUTE)
}

/// Whitespace-delimited word count.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

fn objects(items: &[Value]) -> impl Iterator<Item = Fields<'_>> {
    items.iter().filter_map(Fields::new)
}

fn chapter(fields: Fields<'_>) -> Chapter {
    let content = fields.string(CONTENT);
    let word_count = fields
        .opt_u64(WORD_COUNT)
        .unwrap_or_else(|| count_words(&content));
    let estimated_reading_time = fields
        .opt_u64(READING_TIME)
        .unwrap_or_else(|| reading_time_minutes(word_count));

    Chapter {
        id: fields.string(ID),
        title: fields.string(TITLE),
        summary: fields.string(SUMMARY),
        word_count,
        estimated_reading_time,
        themes: fields.string_list(THEMES),
        people: fields.string_list(PEOPLE),
        places: fields.string_list(PLACES),
        time_period: fields.string(TIME_PERIOD),
        source_recordings: fields.string_list(SOURCE_RECORDINGS),
        content,
    }
}

fn follow_up_question(fields: Fields<'_>) -> FollowUpQuestion {
    FollowUpQuestion {
        id: fields.string(ID),
        question: fields.string(QUESTION),
        category: fields.string(CATEGORY),
        context: fields.string(CONTEXT),
        priority: fields.u64(PRIORITY),
        related_chapter: fields.string(RELATED_CHAPTER),
    }
}

fn storyline(fields: Fields<'_>) -> Storyline {
    Storyline {
        id: fields.string(ID),
        title: fields.string(TITLE),
        summary: fields.string(SUMMARY),
        chapter_ids: fields.string_list(CHAPTER_IDS),
        themes: fields.string_list(THEMES),
        key_people: fields.string_list(KEY_PEOPLE),
    }
}

fn graph_summary(fields: Fields<'_>) -> GraphSummary {
    GraphSummary {
        total_nodes: fields.u64(TOTAL_NODES),
        total_relationships: fields.u64(TOTAL_RELATIONSHIPS),
        people: fields.string_list(PEOPLE),
        places: fields.string_list(PLACES),
        top_themes: fields.string_list(TOP_THEMES),
    }
}

fn processing_summary(fields: Fields<'_>) -> ProcessingSummary {
    ProcessingSummary {
        total_recordings: fields.u64(TOTAL_RECORDINGS),
        total_duration_seconds: fields.f64(TOTAL_DURATION),
        total_words: fields.u64(TOTAL_WORDS),
        chapters_generated: fields.u64(CHAPTERS_GENERATED),
        questions_generated: fields.u64(QUESTIONS_GENERATED),
        processing_time_seconds: fields.f64(PROCESSING_TIME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(0), 0);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(reading_time_minutes(1000), 5);
    }

    #[test]
    fn chapter_with_only_content_derives_counts() {
        let raw = json!({"chapters": [{"content": words(200)}]});
        let results = transform(&raw).unwrap();
        let chapter = &results.chapters[0];
        assert_eq!(chapter.word_count, 200);
        assert_eq!(chapter.estimated_reading_time, 1);
        assert_eq!(chapter.title, "");
        assert!(chapter.themes.is_empty());
    }

    #[test]
    fn explicit_counts_are_kept() {
        let raw = json!({"chapters": [{
            "content": words(10),
            "wordCount": 900,
            "estimated_reading_time": 7
        }]});
        let chapter = &transform(&raw).unwrap().chapters[0];
        assert_eq!(chapter.word_count, 900);
        assert_eq!(chapter.estimated_reading_time, 7);
    }

    #[test]
    fn reading_time_derived_from_explicit_word_count() {
        let raw = json!({"chapters": [{"word_count": 450}]});
        let chapter = &transform(&raw).unwrap().chapters[0];
        assert_eq!(chapter.estimated_reading_time, 3);
    }

    #[test]
    fn empty_payload_yields_defaults() {
        let results = transform(&json!({})).unwrap();
        assert_eq!(results, ProcessingResults::default());
    }

    #[test]
    fn full_payload_is_mapped() {
        let raw = json!({
            "chapters": [{
                "id": "ch-1",
                "title": "Summers at the Lake",
                "content": "We swam every morning.",
                "themes": ["family", "childhood"],
                "people_mentioned": ["Grandma Rose"],
                "timePeriod": "1960s"
            }],
            "followUpQuestions": [{
                "id": "q-1",
                "question": "Who taught you to swim?",
                "category": "people",
                "priority": 2,
                "relatedChapter": "ch-1"
            }],
            "storylines": [{
                "id": "s-1",
                "title": "Growing up",
                "chapter_ids": ["ch-1"],
                "keyPeople": ["Grandma Rose"]
            }],
            "graph_summary": {"totalNodes": 12, "total_relationships": 20, "topThemes": ["family"]},
            "processingSummary": {"totalRecordings": 3, "totalDurationSeconds": 542.5, "total_words": 4100}
        });
        let results = transform(&raw).unwrap();

        let chapter = &results.chapters[0];
        assert_eq!(chapter.id, "ch-1");
        assert_eq!(chapter.word_count, 4);
        assert_eq!(chapter.estimated_reading_time, 1);
        assert_eq!(chapter.people, vec!["Grandma Rose"]);
        assert_eq!(chapter.time_period, "1960s");

        let question = &results.follow_up_questions[0];
        assert_eq!(question.question, "Who taught you to swim?");
        assert_eq!(question.priority, 2);
        assert_eq!(question.related_chapter, "ch-1");
        assert_eq!(question.context, "");

        assert_eq!(results.storylines[0].chapter_ids, vec!["ch-1"]);
        assert_eq!(results.graph_summary.total_nodes, 12);
        assert_eq!(results.graph_summary.total_relationships, 20);
        assert_eq!(results.processing_summary.total_recordings, 3);
        assert_eq!(results.processing_summary.total_duration_seconds, 542.5);
        assert_eq!(results.processing_summary.chapters_generated, 0);
    }

    #[test]
    fn results_envelope_is_unwrapped() {
        let raw = json!({"results": {"chapters": [{"title": "One"}]}});
        let results = transform(&raw).unwrap();
        assert_eq!(results.chapters[0].title, "One");
    }

    #[test]
    fn non_object_list_entries_are_skipped() {
        let raw = json!({"chapters": [null, "oops", {"title": "Kept"}]});
        let results = transform(&raw).unwrap();
        assert_eq!(results.chapters.len(), 1);
        assert_eq!(results.chapters[0].title, "Kept");
    }

    #[test]
    fn non_object_payload_is_malformed() {
        assert_matches!(transform(&json!(null)), Err(CoreError::MalformedResponse(_)));
        assert_matches!(transform(&json!([1])), Err(CoreError::MalformedResponse(_)));
    }
}
