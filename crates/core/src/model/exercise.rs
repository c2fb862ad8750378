use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{CollectionId, ExerciseId, QuestionId};

/// Minimum number of options a multiple-choice question must offer.
pub const MIN_OPTIONS: usize = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("{kind} id cannot be empty")]
    BlankId { kind: &'static str },

    #[error("{field} of {id} cannot be empty")]
    BlankText { field: &'static str, id: String },

    #[error("question {question} needs at least 2 options, found {count}")]
    TooFewOptions { question: QuestionId, count: usize },

    #[error("question {question} marks option {index} correct but only has {options} options")]
    AnswerOutOfRange {
        question: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("exercise {exercise} has no questions")]
    NoQuestions { exercise: ExerciseId },

    #[error("question id {question} appears twice in exercise {exercise}")]
    DuplicateQuestion {
        exercise: ExerciseId,
        question: QuestionId,
    },

    #[error("exercise id {exercise} appears twice")]
    DuplicateExercise { exercise: ExerciseId },

    #[error("collection id {collection} appears twice")]
    DuplicateCollection { collection: CollectionId },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub question_text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer_index: usize,
}

impl Question {
    #[must_use]
    pub fn new(
        id: impl Into<QuestionId>,
        question_text: impl Into<String>,
        options: Vec<String>,
        correct_answer_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            question_text: question_text.into(),
            options,
            correct_answer_index,
        }
    }

    /// The text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options
            .get(self.correct_answer_index)
            .map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns `ContentError` if the question has a blank id or text, fewer than
    /// two options, a blank option, or a correct index outside the options.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.id.is_blank() {
            return Err(ContentError::BlankId { kind: "question" });
        }
        if self.question_text.trim().is_empty() {
            return Err(ContentError::BlankText {
                field: "question text",
                id: self.id.to_string(),
            });
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(ContentError::TooFewOptions {
                question: self.id.clone(),
                count: self.options.len(),
            });
        }
        if self.options.iter().any(|opt| opt.trim().is_empty()) {
            return Err(ContentError::BlankText {
                field: "option",
                id: self.id.to_string(),
            });
        }
        if self.correct_answer_index >= self.options.len() {
            return Err(ContentError::AnswerOutOfRange {
                question: self.id.clone(),
                index: self.correct_answer_index,
                options: self.options.len(),
            });
        }
        Ok(())
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// One reading passage and its questions.
///
/// `reading_markup` is an HTML fragment (paragraphs with emphasis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub title: String,
    #[serde(rename = "readingText")]
    pub reading_markup: String,
    pub questions: Vec<Question>,
}

impl Exercise {
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    /// # Errors
    ///
    /// Returns `ContentError` for a blank id/title, no questions, duplicate
    /// question ids, or any invalid question.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.id.is_blank() {
            return Err(ContentError::BlankId { kind: "exercise" });
        }
        if self.title.trim().is_empty() {
            return Err(ContentError::BlankText {
                field: "title",
                id: self.id.to_string(),
            });
        }
        if self.reading_markup.trim().is_empty() {
            return Err(ContentError::BlankText {
                field: "reading text",
                id: self.id.to_string(),
            });
        }
        if self.questions.is_empty() {
            return Err(ContentError::NoQuestions {
                exercise: self.id.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            question.validate()?;
            if !seen.insert(&question.id) {
                return Err(ContentError::DuplicateQuestion {
                    exercise: self.id.clone(),
                    question: question.id.clone(),
                });
            }
        }
        Ok(())
    }
}

//
// ─── COLLECTION ────────────────────────────────────────────────────────────────
//

/// An ordered group of exercises at one proficiency level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub description: String,
    /// Proficiency label such as "初級" or "中級".
    pub level: String,
    pub exercises: Vec<Exercise>,
}

impl Collection {
    #[must_use]
    pub fn exercise(&self, id: &ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|e| &e.id == id)
    }

    /// Total number of questions across every exercise.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.exercises.iter().map(|e| e.questions.len()).sum()
    }

    /// # Errors
    ///
    /// Returns `ContentError` for a blank id/title, duplicate exercise ids, or
    /// any invalid exercise.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.id.is_blank() {
            return Err(ContentError::BlankId { kind: "collection" });
        }
        if self.title.trim().is_empty() {
            return Err(ContentError::BlankText {
                field: "title",
                id: self.id.to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(self.exercises.len());
        for exercise in &self.exercises {
            exercise.validate()?;
            if !seen.insert(&exercise.id) {
                return Err(ContentError::DuplicateExercise {
                    exercise: exercise.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Validates a whole catalogue.
///
/// Collection ids must be unique, and exercise ids must be unique across all
/// collections since progress records are keyed by exercise id alone.
///
/// # Errors
///
/// Returns the first `ContentError` found.
pub fn validate_catalogue(collections: &[Collection]) -> Result<(), ContentError> {
    let mut collection_ids = HashSet::new();
    let mut exercise_ids = HashSet::new();
    for collection in collections {
        collection.validate()?;
        if !collection_ids.insert(&collection.id) {
            return Err(ContentError::DuplicateCollection {
                collection: collection.id.clone(),
            });
        }
        for exercise in &collection.exercises {
            if !exercise_ids.insert(&exercise.id) {
                return Err(ContentError::DuplicateExercise {
                    exercise: exercise.id.clone(),
                });
            }
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, options: &[&str], correct: usize) -> Question {
        Question::new(
            id,
            "田中さんは何時に起きますか？",
            options.iter().map(ToString::to_string).collect(),
            correct,
        )
    }

    fn exercise(id: &str, questions: Vec<Question>) -> Exercise {
        Exercise {
            id: ExerciseId::new(id),
            title: "友達との会話".into(),
            reading_markup: "<p>田中さんは毎朝七時に起きます。</p>".into(),
            questions,
        }
    }

    fn collection(id: &str, exercises: Vec<Exercise>) -> Collection {
        Collection {
            id: CollectionId::new(id),
            title: "日常生活".into(),
            description: "日常の生活に関する読み物練習".into(),
            level: "初級".into(),
            exercises,
        }
    }

    #[test]
    fn valid_question_passes() {
        let q = question("q1", &["六時", "七時"], 1);
        assert!(q.validate().is_ok());
        assert_eq!(q.correct_option(), Some("七時"));
    }

    #[test]
    fn single_option_is_rejected() {
        let err = question("q1", &["六時"], 0).validate().unwrap_err();
        assert!(matches!(err, ContentError::TooFewOptions { count: 1, .. }));
    }

    #[test]
    fn correct_index_must_be_in_range() {
        let err = question("q1", &["A", "B"], 2).validate().unwrap_err();
        assert!(matches!(
            err,
            ContentError::AnswerOutOfRange {
                index: 2,
                options: 2,
                ..
            }
        ));
    }

    #[test]
    fn blank_option_is_rejected() {
        let err = question("q1", &["A", " "], 0).validate().unwrap_err();
        assert!(matches!(err, ContentError::BlankText { field: "option", .. }));
    }

    #[test]
    fn exercise_requires_questions() {
        let err = exercise("ex", vec![]).validate().unwrap_err();
        assert!(matches!(err, ContentError::NoQuestions { .. }));
    }

    #[test]
    fn exercise_rejects_duplicate_question_ids() {
        let ex = exercise(
            "ex",
            vec![question("q1", &["A", "B"], 0), question("q1", &["C", "D"], 1)],
        );
        let err = ex.validate().unwrap_err();
        assert!(matches!(err, ContentError::DuplicateQuestion { .. }));
    }

    #[test]
    fn collection_rejects_duplicate_exercise_ids() {
        let q = question("q1", &["A", "B"], 0);
        let c = collection(
            "daily-life",
            vec![exercise("ex", vec![q.clone()]), exercise("ex", vec![q])],
        );
        assert!(matches!(
            c.validate().unwrap_err(),
            ContentError::DuplicateExercise { .. }
        ));
    }

    #[test]
    fn catalogue_rejects_duplicate_collection_ids() {
        let q = question("q1", &["A", "B"], 0);
        let all = vec![
            collection("travel", vec![exercise("a", vec![q.clone()])]),
            collection("travel", vec![exercise("b", vec![q])]),
        ];
        assert!(matches!(
            validate_catalogue(&all).unwrap_err(),
            ContentError::DuplicateCollection { .. }
        ));
    }

    #[test]
    fn catalogue_rejects_exercise_ids_shared_between_collections() {
        let q = question("q1", &["A", "B"], 0);
        let all = vec![
            collection("one", vec![exercise("shared", vec![q.clone()])]),
            collection("two", vec![exercise("shared", vec![q])]),
        ];
        assert!(matches!(
            validate_catalogue(&all).unwrap_err(),
            ContentError::DuplicateExercise { .. }
        ));
    }

    #[test]
    fn lookups_find_by_id() {
        let c = collection(
            "daily-life",
            vec![exercise("daily-life-1", vec![question("q1", &["A", "B"], 0)])],
        );
        let ex = c.exercise(&ExerciseId::new("daily-life-1")).unwrap();
        assert!(ex.question(&QuestionId::new("q1")).is_some());
        assert!(ex.question(&QuestionId::new("q9")).is_none());
        assert_eq!(c.question_count(), 1);
    }

    #[test]
    fn deserializes_authoring_field_names() {
        let json = r#"{"id":"q1","question":"何？","options":["A","B"],"correctAnswer":1}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_answer_index, 1);
        assert_eq!(q.question_text, "何？");
    }
}
