//! Answer correctness, exercise scores and completion.
//!
//! Everything here is pure; the progress store only records what these
//! functions produce.

use std::collections::HashSet;

use crate::model::{ExerciseCompletion, ExerciseId, Question, QuestionId, UserAnswer};

/// Whether `selected` is the question's correct option.
#[must_use]
pub fn is_answer_correct(question: &Question, selected: usize) -> bool {
    question.correct_answer_index == selected
}

/// Builds the record for a learner selecting option `selected`.
#[must_use]
pub fn create_user_answer(
    exercise_id: &ExerciseId,
    question: &Question,
    selected: usize,
) -> UserAnswer {
    UserAnswer {
        exercise_id: exercise_id.clone(),
        question_id: question.id.clone(),
        selected_answer_index: selected,
        is_correct: is_answer_correct(question, selected),
    }
}

/// Number of questions whose answer (matched by question id) is correct.
///
/// Unanswered questions count as zero; answers for unknown questions are
/// ignored.
#[must_use]
pub fn calculate_score(questions: &[Question], answers: &[UserAnswer]) -> u32 {
    let correct: HashSet<&QuestionId> = answers
        .iter()
        .filter(|a| a.is_correct)
        .map(|a| &a.question_id)
        .collect();
    let hits = questions.iter().filter(|q| correct.contains(&q.id)).count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// Scores an exercise. `completed` requires every question to be correct.
#[must_use]
pub fn create_exercise_completion(
    exercise_id: &ExerciseId,
    questions: &[Question],
    answers: &[UserAnswer],
) -> ExerciseCompletion {
    let score = calculate_score(questions, answers);
    let total_questions = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    ExerciseCompletion {
        exercise_id: exercise_id.clone(),
        completed: score == total_questions,
        score,
        total_questions,
    }
}

#[must_use]
pub fn answered_question_ids(answers: &[UserAnswer]) -> Vec<&QuestionId> {
    answers.iter().map(|a| &a.question_id).collect()
}

/// True when every question has an answer. Vacuously true for no questions.
#[must_use]
pub fn are_all_questions_answered(questions: &[Question], answers: &[UserAnswer]) -> bool {
    let answered: HashSet<&QuestionId> = answered_question_ids(answers).into_iter().collect();
    questions.iter().all(|q| answered.contains(&q.id))
}

/// Questions that still need an answer, in question order.
#[must_use]
pub fn unanswered_questions<'a>(
    questions: &'a [Question],
    answers: &[UserAnswer],
) -> Vec<&'a QuestionId> {
    let answered: HashSet<&QuestionId> = answered_question_ids(answers).into_iter().collect();
    questions
        .iter()
        .filter(|q| !answered.contains(&q.id))
        .map(|q| &q.id)
        .collect()
}

/// `100 * score / total` rounded half up; zero when `total` is zero.
#[must_use]
pub fn percentage_score(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (score, total) = (u64::from(score), u64::from(total));
    let rounded = (200 * score + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Banner shown after an exercise is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Perfect,
    Partial(u32),
}

impl ScoreBand {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 100 {
            Self::Perfect
        } else {
            Self::Partial(percentage)
        }
    }

    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::Perfect => "完璧です！".to_owned(),
            Self::Partial(pct) => format!("{pct}% 正解"),
        }
    }
}
