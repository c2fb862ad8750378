//! Verb conjugation drill: random questions, typed answers, running score.

use rand::Rng;
use rand::seq::IndexedRandom;

use tutor_core::conjugation::{ConjugationCheck, check_conjugation, normalize_japanese_text};
use tutor_core::model::{ConjugationForm, Verb};
use tutor_core::scoring::percentage_score;

use crate::error::VerbQuizError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbQuizSettings {
    pub number_of_questions: usize,
    pub target_forms: Vec<ConjugationForm>,
}

impl Default for VerbQuizSettings {
    fn default() -> Self {
        Self {
            number_of_questions: 10,
            target_forms: ConjugationForm::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbQuestion {
    pub id: String,
    pub verb: Verb,
    pub target_form: ConjugationForm,
    pub correct_answer: String,
}

/// Draws `number_of_questions` random (verb, form) pairs among the pairs the
/// verb data actually has. Repeats are allowed.
///
/// # Errors
///
/// Returns `VerbQuizError::EmptySettings` for zero questions or forms, and
/// `NoCandidates` when no verb has any requested form.
pub fn generate_questions<R: Rng + ?Sized>(
    verbs: &[Verb],
    settings: &VerbQuizSettings,
    rng: &mut R,
) -> Result<Vec<VerbQuestion>, VerbQuizError> {
    if settings.number_of_questions == 0 || settings.target_forms.is_empty() {
        return Err(VerbQuizError::EmptySettings);
    }

    let candidates: Vec<(&Verb, ConjugationForm, &str)> = verbs
        .iter()
        .flat_map(|verb| {
            settings.target_forms.iter().filter_map(move |&form| {
                verb.conjugation(form)
                    .map(|c| (verb, form, c.text.as_str()))
            })
        })
        .collect();
    if candidates.is_empty() {
        return Err(VerbQuizError::NoCandidates);
    }

    let mut questions = Vec::with_capacity(settings.number_of_questions);
    for n in 1..=settings.number_of_questions {
        let Some(&(verb, form, text)) = candidates.choose(rng) else {
            return Err(VerbQuizError::NoCandidates);
        };
        questions.push(VerbQuestion {
            id: format!("q{n}"),
            verb: verb.clone(),
            target_form: form,
            correct_answer: text.to_owned(),
        });
    }
    Ok(questions)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbAnswer {
    pub question_id: String,
    pub given: String,
    pub check: ConjugationCheck,
}

/// A quiz in progress. Questions are answered in order.
#[derive(Debug, Clone)]
pub struct VerbQuiz {
    questions: Vec<VerbQuestion>,
    answers: Vec<VerbAnswer>,
}

impl VerbQuiz {
    #[must_use]
    pub fn new(questions: Vec<VerbQuestion>) -> Self {
        Self {
            questions,
            answers: Vec::new(),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&VerbQuestion> {
        self.questions.get(self.answers.len())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.answers.len() >= self.questions.len()
    }

    /// Checks `input` against the current question and moves on.
    ///
    /// # Errors
    ///
    /// Returns `VerbQuizError::Finished` once every question is answered.
    pub fn answer(&mut self, input: &str) -> Result<&VerbAnswer, VerbQuizError> {
        let question = self.current().ok_or(VerbQuizError::Finished)?;
        let check = check_conjugation(input, &question.verb, question.target_form)
            .unwrap_or_else(|| ConjugationCheck {
                is_correct: normalize_japanese_text(input)
                    == normalize_japanese_text(&question.correct_answer),
                correct_answer: question.correct_answer.clone(),
            });
        let answer = VerbAnswer {
            question_id: question.id.clone(),
            given: input.trim().to_owned(),
            check,
        };
        self.answers.push(answer);
        self.answers.last().ok_or(VerbQuizError::Finished)
    }

    #[must_use]
    pub fn answers(&self) -> &[VerbAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        let correct = self.answers.iter().filter(|a| a.check.is_correct).count();
        u32::try_from(correct).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage_score(self.score(), self.total())
    }
}
