mod exercise;
mod ids;
mod progress;
mod verb;

pub use exercise::{Collection, ContentError, Exercise, MIN_OPTIONS, Question, validate_catalogue};
pub use ids::{CollectionId, ExerciseId, QuestionId};
pub use progress::{CollectionProgress, ExerciseCompletion, ProgressState, UserAnswer};
pub use verb::{ConjugationForm, UnknownFormError, Verb, VerbConjugation, VerbGroup};
