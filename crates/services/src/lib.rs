#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod exercise_service;
pub mod markup;
pub mod progress_store;
pub mod summary;
pub mod verb_quiz;

pub use tutor_core::Clock;

pub use catalog::{ContentRepository, StaticCatalog, VerbCatalog};
pub use error::{CatalogError, ExerciseError, PersistenceError, VerbQuizError};
pub use exercise_service::{ExerciseService, RecordedAnswer, SubmittedExercise};
pub use progress_store::{Listener, ProgressStore, StoreConfig, SubscriptionId};
pub use summary::summarize_collection;
pub use verb_quiz::{VerbQuestion, VerbQuiz, VerbQuizSettings, generate_questions};
