//! Wordcard Core - English/Korean vocabulary flashcard trainer
//!
//! Word list management, file import/export, SQLite persistence and the
//! four-choice quiz engine with its per-question countdown.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod questions;
pub mod session;
pub mod store;
pub mod timer;
pub mod words;

#[cfg(feature = "python")]
mod python;

pub use config::{AppConfig, ImportConfig, QuizConfig, TIMEOUT_ANSWER};
pub use engine::{QuizEngine, QuizUpdate};
pub use error::{Error, Result};
pub use export::{encode, ExportFormat, ExportPayload};
pub use history::{recent_first, HistorySummary};
pub use import::{decode, import_file, parse_lines, FileFormat};
pub use questions::{generate_choices, is_filler, CHOICE_COUNT, FILLER_CHOICES};
pub use session::{
    accuracy_percent, AnswerOutcome, Mistake, MistakeReason, Phase, Question, ResultRecord,
    TestSession, MIN_WORDS,
};
pub use store::{MemoryStore, ResultStore, SqliteStore, WordStore};
pub use timer::{Clock, ManualClock, Scheduler, SystemClock, TimerHandle};
pub use words::{ImportSummary, WordEntry, WordList};
