//! TOML configuration for the trainer

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Answer recorded for a question whose countdown ran out.
pub const TIMEOUT_ANSWER: &str = "(시간 초과)";

/// Top-level configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// Knobs for the test session and its timers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizConfig {
    /// Upper bound on questions drawn for one session.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Countdown per question before it counts as a timeout.
    #[serde(default = "default_answer_timeout_ms")]
    pub answer_timeout_ms: u64,
    /// Pause after an answer so the feedback stays visible.
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_timeout_answer")]
    pub timeout_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportConfig {
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: char,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("wordcard.db")
}
fn default_max_questions() -> usize {
    400
}
fn default_answer_timeout_ms() -> u64 {
    5000
}
fn default_feedback_delay_ms() -> u64 {
    1500
}
fn default_timeout_answer() -> String {
    TIMEOUT_ANSWER.to_string()
}
fn default_csv_delimiter() -> char {
    ','
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            quiz: QuizConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            answer_timeout_ms: default_answer_timeout_ms(),
            feedback_delay_ms: default_feedback_delay_ms(),
            timeout_answer: default_timeout_answer(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            csv_delimiter: default_csv_delimiter(),
        }
    }
}

impl QuizConfig {
    pub fn answer_timeout(&self) -> Duration {
        Duration::from_millis(self.answer_timeout_ms)
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}

impl ImportConfig {
    /// The delimiter as the single byte the csv crate expects.
    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.csv_delimiter as u8
    }
}

impl AppConfig {
    /// Parse and validate configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiz.max_questions == 0 {
            return Err(Error::Config("quiz.max_questions must be at least 1".into()));
        }
        if self.quiz.answer_timeout_ms == 0 {
            return Err(Error::Config("quiz.answer_timeout_ms must be positive".into()));
        }
        if self.quiz.timeout_answer.trim().is_empty() {
            return Err(Error::Config("quiz.timeout_answer must not be empty".into()));
        }
        if !self.import.csv_delimiter.is_ascii() {
            return Err(Error::Config(format!(
                "import.csv_delimiter must be a single ASCII character, got '{}'",
                self.import.csv_delimiter
            )));
        }
        Ok(())
    }
}
