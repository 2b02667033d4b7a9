//! Python bindings (feature `python`)

use std::borrow::Cow;
use std::path::Path;

use chrono::Local;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ImportConfig, QuizConfig};
use crate::engine::{QuizEngine, QuizUpdate};
use crate::error::Error;
use crate::export::{encode, ExportFormat};
use crate::import::import_file;
use crate::store::SqliteStore;
use crate::timer::SystemClock;
use crate::words::WordList;

impl From<Error> for PyErr {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(_)
            | Error::DuplicateEntry(_)
            | Error::InsufficientData { .. }
            | Error::ImportFormat(_)
            | Error::UnsupportedFormat(_)
            | Error::NothingToExport
            | Error::Config(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

fn open(db_path: &str) -> PyResult<(SqliteStore, WordList)> {
    let store = SqliteStore::open(Path::new(db_path))?;
    let words = WordList::load(&store)?;
    Ok((store, words))
}

/// Returns a list of (term, definition, tag) tuples.
#[pyfunction]
fn get_all_words(db_path: &str) -> PyResult<Vec<(String, String, String)>> {
    let (_, words) = open(db_path)?;
    Ok(words
        .iter()
        .map(|w| (w.term.clone(), w.definition.clone(), w.tag.clone()))
        .collect())
}

#[pyfunction]
#[pyo3(signature = (db_path, term, definition, tag=""))]
fn add_word(db_path: &str, term: &str, definition: &str, tag: &str) -> PyResult<()> {
    let (mut store, mut words) = open(db_path)?;
    words.add(term, definition, tag)?;
    words.save(&mut store)?;
    Ok(())
}

#[pyfunction]
fn delete_word(db_path: &str, term: &str) -> PyResult<bool> {
    let (mut store, mut words) = open(db_path)?;
    let removed = words.remove(term).is_some();
    words.save(&mut store)?;
    Ok(removed)
}

/// Returns (added, duplicates).
#[pyfunction]
#[pyo3(signature = (db_path, file_path, csv_delimiter=','))]
fn import_words(db_path: &str, file_path: &str, csv_delimiter: char) -> PyResult<(usize, usize)> {
    let config = ImportConfig { csv_delimiter };
    if !csv_delimiter.is_ascii() {
        return Err(PyValueError::new_err("csv_delimiter must be ASCII"));
    }
    let entries = import_file(Path::new(file_path), &config)?;
    let (mut store, mut words) = open(db_path)?;
    let summary = words.merge(entries)?;
    words.save(&mut store)?;
    Ok((summary.added, summary.duplicates))
}

/// Returns (filename, content_type, bytes).
#[pyfunction]
fn export_words(db_path: &str, format: &str) -> PyResult<(String, String, Cow<'static, [u8]>)> {
    let (_, words) = open(db_path)?;
    let payload = encode(
        ExportFormat::parse(format)?,
        words.entries(),
        Local::now().date_naive(),
    )?;
    Ok((
        payload.filename,
        payload.content_type.to_string(),
        Cow::Owned(payload.bytes),
    ))
}

/// A quiz over the words stored in one database.
#[pyclass(name = "QuizSession", unsendable)]
struct PyQuizSession {
    engine: QuizEngine<StdRng, SystemClock>,
    store: SqliteStore,
}

#[pymethods]
impl PyQuizSession {
    #[new]
    #[pyo3(signature = (db_path, max_questions=400))]
    fn new(db_path: &str, max_questions: usize) -> PyResult<Self> {
        let (store, words) = open(db_path)?;
        let config = QuizConfig {
            max_questions,
            ..QuizConfig::default()
        };
        let mut engine = QuizEngine::new(config, StdRng::from_entropy(), SystemClock::new());
        engine.start_session(words.entries())?;
        Ok(Self { engine, store })
    }

    /// (prompt, tag, choices), or None when the queue is used up.
    fn next_question(&mut self) -> PyResult<Option<(String, String, Vec<String>)>> {
        Ok(self
            .engine
            .next_question()?
            .map(|q| (q.prompt, q.tag, q.choices)))
    }

    /// (correct, correct_definition)
    fn submit_answer(&mut self, choice: &str) -> PyResult<(bool, String)> {
        let outcome = self.engine.submit_answer(choice)?;
        Ok((outcome.correct, outcome.correct_definition))
    }

    fn skip_question(&mut self) -> PyResult<Option<(String, String, Vec<String>)>> {
        Ok(self
            .engine
            .skip_question()?
            .map(|q| (q.prompt, q.tag, q.choices)))
    }

    fn remaining_seconds(&self) -> Option<f64> {
        self.engine.remaining_time().map(|d| d.as_secs_f64())
    }

    /// Fire due timers; returns event names ("timeout", "question", "finished").
    fn tick(&mut self) -> PyResult<Vec<&'static str>> {
        Ok(self
            .engine
            .tick()?
            .iter()
            .map(|u| match u {
                QuizUpdate::TimedOut(_) => "timeout",
                QuizUpdate::Question(_) => "question",
                QuizUpdate::Exhausted => "finished",
            })
            .collect())
    }

    /// (correct, wrong, accuracy_percent, total_questions)
    fn end(&mut self) -> PyResult<(usize, usize, u32, usize)> {
        let record = self.engine.end_session(&mut self.store)?;
        Ok((
            record.correct_count,
            record.wrong_count,
            record.accuracy_percent,
            record.total_questions,
        ))
    }

    fn __repr__(&self) -> String {
        match self.engine.session() {
            Some(s) => format!(
                "QuizSession(question={}/{}, correct={}, wrong={})",
                s.position(),
                s.total(),
                s.correct_count(),
                s.wrong_count()
            ),
            None => "QuizSession(idle)".to_string(),
        }
    }
}

/// Wordcard Core Python Module
#[pymodule]
fn wordcard_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(get_all_words, m)?)?;
    m.add_function(wrap_pyfunction!(add_word, m)?)?;
    m.add_function(wrap_pyfunction!(delete_word, m)?)?;
    m.add_function(wrap_pyfunction!(import_words, m)?)?;
    m.add_function(wrap_pyfunction!(export_words, m)?)?;
    m.add_class::<PyQuizSession>()?;
    Ok(())
}
