//! Quiz engine: one test session plus its countdown and feedback timers
//!
//! Every mutation happens synchronously inside a method call. Timers only
//! take effect when the host calls [`QuizEngine::tick`], so an answer and a
//! countdown can never both land on the same question.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::QuizConfig;
use crate::error::{Error, Result};
use crate::session::{AnswerOutcome, Phase, Question, ResultRecord, TestSession};
use crate::store::ResultStore;
use crate::timer::{Clock, Scheduler, TimerHandle};
use crate::words::WordEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    /// Countdown for the question with this 0-based queue index ran out.
    AnswerTimeout { question: usize },
    /// Feedback pause is over, show the next question.
    Advance,
}

/// What happened during a [`QuizEngine::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizUpdate {
    TimedOut(AnswerOutcome),
    Question(Question),
    /// Queue used up; call [`QuizEngine::end_session`].
    Exhausted,
}

pub struct QuizEngine<R, C> {
    config: QuizConfig,
    rng: R,
    clock: C,
    timers: Scheduler<TimerEvent>,
    countdown: Option<TimerHandle>,
    advance: Option<TimerHandle>,
    words: Vec<WordEntry>,
    session: Option<TestSession>,
}

impl<R: Rng, C: Clock> QuizEngine<R, C> {
    pub fn new(config: QuizConfig, rng: R, clock: C) -> Self {
        Self {
            config,
            rng,
            clock,
            timers: Scheduler::new(),
            countdown: None,
            advance: None,
            words: Vec::new(),
            session: None,
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&TestSession> {
        self.session.as_ref()
    }

    /// `None` while idle.
    pub fn phase(&self) -> Option<Phase> {
        self.session.as_ref().map(TestSession::phase)
    }

    /// Begin a new session over `words`, discarding any session in progress.
    pub fn start_session(&mut self, words: &[WordEntry]) -> Result<()> {
        let session = TestSession::start(words, self.config.max_questions, &mut self.rng)?;
        self.cancel_timers();
        info!(questions = session.total(), pool = words.len(), "test session started");
        self.words = words.to_vec();
        self.session = Some(session);
        Ok(())
    }

    /// Show the next question and arm its countdown. `None` means the
    /// queue is exhausted.
    pub fn next_question(&mut self) -> Result<Option<Question>> {
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        let was_pending = session.phase() == Phase::QuestionPending;
        let question = session.next_question(&self.words, &mut self.rng)?;

        if !was_pending {
            self.disarm_advance();
            if let Some(q) = &question {
                let handle = self.timers.schedule(
                    self.clock.now(),
                    self.config.answer_timeout(),
                    TimerEvent::AnswerTimeout {
                        question: q.number - 1,
                    },
                );
                debug!(question = q.number, "countdown armed");
                self.countdown = Some(handle);
            }
        }
        Ok(question)
    }

    /// Answer the pending question. The countdown is disarmed before
    /// anything else and the next question follows after the feedback delay.
    pub fn submit_answer(&mut self, chosen: &str) -> Result<AnswerOutcome> {
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        let outcome = session.submit_answer(chosen)?;
        self.disarm_countdown();
        self.arm_advance();
        Ok(outcome)
    }

    /// Count the pending question as wrong and show the next one at once.
    pub fn skip_question(&mut self) -> Result<Option<Question>> {
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        session.skip_question()?;
        self.disarm_countdown();
        self.next_question()
    }

    /// Store the session's result, then finalize the session and return the
    /// record. The session stays open if the store rejects the record.
    pub fn end_session(&mut self, results: &mut dyn ResultStore) -> Result<ResultRecord> {
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        let record = session.summary(Utc::now())?;
        results.append(&record)?;
        session.finish(record.timestamp)?;
        self.cancel_timers();
        info!(
            correct = record.correct_count,
            wrong = record.wrong_count,
            accuracy = record.accuracy_percent,
            "test session finished"
        );
        Ok(record)
    }

    /// Time left on the current countdown, if one is armed.
    pub fn remaining_time(&self) -> Option<Duration> {
        let due = self.timers.due_at(self.countdown?)?;
        Some(due.saturating_sub(self.clock.now()))
    }

    /// Fire every timer that is due and report what changed.
    pub fn tick(&mut self) -> Result<Vec<QuizUpdate>> {
        let mut updates = Vec::new();
        for (handle, event) in self.timers.fire_due(self.clock.now()) {
            match event {
                TimerEvent::AnswerTimeout { question } => {
                    if self.countdown != Some(handle) {
                        warn!(question, "ignoring stale countdown");
                        continue;
                    }
                    self.countdown = None;
                    let Some(session) = self.session.as_mut() else {
                        continue;
                    };
                    let on_screen = session.current_question().map(|q| q.number - 1);
                    if session.phase() != Phase::QuestionPending || on_screen != Some(question) {
                        warn!(question, "countdown fired for a question no longer pending");
                        continue;
                    }
                    let outcome = session.record_timeout(&self.config.timeout_answer)?;
                    debug!(question = question + 1, "question timed out");
                    updates.push(QuizUpdate::TimedOut(outcome));
                    self.arm_advance();
                }
                TimerEvent::Advance => {
                    if self.advance != Some(handle) {
                        continue;
                    }
                    self.advance = None;
                    match self.next_question()? {
                        Some(question) => updates.push(QuizUpdate::Question(question)),
                        None => updates.push(QuizUpdate::Exhausted),
                    }
                }
            }
        }
        Ok(updates)
    }

    fn arm_advance(&mut self) {
        self.disarm_advance();
        let handle = self.timers.schedule(
            self.clock.now(),
            self.config.feedback_delay(),
            TimerEvent::Advance,
        );
        self.advance = Some(handle);
    }

    fn disarm_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            if self.timers.cancel(handle) {
                debug!("countdown cancelled");
            }
        }
    }

    fn disarm_advance(&mut self) {
        if let Some(handle) = self.advance.take() {
            self.timers.cancel(handle);
        }
    }

    fn cancel_timers(&mut self) {
        self.timers.cancel_all();
        self.countdown = None;
        self.advance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::timer::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fruit() -> Vec<WordEntry> {
        vec![
            WordEntry::new("apple", "사과", ""),
            WordEntry::new("banana", "바나나", ""),
            WordEntry::new("orange", "오렌지", ""),
            WordEntry::new("grape", "포도", ""),
        ]
    }

    fn engine() -> (QuizEngine<StdRng, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = QuizEngine::new(
            QuizConfig::default(),
            StdRng::seed_from_u64(9),
            clock.clone(),
        );
        (engine, clock)
    }

    struct FullDisk;

    impl ResultStore for FullDisk {
        fn append(&mut self, _record: &ResultRecord) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }

        fn load_all(&self) -> Result<Vec<ResultRecord>> {
            Ok(Vec::new())
        }

        fn clear(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_result_write_keeps_session_open() {
        let (mut engine, _) = engine();
        engine.start_session(&fruit()).unwrap();
        let q = engine.next_question().unwrap().unwrap();
        engine.submit_answer(&q.correct_definition).unwrap();

        assert!(matches!(engine.end_session(&mut FullDisk), Err(Error::Io(_))));
        assert_eq!(engine.phase(), Some(Phase::Answered));

        let mut store = MemoryStore::new();
        let record = engine.end_session(&mut store).unwrap();
        assert_eq!((record.correct_count, record.wrong_count), (1, 0));
        assert_eq!(store.results, vec![record]);
        assert_eq!(engine.phase(), Some(Phase::Terminal));
        assert_eq!(engine.remaining_time(), None);
    }

    #[test]
    fn operations_before_start_fail() {
        let (mut engine, _) = engine();
        let mut store = MemoryStore::new();
        assert!(engine.phase().is_none());
        assert!(matches!(engine.next_question(), Err(Error::NoActiveSession)));
        assert!(matches!(engine.submit_answer("사과"), Err(Error::NoActiveSession)));
        assert!(matches!(engine.end_session(&mut store), Err(Error::NoActiveSession)));
    }

    #[test]
    fn countdown_reports_remaining_time() {
        let (mut engine, clock) = engine();
        engine.start_session(&fruit()).unwrap();
        engine.next_question().unwrap();
        assert_eq!(engine.remaining_time(), Some(Duration::from_secs(5)));
        clock.advance(Duration::from_millis(1200));
        assert_eq!(engine.remaining_time(), Some(Duration::from_millis(3800)));

        let q = engine.next_question().unwrap().unwrap();
        engine.submit_answer(&q.correct_definition).unwrap();
        assert_eq!(engine.remaining_time(), None);
    }

    #[test]
    fn restart_replaces_session_and_timers() {
        let (mut engine, clock) = engine();
        engine.start_session(&fruit()).unwrap();
        engine.next_question().unwrap();

        engine.start_session(&fruit()).unwrap();
        assert_eq!(engine.phase(), Some(Phase::Ready));
        clock.advance(Duration::from_secs(10));
        assert!(engine.tick().unwrap().is_empty());
        assert_eq!(engine.session().unwrap().wrong_count(), 0);
    }
}
