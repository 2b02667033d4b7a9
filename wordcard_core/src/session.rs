//! Test session state: queue, cursor, counters and mistakes

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::questions::generate_choices;
use crate::words::WordEntry;

/// Minimum number of words needed for a four-choice test.
pub const MIN_WORDS: usize = 4;

/// A question as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// 1-based position in the session.
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub tag: String,
    pub choices: Vec<String>,
    pub correct_definition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MistakeReason {
    Wrong,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub entry: WordEntry,
    pub chosen_answer: String,
    pub correct_answer: String,
    pub reason: MistakeReason,
}

/// Result of answering (or timing out on) a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_definition: String,
}

/// Summary of a finished session, as persisted in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub timestamp: DateTime<Utc>,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub accuracy_percent: u32,
    pub total_questions: usize,
}

/// Rounded percentage of correct answers; 0 when nothing was attempted.
pub fn accuracy_percent(correct: usize, wrong: usize) -> u32 {
    let attempted = correct + wrong;
    if attempted == 0 {
        return 0;
    }
    // round half up without going through floats
    ((200 * correct + attempted) / (2 * attempted)) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Started, or the previous question was skipped; nothing on screen yet.
    Ready,
    QuestionPending,
    Answered,
    Terminal,
}

#[derive(Debug, Clone)]
struct Current {
    question: Question,
    entry: WordEntry,
    answered: bool,
}

/// One run through a sample of the word list.
#[derive(Debug, Clone)]
pub struct TestSession {
    queue: Vec<WordEntry>,
    position: usize,
    correct_count: usize,
    wrong_count: usize,
    mistakes: Vec<Mistake>,
    current: Option<Current>,
    finished: bool,
}

impl TestSession {
    /// Sample up to `max_questions` words without replacement.
    pub fn start<R: Rng + ?Sized>(
        words: &[WordEntry],
        max_questions: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if words.len() < MIN_WORDS {
            return Err(Error::InsufficientData {
                required: MIN_WORDS,
                available: words.len(),
            });
        }

        let mut queue = words.to_vec();
        queue.shuffle(rng);
        queue.truncate(max_questions.min(words.len()));

        Ok(Self {
            queue,
            position: 0,
            correct_count: 0,
            wrong_count: 0,
            mistakes: Vec::new(),
            current: None,
            finished: false,
        })
    }

    pub fn queue(&self) -> &[WordEntry] {
        &self.queue
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total(&self) -> usize {
        self.queue.len()
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn wrong_count(&self) -> usize {
        self.wrong_count
    }

    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn phase(&self) -> Phase {
        match &self.current {
            _ if self.finished => Phase::Terminal,
            Some(c) if c.answered => Phase::Answered,
            Some(_) => Phase::QuestionPending,
            None => Phase::Ready,
        }
    }

    /// The question on screen, answered or not.
    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref().map(|c| &c.question)
    }

    /// Present the word under the cursor. Returns `None` once the queue is
    /// used up; the caller then finalizes with [`TestSession::finish`].
    ///
    /// An unanswered question is returned again as-is.
    pub fn next_question<R: Rng + ?Sized>(
        &mut self,
        words: &[WordEntry],
        rng: &mut R,
    ) -> Result<Option<Question>> {
        self.ensure_active()?;

        if let Some(current) = &self.current {
            if !current.answered {
                return Ok(Some(current.question.clone()));
            }
        }

        self.current = None;
        let Some(entry) = self.queue.get(self.position).cloned() else {
            return Ok(None);
        };

        let question = Question {
            number: self.position + 1,
            total: self.queue.len(),
            prompt: entry.term.clone(),
            tag: entry.tag.clone(),
            choices: generate_choices(&entry, words, rng),
            correct_definition: entry.definition.clone(),
        };
        self.current = Some(Current {
            question: question.clone(),
            entry,
            answered: false,
        });
        Ok(Some(question))
    }

    /// Score the pending question by exact string comparison.
    pub fn submit_answer(&mut self, chosen: &str) -> Result<AnswerOutcome> {
        self.answer(chosen, MistakeReason::Wrong)
    }

    /// Score the pending question as a timeout, recording `sentinel` as the answer.
    pub fn record_timeout(&mut self, sentinel: &str) -> Result<AnswerOutcome> {
        self.answer(sentinel, MistakeReason::TimedOut)
    }

    fn answer(&mut self, chosen: &str, miss: MistakeReason) -> Result<AnswerOutcome> {
        self.ensure_active()?;
        let current = self.current.as_mut().ok_or(Error::NoPendingQuestion)?;
        if current.answered {
            return Err(Error::AlreadyAnswered);
        }
        current.answered = true;

        let correct_definition = current.entry.definition.clone();
        let correct = miss == MistakeReason::Wrong && chosen == correct_definition;
        if correct {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
            self.mistakes.push(Mistake {
                entry: current.entry.clone(),
                chosen_answer: chosen.to_string(),
                correct_answer: correct_definition.clone(),
                reason: miss,
            });
        }
        self.position += 1;

        Ok(AnswerOutcome {
            correct,
            correct_definition,
        })
    }

    /// Count the pending question as wrong and move on. Skips leave no
    /// mistake record, unlike wrong answers and timeouts.
    pub fn skip_question(&mut self) -> Result<()> {
        self.ensure_active()?;
        match &self.current {
            None => return Err(Error::NoPendingQuestion),
            Some(c) if c.answered => return Err(Error::AlreadyAnswered),
            Some(_) => {}
        }
        self.wrong_count += 1;
        self.position += 1;
        self.current = None;
        Ok(())
    }

    /// Result of the session so far, without closing it.
    pub fn summary(&self, timestamp: DateTime<Utc>) -> Result<ResultRecord> {
        self.ensure_active()?;
        Ok(ResultRecord {
            timestamp,
            correct_count: self.correct_count,
            wrong_count: self.wrong_count,
            accuracy_percent: accuracy_percent(self.correct_count, self.wrong_count),
            total_questions: self.queue.len(),
        })
    }

    /// Close the session and produce its summary. No transition leaves this state.
    pub fn finish(&mut self, timestamp: DateTime<Utc>) -> Result<ResultRecord> {
        let record = self.summary(timestamp)?;
        self.finished = true;
        self.current = None;
        Ok(record)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.finished {
            Err(Error::NoActiveSession)
        } else {
            Ok(())
        }
    }
}
