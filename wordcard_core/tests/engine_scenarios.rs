//! End-to-end quiz engine scenarios on a virtual clock.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wordcard_core::{
    Error, ManualClock, MemoryStore, MistakeReason, Phase, QuizConfig, QuizEngine, QuizUpdate,
    ResultStore, WordEntry, TIMEOUT_ANSWER,
};

fn fruit() -> Vec<WordEntry> {
    vec![
        WordEntry::new("apple", "사과", ""),
        WordEntry::new("banana", "바나나", ""),
        WordEntry::new("orange", "오렌지", ""),
        WordEntry::new("grape", "포도", ""),
    ]
}

fn engine(seed: u64) -> (QuizEngine<StdRng, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let engine = QuizEngine::new(QuizConfig::default(), StdRng::seed_from_u64(seed), clock.clone());
    (engine, clock)
}

const FEEDBACK: Duration = Duration::from_millis(1500);
const COUNTDOWN: Duration = Duration::from_secs(5);

#[test]
fn answering_everything_correctly_scores_100() {
    let (mut engine, clock) = engine(1);
    let mut history = MemoryStore::new();
    engine.start_session(&fruit()).unwrap();
    assert_eq!(engine.session().unwrap().total(), 4);

    let mut question = engine.next_question().unwrap().unwrap();
    let mut seen = Vec::new();
    loop {
        assert_eq!(question.choices.len(), 4);
        assert!(question.choices.contains(&question.correct_definition));
        seen.push(question.prompt.clone());

        let outcome = engine.submit_answer(&question.correct_definition).unwrap();
        assert!(outcome.correct);
        assert_eq!(engine.phase(), Some(Phase::Answered));

        clock.advance(FEEDBACK);
        match engine.tick().unwrap().as_slice() {
            [QuizUpdate::Question(next)] => question = next.clone(),
            [QuizUpdate::Exhausted] => break,
            other => panic!("unexpected updates: {:?}", other),
        }
    }

    seen.sort();
    assert_eq!(seen, vec!["apple", "banana", "grape", "orange"]);

    let record = engine.end_session(&mut history).unwrap();
    assert_eq!(record.correct_count, 4);
    assert_eq!(record.wrong_count, 0);
    assert_eq!(record.accuracy_percent, 100);
    assert_eq!(record.total_questions, 4);
    assert_eq!(history.load_all().unwrap(), vec![record]);
    assert_eq!(engine.phase(), Some(Phase::Terminal));
}

#[test]
fn countdown_expiry_counts_once_and_blocks_late_answer() {
    let (mut engine, clock) = engine(2);
    engine.start_session(&fruit()).unwrap();
    let question = engine.next_question().unwrap().unwrap();

    clock.advance(COUNTDOWN - Duration::from_millis(1));
    assert!(engine.tick().unwrap().is_empty());

    clock.advance(Duration::from_millis(1));
    let updates = engine.tick().unwrap();
    assert_eq!(updates.len(), 1);
    match &updates[0] {
        QuizUpdate::TimedOut(outcome) => {
            assert!(!outcome.correct);
            assert_eq!(outcome.correct_definition, question.correct_definition);
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    let late = engine.submit_answer(&question.correct_definition);
    assert!(matches!(late, Err(Error::AlreadyAnswered)));

    let session = engine.session().unwrap();
    assert_eq!(session.wrong_count(), 1);
    assert_eq!(session.correct_count(), 0);
    assert_eq!(session.mistakes().len(), 1);
    assert_eq!(session.mistakes()[0].chosen_answer, TIMEOUT_ANSWER);
    assert_eq!(session.mistakes()[0].reason, MistakeReason::TimedOut);

    // nothing else fires until the feedback pause is over
    clock.advance(COUNTDOWN);
    let updates = engine.tick().unwrap();
    assert!(matches!(updates.as_slice(), [QuizUpdate::Question(q)] if q.number == 2));
    assert_eq!(engine.session().unwrap().wrong_count(), 1);
}

#[test]
fn answer_just_before_expiry_wins() {
    let (mut engine, clock) = engine(3);
    engine.start_session(&fruit()).unwrap();
    let question = engine.next_question().unwrap().unwrap();

    clock.advance(COUNTDOWN - Duration::from_millis(1));
    engine.submit_answer(&question.correct_definition).unwrap();
    clock.advance(Duration::from_millis(10));
    let updates = engine.tick().unwrap();
    assert!(updates.is_empty());

    let session = engine.session().unwrap();
    assert_eq!((session.correct_count(), session.wrong_count()), (1, 0));
}

#[test]
fn countdown_restarts_for_each_question() {
    let (mut engine, clock) = engine(4);
    engine.start_session(&fruit()).unwrap();
    let first = engine.next_question().unwrap().unwrap();
    engine.submit_answer(&first.correct_definition).unwrap();

    clock.advance(FEEDBACK);
    let updates = engine.tick().unwrap();
    assert!(matches!(updates.as_slice(), [QuizUpdate::Question(_)]));
    assert_eq!(engine.remaining_time(), Some(COUNTDOWN));

    // the first question's countdown would have expired here
    clock.advance(COUNTDOWN - FEEDBACK);
    assert!(engine.tick().unwrap().is_empty());
    assert_eq!(engine.session().unwrap().wrong_count(), 0);
}

#[test]
fn skip_counts_wrong_and_cancels_countdown() {
    let (mut engine, clock) = engine(5);
    engine.start_session(&fruit()).unwrap();
    engine.next_question().unwrap().unwrap();

    clock.advance(Duration::from_secs(3));
    let next = engine.skip_question().unwrap().unwrap();
    assert_eq!(next.number, 2);

    // the first countdown would fire at 5s; only the new one (8s) remains
    clock.advance(Duration::from_secs(3));
    assert!(engine.tick().unwrap().is_empty());

    let session = engine.session().unwrap();
    assert_eq!(session.wrong_count(), 1);
    assert!(session.mistakes().is_empty());
}

#[test]
fn skip_during_feedback_pause_is_rejected() {
    let (mut engine, clock) = engine(6);
    engine.start_session(&fruit()).unwrap();
    let q = engine.next_question().unwrap().unwrap();
    engine.submit_answer(&q.correct_definition).unwrap();

    assert!(matches!(engine.skip_question(), Err(Error::AlreadyAnswered)));

    clock.advance(FEEDBACK);
    let updates = engine.tick().unwrap();
    assert!(matches!(updates.as_slice(), [QuizUpdate::Question(q)] if q.number == 2));
}

#[test]
fn ending_during_feedback_pause_stops_all_timers() {
    let (mut engine, clock) = engine(7);
    let mut history = MemoryStore::new();
    engine.start_session(&fruit()).unwrap();
    let q = engine.next_question().unwrap().unwrap();
    engine.submit_answer("완전히 틀린 답").unwrap();
    assert_ne!(q.correct_definition, "완전히 틀린 답");

    let record = engine.end_session(&mut history).unwrap();
    assert_eq!((record.correct_count, record.wrong_count), (0, 1));
    assert_eq!(record.accuracy_percent, 0);

    clock.advance(Duration::from_secs(60));
    assert!(engine.tick().unwrap().is_empty());
    assert_eq!(engine.remaining_time(), None);
    assert!(matches!(engine.next_question(), Err(Error::NoActiveSession)));
    assert!(matches!(engine.end_session(&mut history), Err(Error::NoActiveSession)));
    assert_eq!(history.results.len(), 1);
}

#[test]
fn caller_may_advance_before_feedback_pause_ends() {
    let (mut engine, clock) = engine(8);
    engine.start_session(&fruit()).unwrap();
    let q = engine.next_question().unwrap().unwrap();
    engine.submit_answer(&q.correct_definition).unwrap();

    let next = engine.next_question().unwrap().unwrap();
    assert_eq!(next.number, 2);

    // the superseded feedback timer must not skip question 2
    clock.advance(FEEDBACK);
    assert!(engine.tick().unwrap().is_empty());
    assert_eq!(engine.session().unwrap().current_question(), Some(&next));
}

#[test]
fn queue_is_capped_by_config() {
    let clock = ManualClock::new();
    let config = QuizConfig {
        max_questions: 2,
        ..QuizConfig::default()
    };
    let mut engine = QuizEngine::new(config, StdRng::seed_from_u64(9), clock);
    let mut history = MemoryStore::new();
    engine.start_session(&fruit()).unwrap();

    while let Some(q) = engine.next_question().unwrap() {
        engine.submit_answer(&q.correct_definition).unwrap();
    }
    let record = engine.end_session(&mut history).unwrap();
    assert_eq!(record.total_questions, 2);
    assert_eq!(record.correct_count, 2);
}

#[test]
fn too_few_words_is_rejected() {
    let (mut engine, _) = engine(10);
    let err = engine.start_session(&fruit()[..3]).unwrap_err();
    assert!(matches!(err, Error::InsufficientData { required: 4, available: 3 }));
    assert!(engine.phase().is_none());
}
