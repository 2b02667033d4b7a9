//! Four-choice option generation

use rand::seq::SliceRandom;
use rand::Rng;

use crate::words::WordEntry;

/// Number of options shown per question.
pub const CHOICE_COUNT: usize = 4;

/// Placeholder options used when the word list cannot supply enough
/// distinct distractors. Each is tagged with a part of speech.
pub const FILLER_CHOICES: [&str; 4] = [
    "[명사] 임시 선택지",
    "[동사] 가짜 답안",
    "[형용사] 더미 옵션",
    "[부사] 기본 선택지",
];

pub fn is_filler(choice: &str) -> bool {
    FILLER_CHOICES.contains(&choice)
}

/// Build the shuffled option set for `target`: its own definition plus up to
/// three distinct definitions from other words, padded with fillers.
///
/// Words sharing the target's term or definition never supply a distractor,
/// so the correct answer appears exactly once.
pub fn generate_choices<R: Rng + ?Sized>(
    target: &WordEntry,
    words: &[WordEntry],
    rng: &mut R,
) -> Vec<String> {
    let mut choices = vec![target.definition.clone()];
    let target_key = target.key();

    let mut pool: Vec<&WordEntry> = words
        .iter()
        .filter(|w| w.key() != target_key && w.definition != target.definition)
        .collect();
    pool.shuffle(rng);

    for word in pool {
        if choices.len() == CHOICE_COUNT {
            break;
        }
        if !choices.contains(&word.definition) {
            choices.push(word.definition.clone());
        }
    }

    if choices.len() < CHOICE_COUNT {
        let mut fillers = FILLER_CHOICES;
        fillers.shuffle(rng);
        for filler in fillers {
            if choices.len() == CHOICE_COUNT {
                break;
            }
            if !choices.iter().any(|c| c == filler) {
                choices.push(filler.to_string());
            }
        }
    }

    choices.shuffle(rng);
    choices
}
