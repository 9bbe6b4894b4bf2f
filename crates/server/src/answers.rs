use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// The classic eight-ball replies, in their traditional order
pub const CANNED_ANSWERS: [&str; 20] = [
    "It is certain.",
    "It is decidedly so.",
    "Without a doubt.",
    "Yes - definitely.",
    "You may rely on it.",
    "As I see it, yes.",
    "Most likely.",
    "Outlook good.",
    "Yes.",
    "Signs point to yes.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Very doubtful.",
];

/// Draws canned answers uniformly at random. Safe to share between handlers.
pub struct AnswerSelector {
    rng: Mutex<StdRng>,
}

impl AnswerSelector {
    /// A selector seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A selector that always produces the same sequence for `seed`
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn pick(&self) -> &'static str {
        // A poisoned lock still holds a usable generator
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        CANNED_ANSWERS[rng.gen_range(0..CANNED_ANSWERS.len())]
    }
}

impl Default for AnswerSelector {
    fn default() -> Self {
        Self::new()
    }
}
