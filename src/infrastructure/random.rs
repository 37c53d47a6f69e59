use crate::domain::ports::Randomness;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl Randomness for ThreadRandom {
    fn chance(&self, probability: f64) -> bool {
        rand::thread_rng().gen_bool(bounded(probability))
    }

    fn token(&self, len: usize) -> String {
        token_from(&mut rand::thread_rng(), len)
    }
}

/// A reproducible generator, for replaying a processing run.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Randomness for SeededRandom {
    fn chance(&self, probability: f64) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_bool(bounded(probability))
    }

    fn token(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        token_from(&mut *rng, len)
    }
}

/// Always answers the same way; used to force one processing branch.
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome {
    pub succeed: bool,
}

impl FixedOutcome {
    pub fn success() -> Self {
        Self { succeed: true }
    }

    pub fn failure() -> Self {
        Self { succeed: false }
    }
}

impl Randomness for FixedOutcome {
    fn chance(&self, _probability: f64) -> bool {
        self.succeed
    }

    fn token(&self, len: usize) -> String {
        "0".repeat(len)
    }
}

/// `gen_bool` panics outside `[0, 1]`; NaN never succeeds.
fn bounded(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

fn token_from<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect()
}
