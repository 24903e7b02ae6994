use std::collections::VecDeque;

/// Source of dice rolls for the match engine.
///
/// Every rule that consumes randomness takes a `&mut dyn DiceSource`; the
/// engine itself never reaches for ambient randomness. Two implementations
/// exist: a seeded PRNG for real play and a scripted queue for tests.
pub trait DiceSource {
    /// Roll a six-sided die, returning 1..=6.
    fn roll_d6(&mut self) -> u8;

    /// Roll an eight-sided die, returning 1..=8.
    fn roll_d8(&mut self) -> u8;

    /// Roll 2D6 and sum.
    fn roll_2d6(&mut self) -> u8 {
        self.roll_d6() + self.roll_d6()
    }

    /// Roll a D3 (D6 halved, rounded up).
    fn roll_d3(&mut self) -> u8 {
        self.roll_d6().div_ceil(2)
    }
}

/// Deterministic dice backed by a seeded PRNG.
///
/// Given the same seed the sequence is stable within a build, which is what
/// the determinism invariant needs (replaying the same actions from the same
/// state must produce byte-identical event logs).
pub struct SeededDice {
    rng: fastrand::Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        SeededDice {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl DiceSource for SeededDice {
    fn roll_d6(&mut self) -> u8 {
        self.rng.u8(1..=6)
    }

    fn roll_d8(&mut self) -> u8 {
        self.rng.u8(1..=8)
    }
}

/// Scripted dice for tests: rolls are consumed front to back.
///
/// Exhausting the queue is a test-authoring bug, not a game condition, so it
/// panics rather than returning a default.
pub struct ScriptedDice {
    queue: VecDeque<u8>,
}

impl ScriptedDice {
    pub fn new(rolls: &[u8]) -> Self {
        ScriptedDice {
            queue: rolls.iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    fn next(&mut self, faces: u8) -> u8 {
        let roll = self
            .queue
            .pop_front()
            .expect("scripted dice exhausted: test script is missing rolls");
        assert!(
            roll >= 1 && roll <= faces,
            "scripted roll {roll} out of range for d{faces}"
        );
        roll
    }
}

impl DiceSource for ScriptedDice {
    fn roll_d6(&mut self) -> u8 {
        self.next(6)
    }

    fn roll_d8(&mut self) -> u8 {
        self.next(8)
    }
}
