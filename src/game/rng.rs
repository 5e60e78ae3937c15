//! Injectable Randomness
//!
//! Every engine function that draws randomness takes a `RandomSource`
//! yielding floats in [0, 1). Production hands in the system PRNG; tests
//! hand in a scripted sequence, which keeps the engine hermetic.

use rand::Rng;

/// A source of uniform floats in [0, 1).
pub trait RandomSource {
    /// Next uniform draw in [0, 1).
    fn next_unit(&mut self) -> f64;
}

/// Production source backed by the thread-local system PRNG.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Scripted source for tests: replays a fixed sequence, then repeats the
/// final value so callers never run dry mid-algorithm.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Create a source that replays `values` in order.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// A source that always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let idx = self.cursor.min(self.values.len() - 1);
        let value = self.values[idx];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replays_then_repeats_last() {
        let mut rng = ScriptedRandom::new(vec![0.1, 0.9]);
        assert_eq!(rng.next_unit(), 0.1);
        assert_eq!(rng.next_unit(), 0.9);
        assert_eq!(rng.next_unit(), 0.9);
    }

    #[test]
    fn test_constant_source() {
        let mut rng = ScriptedRandom::constant(0.25);
        assert_eq!(rng.next_unit(), 0.25);
        assert_eq!(rng.next_unit(), 0.25);
    }

    #[test]
    fn test_thread_random_in_unit_interval() {
        let mut rng = ThreadRandom;
        for _ in 0..1000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
