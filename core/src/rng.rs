//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SimRng instances derived from a single
//! master seed.
//!
//! Each simulation task gets its own RNG stream, seeded deterministically
//! from (master_seed XOR task_index * golden ratio). This means:
//!   - Parallel batch tasks never share or correlate streams.
//!   - Each task's stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG owned by exactly one simulation task.
pub struct SimRng {
    pub task_index: u64,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a task RNG from the master seed and a stable task index.
    pub fn new(master_seed: u64, task_index: u64) -> Self {
        let derived_seed = master_seed ^ (task_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            task_index,
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Uniformly pick one element. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        items.choose(&mut self.inner)
    }

    /// Uniformly sample `amount` distinct elements (fewer if the slice is
    /// shorter), in random order.
    pub fn sample<'a, T>(&mut self, items: &'a [T], amount: usize) -> Vec<&'a T> {
        use rand::seq::SliceRandom;
        items.choose_multiple(&mut self.inner, amount).collect()
    }
}

/// Hands out one independent RNG per batch task.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_task(&self, task_index: u64) -> SimRng {
        SimRng::new(self.master_seed, task_index)
    }
}
