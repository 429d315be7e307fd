// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Swap moves and the generators that propose them.
//!
//! A `Swap` exchanges the universities of two students. Because a swap only
//! permutes students between seats, it never changes how many students a
//! university holds, so capacity feasibility of the seed carries over to every
//! state the search visits.
//!
//! Generators are a trait so that the random proposal used in production can
//! be replaced by a deterministic sequence in tests and experiments.

use rand::Rng;
use unimatch_model::index::StudentIndex;

/// An exchange of the universities of two students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swap {
    pub first: StudentIndex,
    pub second: StudentIndex,
}

impl Swap {
    #[inline]
    pub fn new(first: StudentIndex, second: StudentIndex) -> Self {
        Self { first, second }
    }

    /// Returns `true` if both sides name the same student.
    #[inline]
    pub fn is_self_swap(&self) -> bool {
        self.first == self.second
    }
}

impl std::fmt::Display for Swap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Swap({} <-> {})", self.first, self.second)
    }
}

/// A source of candidate swaps.
pub trait MoveGenerator {
    /// Returns the name of the generator.
    fn name(&self) -> &str;

    /// Proposes the next swap over `num_students` students.
    ///
    /// Returns `None` when no further move can be proposed, which ends the search.
    fn next_swap(&mut self, num_students: usize) -> Option<Swap>;
}

impl std::fmt::Debug for dyn MoveGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MoveGenerator {{ name: {} }}", self.name())
    }
}

impl std::fmt::Display for dyn MoveGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MoveGenerator: {}", self.name())
    }
}

/// Samples two distinct students uniformly at random, independent of history.
#[derive(Debug, Clone)]
pub struct UniformSwapGenerator<R> {
    rng: R,
}

impl<R> UniformSwapGenerator<R>
where
    R: Rng,
{
    #[inline]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R> MoveGenerator for UniformSwapGenerator<R>
where
    R: Rng,
{
    fn name(&self) -> &str {
        "UniformSwapGenerator"
    }

    #[inline]
    fn next_swap(&mut self, num_students: usize) -> Option<Swap> {
        if num_students < 2 {
            return None;
        }

        // Draw the second index from the remaining n - 1 slots and skip over the first.
        let first = self.rng.random_range(0..num_students);
        let mut second = self.rng.random_range(0..num_students - 1);
        if second >= first {
            second += 1;
        }

        Some(Swap::new(StudentIndex::new(first), StudentIndex::new(second)))
    }
}

/// Replays a fixed list of swaps, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct SequenceSwapGenerator {
    swaps: Vec<Swap>,
    position: usize,
}

impl SequenceSwapGenerator {
    #[inline]
    pub fn new(swaps: Vec<Swap>) -> Self {
        Self { swaps, position: 0 }
    }

    /// Returns the number of swaps not yet proposed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.swaps.len() - self.position
    }
}

impl MoveGenerator for SequenceSwapGenerator {
    fn name(&self) -> &str {
        "SequenceSwapGenerator"
    }

    fn next_swap(&mut self, num_students: usize) -> Option<Swap> {
        let swap = *self.swaps.get(self.position)?;
        debug_assert!(
            swap.first.get() < num_students && swap.second.get() < num_students,
            "called `SequenceSwapGenerator::next_swap` with {} students but the swap is {}",
            num_students,
            swap
        );
        self.position += 1;
        Some(swap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_uniform_swaps_are_distinct_and_in_range() {
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(7));
        for _ in 0..10_000 {
            let swap = generator.next_swap(5).unwrap();
            assert!(!swap.is_self_swap());
            assert!(swap.first.get() < 5);
            assert!(swap.second.get() < 5);
        }
    }

    #[test]
    fn test_uniform_swaps_cover_all_pairs() {
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(11));
        let mut seen = [[0u32; 4]; 4];
        for _ in 0..12_000 {
            let swap = generator.next_swap(4).unwrap();
            seen[swap.first.get()][swap.second.get()] += 1;
        }
        for (i, row) in seen.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                if i == j {
                    assert_eq!(count, 0);
                } else {
                    // 12 ordered pairs, expected 1000 each.
                    assert!(
                        count > 800 && count < 1200,
                        "pair ({}, {}) drawn {} times",
                        i,
                        j,
                        count
                    );
                }
            }
        }
    }

    #[test]
    fn test_uniform_needs_two_students() {
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(1));
        assert!(generator.next_swap(0).is_none());
        assert!(generator.next_swap(1).is_none());
        assert_eq!(
            generator.next_swap(2).map(|s| s.first.get() + s.second.get()),
            Some(1)
        );
    }

    #[test]
    fn test_sequence_replays_then_exhausts() {
        let a = Swap::new(StudentIndex::new(0), StudentIndex::new(1));
        let b = Swap::new(StudentIndex::new(2), StudentIndex::new(0));
        let mut generator = SequenceSwapGenerator::new(vec![a, b]);

        assert_eq!(generator.remaining(), 2);
        assert_eq!(generator.next_swap(3), Some(a));
        assert_eq!(generator.next_swap(3), Some(b));
        assert_eq!(generator.next_swap(3), None);
        assert_eq!(generator.remaining(), 0);
    }
}
