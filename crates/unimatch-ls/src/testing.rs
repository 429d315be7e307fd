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

//! Random instances for tests.

use rand::{Rng, seq::SliceRandom};
use unimatch_model::{
    assignment::Assignment,
    index::UniversityIndex,
    model::{Model, ModelBuilder},
};

/// Builds a random model with `num_students` students and `num_universities`
/// universities, together with a capacity-feasible seed assignment.
///
/// Capacities are drawn so that every student has a seat and some seats stay free.
pub(crate) fn random_instance<R: Rng>(
    rng: &mut R,
    num_students: usize,
    num_universities: usize,
) -> (Model, Assignment) {
    assert!(num_students > 0 && num_universities > 0);

    let mut builder = ModelBuilder::preallocated(num_students, num_universities);

    let base = num_students.div_ceil(num_universities) as u32;
    let mut seats = Vec::with_capacity(num_students + num_universities * 2);
    for u in 0..num_universities {
        let capacity = base + rng.random_range(0..3);
        builder.add_university(1000 + u as u64, capacity).unwrap();
        seats.extend(std::iter::repeat_n(u, capacity as usize));
    }

    let university_ids: Vec<u64> = (0..num_universities as u64).map(|u| 1000 + u).collect();
    for s in 0..num_students {
        let count = rng.random_range(0..=num_universities.min(8));
        let mut choices = university_ids.clone();
        choices.shuffle(rng);
        let mut preferences: Vec<Option<u64>> =
            choices[..count].iter().copied().map(Some).collect();
        // Leave an occasional gap in the ranking.
        if count > 1 && rng.random_bool(0.2) {
            preferences.insert(rng.random_range(0..count), None);
        }
        builder.add_student(s as u64 + 1, preferences).unwrap();
    }

    let mut ranks: Vec<u32> = (1..=num_students as u32).collect();
    ranks.shuffle(rng);
    for (s, rank) in ranks.into_iter().enumerate() {
        builder.set_merit_rank(s as u64 + 1, rank).unwrap();
    }

    let model = builder.build().unwrap();

    seats.shuffle(rng);
    let assignment = Assignment::new(
        seats[..num_students]
            .iter()
            .map(|&u| UniversityIndex::new(u))
            .collect(),
    );
    (model, assignment)
}
