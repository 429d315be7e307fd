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

//! Immutable problem data for the student/university assignment search.
//!
//! A `Model` bundles the three lookup tables the objective needs, all built
//! once and never mutated afterwards:
//!
//! * **Preference Index**: `(student, university) -> rank` in `1..=MAX_PREFERENCES`.
//! * **Merit Index**: `student -> FU`, the normalized merit utility
//!   `(N + 1 - merit_rank) / N`.
//! * **Capacity Table**: `university -> capacity`, together with the
//!   precomputed reciprocal used by the university-side objective.
//!
//! Students and universities are addressed by dense typed indices in the hot
//! path. The external identifiers from the input tables are kept in parallel
//! vectors so that results can be written back in their original vocabulary.
//!
//! Construction goes through `ModelBuilder`, which validates the data sets
//! against each other (every student has exactly one merit rank, ranks are a
//! permutation of `1..=N`, capacities are positive) and reports the first
//! inconsistency as a `ModelError`.

use crate::index::{StudentId, StudentIndex, UniversityId, UniversityIndex};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// The maximum number of ranked preferences a student may list.
pub const MAX_PREFERENCES: usize = 50;

/// The error type for model construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No students were added.
    NoStudents,
    /// No universities were added.
    NoUniversities,
    /// The same student identifier was added twice.
    DuplicateStudent(StudentId),
    /// The same university identifier was added twice.
    DuplicateUniversity(UniversityId),
    /// A university declared a capacity of zero seats.
    ZeroCapacity(UniversityId),
    /// A student listed more than `MAX_PREFERENCES` preferences.
    TooManyPreferences { student: StudentId, count: usize },
    /// A preference names a university that does not exist (strict mode only).
    UnknownPreference {
        student: StudentId,
        university: UniversityId,
    },
    /// A merit rank was given for a student that does not exist.
    UnknownStudent(StudentId),
    /// A student received more than one merit rank.
    DuplicateMeritRecord(StudentId),
    /// A student has no merit rank.
    MissingMeritRank(StudentId),
    /// A merit rank lies outside `1..=N`.
    MeritRankOutOfRange {
        student: StudentId,
        rank: u32,
        num_students: usize,
    },
    /// Two students share the same merit rank.
    DuplicateMeritRank {
        rank: u32,
        first: StudentId,
        second: StudentId,
    },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoStudents => write!(f, "The instance contains no students"),
            Self::NoUniversities => write!(f, "The instance contains no universities"),
            Self::DuplicateStudent(id) => write!(f, "Student {} is defined more than once", id),
            Self::DuplicateUniversity(id) => {
                write!(f, "University {} is defined more than once", id)
            }
            Self::ZeroCapacity(id) => write!(f, "University {} has a capacity of zero", id),
            Self::TooManyPreferences { student, count } => write!(
                f,
                "Student {} lists {} preferences, at most {} are allowed",
                student, count, MAX_PREFERENCES
            ),
            Self::UnknownPreference {
                student,
                university,
            } => write!(
                f,
                "Student {} lists unknown university {} as a preference",
                student, university
            ),
            Self::UnknownStudent(id) => {
                write!(f, "Merit rank given for unknown student {}", id)
            }
            Self::DuplicateMeritRecord(id) => {
                write!(f, "Student {} has more than one merit rank", id)
            }
            Self::MissingMeritRank(id) => write!(f, "Student {} has no merit rank", id),
            Self::MeritRankOutOfRange {
                student,
                rank,
                num_students,
            } => write!(
                f,
                "Student {} has merit rank {} outside of 1..={}",
                student, rank, num_students
            ),
            Self::DuplicateMeritRank {
                rank,
                first,
                second,
            } => write!(
                f,
                "Merit rank {} is shared by students {} and {}",
                rank, first, second
            ),
        }
    }
}

impl std::error::Error for ModelError {}

/// The validated, immutable problem instance.
///
/// Layout (Structure of Arrays, indexed by the dense typed indices):
/// - `student_ids[s]`, `merit_ranks[s]`, `merit_utilities[s]`: per student.
/// - `university_ids[u]`, `capacities[u]`, `inverse_capacities[u]`: per university.
/// - `preferences[s * MAX_PREFERENCES + (rank - 1)]`: the ranked list, `None` for gaps.
/// - `preference_ranks`: the packed `(student, university)` key to rank map.
#[derive(Debug, Clone)]
pub struct Model {
    student_ids: Vec<StudentId>,
    merit_ranks: Vec<u32>,
    merit_utilities: Vec<f64>,
    university_ids: Vec<UniversityId>,
    capacities: Vec<u32>,
    inverse_capacities: Vec<f64>,
    preferences: Vec<Option<UniversityIndex>>,
    preference_ranks: FxHashMap<u64, u8>,
    student_lookup: FxHashMap<StudentId, StudentIndex>,
    university_lookup: FxHashMap<UniversityId, UniversityIndex>,
}

impl Model {
    /// Returns the number of students `N`.
    #[inline]
    pub fn num_students(&self) -> usize {
        self.student_ids.len()
    }

    /// Returns the number of universities `U`.
    #[inline]
    pub fn num_universities(&self) -> usize {
        self.university_ids.len()
    }

    /// Returns the sum of all capacities.
    pub fn total_capacity(&self) -> u64 {
        self.capacities.iter().map(|&c| c as u64).sum()
    }

    #[inline(always)]
    fn preference_key(
        &self,
        student_index: StudentIndex,
        university_index: UniversityIndex,
    ) -> u64 {
        (student_index.get() as u64) * (self.num_universities() as u64)
            + university_index.get() as u64
    }

    /// Returns the preference rank (`1..=MAX_PREFERENCES`) of `university_index`
    /// in the list of `student_index`, or `None` if the university is unranked.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use unimatch_model::model::ModelBuilder;
    /// # use unimatch_model::index::{StudentIndex, UniversityIndex};
    /// let mut builder = ModelBuilder::new();
    /// builder.add_university(10, 1).unwrap();
    /// builder.add_university(20, 1).unwrap();
    /// builder.add_student(1, vec![None, Some(20)]).unwrap();
    /// builder.set_merit_rank(1, 1).unwrap();
    /// let model = builder.build().unwrap();
    ///
    /// let s = model.student_index(1).unwrap();
    /// assert_eq!(model.preference_rank(s, model.university_index(20).unwrap()), Some(2));
    /// assert_eq!(model.preference_rank(s, model.university_index(10).unwrap()), None);
    /// ```
    #[inline]
    pub fn preference_rank(
        &self,
        student_index: StudentIndex,
        university_index: UniversityIndex,
    ) -> Option<u8> {
        debug_assert!(
            student_index.get() < self.num_students(),
            "called `Model::preference_rank` with student index out of bounds: the len is {} but the index is {}",
            self.num_students(),
            student_index.get()
        );
        debug_assert!(
            university_index.get() < self.num_universities(),
            "called `Model::preference_rank` with university index out of bounds: the len is {} but the index is {}",
            self.num_universities(),
            university_index.get()
        );

        self.preference_ranks
            .get(&self.preference_key(student_index, university_index))
            .copied()
    }

    /// Returns the ranked preference list of a student, `None` marking gaps.
    ///
    /// The slice always has `MAX_PREFERENCES` entries; position `i` holds rank `i + 1`.
    #[inline]
    pub fn preferences(&self, student_index: StudentIndex) -> &[Option<UniversityIndex>] {
        let start = student_index.get() * MAX_PREFERENCES;
        &self.preferences[start..start + MAX_PREFERENCES]
    }

    /// Returns the merit rank of a student (`1` is the best).
    #[inline]
    pub fn merit_rank(&self, student_index: StudentIndex) -> u32 {
        self.merit_ranks[student_index.get()]
    }

    /// Returns the merit utility `FU(s) = (N + 1 - merit_rank(s)) / N`.
    #[inline]
    pub fn merit_utility(&self, student_index: StudentIndex) -> f64 {
        debug_assert!(
            student_index.get() < self.num_students(),
            "called `Model::merit_utility` with student index out of bounds: the len is {} but the index is {}",
            self.num_students(),
            student_index.get()
        );
        self.merit_utilities[student_index.get()]
    }

    /// Returns all merit utilities, indexed by student.
    #[inline]
    pub fn merit_utilities(&self) -> &[f64] {
        &self.merit_utilities
    }

    /// Returns the seat capacity of a university.
    #[inline]
    pub fn capacity(&self, university_index: UniversityIndex) -> u32 {
        self.capacities[university_index.get()]
    }

    /// Returns `1 / capacity` of a university.
    #[inline]
    pub fn inverse_capacity(&self, university_index: UniversityIndex) -> f64 {
        debug_assert!(
            university_index.get() < self.num_universities(),
            "called `Model::inverse_capacity` with university index out of bounds: the len is {} but the index is {}",
            self.num_universities(),
            university_index.get()
        );
        self.inverse_capacities[university_index.get()]
    }

    /// Returns all capacities, indexed by university.
    #[inline]
    pub fn capacities(&self) -> &[u32] {
        &self.capacities
    }

    /// Returns the external identifier of a student.
    #[inline]
    pub fn student_id(&self, student_index: StudentIndex) -> StudentId {
        self.student_ids[student_index.get()]
    }

    /// Returns the external identifier of a university.
    #[inline]
    pub fn university_id(&self, university_index: UniversityIndex) -> UniversityId {
        self.university_ids[university_index.get()]
    }

    /// Resolves an external student identifier.
    #[inline]
    pub fn student_index(&self, id: StudentId) -> Option<StudentIndex> {
        self.student_lookup.get(&id).copied()
    }

    /// Resolves an external university identifier.
    #[inline]
    pub fn university_index(&self, id: UniversityId) -> Option<UniversityIndex> {
        self.university_lookup.get(&id).copied()
    }

    /// Returns all student identifiers in index order.
    #[inline]
    pub fn student_ids(&self) -> &[StudentId] {
        &self.student_ids
    }

    /// Returns all university identifiers in index order.
    #[inline]
    pub fn university_ids(&self) -> &[UniversityId] {
        &self.university_ids
    }

    /// Iterates over all student indices.
    #[inline]
    pub fn students(&self) -> impl ExactSizeIterator<Item = StudentIndex> + DoubleEndedIterator {
        StudentIndex::range(self.num_students())
    }

    /// Iterates over all university indices.
    #[inline]
    pub fn universities(
        &self,
    ) -> impl ExactSizeIterator<Item = UniversityIndex> + DoubleEndedIterator {
        UniversityIndex::range(self.num_universities())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Model(students: {}, universities: {}, seats: {}, ranked pairs: {})",
            self.num_students(),
            self.num_universities(),
            self.total_capacity(),
            self.preference_ranks.len()
        )
    }
}

#[derive(Debug, Clone)]
struct PendingStudent {
    id: StudentId,
    preferences: Vec<Option<UniversityId>>,
}

/// Collects students, universities and merit ranks, and validates them into a `Model`.
///
/// Records can be added in any order; preferences are resolved against the
/// university table only when `build` is called. By default a preference that
/// names an unknown university is ignored, mirroring how such an entry can
/// never match a real placement. Use `strict_preferences(true)` to reject it.
///
/// If a student lists the same university twice, the later (worse) rank wins.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    students: Vec<PendingStudent>,
    student_lookup: FxHashMap<StudentId, StudentIndex>,
    university_ids: Vec<UniversityId>,
    capacities: Vec<u32>,
    university_lookup: FxHashMap<UniversityId, UniversityIndex>,
    merit_ranks: FxHashMap<StudentId, u32>,
    strict_preferences: bool,
}

impl ModelBuilder {
    /// Creates an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with room for the given number of records.
    pub fn preallocated(num_students: usize, num_universities: usize) -> Self {
        Self {
            students: Vec::with_capacity(num_students),
            student_lookup: FxHashMap::with_capacity_and_hasher(num_students, Default::default()),
            university_ids: Vec::with_capacity(num_universities),
            capacities: Vec::with_capacity(num_universities),
            university_lookup: FxHashMap::with_capacity_and_hasher(
                num_universities,
                Default::default(),
            ),
            merit_ranks: FxHashMap::with_capacity_and_hasher(num_students, Default::default()),
            strict_preferences: false,
        }
    }

    /// Configures whether a preference naming an unknown university is an error.
    #[inline]
    pub fn strict_preferences(&mut self, yes: bool) -> &mut Self {
        self.strict_preferences = yes;
        self
    }

    /// Adds a university with the given capacity.
    pub fn add_university(
        &mut self,
        id: UniversityId,
        capacity: u32,
    ) -> Result<UniversityIndex, ModelError> {
        if self.university_lookup.contains_key(&id) {
            return Err(ModelError::DuplicateUniversity(id));
        }
        if capacity == 0 {
            return Err(ModelError::ZeroCapacity(id));
        }

        let index = UniversityIndex::new(self.university_ids.len());
        self.university_ids.push(id);
        self.capacities.push(capacity);
        self.university_lookup.insert(id, index);
        Ok(index)
    }

    /// Adds a student with a positional preference list.
    ///
    /// Entry `i` of `preferences` is the university at rank `i + 1`; `None`
    /// leaves that rank empty without shifting the following ones.
    pub fn add_student(
        &mut self,
        id: StudentId,
        preferences: Vec<Option<UniversityId>>,
    ) -> Result<StudentIndex, ModelError> {
        if self.student_lookup.contains_key(&id) {
            return Err(ModelError::DuplicateStudent(id));
        }
        if preferences.len() > MAX_PREFERENCES {
            return Err(ModelError::TooManyPreferences {
                student: id,
                count: preferences.len(),
            });
        }

        let index = StudentIndex::new(self.students.len());
        self.students.push(PendingStudent { id, preferences });
        self.student_lookup.insert(id, index);
        Ok(index)
    }

    /// Records the merit rank of an already added student.
    pub fn set_merit_rank(&mut self, id: StudentId, rank: u32) -> Result<(), ModelError> {
        if !self.student_lookup.contains_key(&id) {
            return Err(ModelError::UnknownStudent(id));
        }
        match self.merit_ranks.entry(id) {
            Entry::Occupied(_) => Err(ModelError::DuplicateMeritRecord(id)),
            Entry::Vacant(slot) => {
                slot.insert(rank);
                Ok(())
            }
        }
    }

    /// Returns the number of students added so far.
    #[inline]
    pub fn num_students(&self) -> usize {
        self.students.len()
    }

    /// Returns the number of universities added so far.
    #[inline]
    pub fn num_universities(&self) -> usize {
        self.university_ids.len()
    }

    /// Validates the collected records and builds the immutable `Model`.
    pub fn build(self) -> Result<Model, ModelError> {
        let num_students = self.students.len();
        let num_universities = self.university_ids.len();

        if num_students == 0 {
            return Err(ModelError::NoStudents);
        }
        if num_universities == 0 {
            return Err(ModelError::NoUniversities);
        }

        // Merit ranks must form a permutation of 1..=N.
        let mut merit_ranks = Vec::with_capacity(num_students);
        let mut rank_owner: Vec<Option<StudentId>> = vec![None; num_students];
        for student in &self.students {
            let rank = *self
                .merit_ranks
                .get(&student.id)
                .ok_or(ModelError::MissingMeritRank(student.id))?;

            if rank == 0 || rank as usize > num_students {
                return Err(ModelError::MeritRankOutOfRange {
                    student: student.id,
                    rank,
                    num_students,
                });
            }

            let slot = &mut rank_owner[rank as usize - 1];
            if let Some(first) = *slot {
                return Err(ModelError::DuplicateMeritRank {
                    rank,
                    first,
                    second: student.id,
                });
            }
            *slot = Some(student.id);
            merit_ranks.push(rank);
        }

        let n = num_students as f64;
        let merit_utilities = merit_ranks
            .iter()
            .map(|&rank| (n + 1.0 - rank as f64) / n)
            .collect();

        let inverse_capacities = self.capacities.iter().map(|&c| 1.0 / c as f64).collect();

        let mut preferences = vec![None; num_students * MAX_PREFERENCES];
        let mut preference_ranks = FxHashMap::default();
        for (s, student) in self.students.iter().enumerate() {
            for (position, entry) in student.preferences.iter().enumerate() {
                let Some(university_id) = *entry else {
                    continue;
                };
                let Some(&university_index) = self.university_lookup.get(&university_id) else {
                    if self.strict_preferences {
                        return Err(ModelError::UnknownPreference {
                            student: student.id,
                            university: university_id,
                        });
                    }
                    continue;
                };

                preferences[s * MAX_PREFERENCES + position] = Some(university_index);
                let key = (s as u64) * (num_universities as u64) + university_index.get() as u64;
                let rank = (position + 1) as u8;
                // Later positions overwrite earlier ones.
                preference_ranks.insert(key, rank);
            }
        }

        Ok(Model {
            student_ids: self.students.iter().map(|s| s.id).collect(),
            merit_ranks,
            merit_utilities,
            university_ids: self.university_ids,
            capacities: self.capacities,
            inverse_capacities,
            preferences,
            preference_ranks,
            student_lookup: self.student_lookup,
            university_lookup: self.university_lookup,
        })
    }
}
