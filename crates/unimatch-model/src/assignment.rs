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

use crate::{
    index::{StudentId, StudentIndex, UniversityId, UniversityIndex},
    model::Model,
};

/// The error type for building or validating an assignment against a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// A record names a student that is not part of the model.
    UnknownStudent(StudentId),
    /// A record names a university that is not part of the model.
    UnknownUniversity {
        student: StudentId,
        university: UniversityId,
    },
    /// A student appears in more than one record.
    DuplicateStudent(StudentId),
    /// A student of the model has no record.
    MissingStudent(StudentId),
    /// The assignment covers a different number of students than the model.
    LengthMismatch { expected: usize, actual: usize },
    /// An entry points past the university table of the model.
    UniversityOutOfRange {
        student: StudentIndex,
        university: UniversityIndex,
        num_universities: usize,
    },
}

impl std::fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStudent(id) => write!(f, "Assignment references unknown student {}", id),
            Self::UnknownUniversity {
                student,
                university,
            } => write!(
                f,
                "Student {} is assigned to unknown university {}",
                student, university
            ),
            Self::DuplicateStudent(id) => {
                write!(f, "Student {} is assigned more than once", id)
            }
            Self::MissingStudent(id) => write!(f, "Student {} has no assignment", id),
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "Assignment covers {} students but the model has {}",
                actual, expected
            ),
            Self::UniversityOutOfRange {
                student,
                university,
                num_universities,
            } => write!(
                f,
                "{} is assigned to {} but the model has only {} universities",
                student, university, num_universities
            ),
        }
    }
}

impl std::error::Error for AssignmentError {}

/// A university whose seat count is exceeded by an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityViolation {
    pub university: UniversityId,
    pub assigned: usize,
    pub capacity: u32,
}

impl std::fmt::Display for CapacityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "University {} has {} assigned students but only {} seats",
            self.university, self.assigned, self.capacity
        )
    }
}

impl std::error::Error for CapacityViolation {}

/// A total mapping from students to universities.
///
/// `universities[s]` is the university of student `s`. The only mutation is
/// `swap`, which exchanges the universities of two students and therefore
/// never changes how many students each university holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    universities: Vec<UniversityIndex>,
}

impl Assignment {
    /// Creates an assignment from a dense vector indexed by student.
    #[inline]
    pub fn new(universities: Vec<UniversityIndex>) -> Self {
        Self { universities }
    }

    /// Builds an assignment from `(student_id, university_id)` records.
    ///
    /// Every student of the model must appear exactly once and every
    /// university must exist.
    pub fn from_records<I>(model: &Model, records: I) -> Result<Self, AssignmentError>
    where
        I: IntoIterator<Item = (StudentId, UniversityId)>,
    {
        let mut slots: Vec<Option<UniversityIndex>> = vec![None; model.num_students()];

        for (student_id, university_id) in records {
            let student = model
                .student_index(student_id)
                .ok_or(AssignmentError::UnknownStudent(student_id))?;
            let university = model.university_index(university_id).ok_or(
                AssignmentError::UnknownUniversity {
                    student: student_id,
                    university: university_id,
                },
            )?;

            let slot = &mut slots[student.get()];
            if slot.is_some() {
                return Err(AssignmentError::DuplicateStudent(student_id));
            }
            *slot = Some(university);
        }

        let universities = slots
            .into_iter()
            .enumerate()
            .map(|(s, slot)| {
                slot.ok_or_else(|| {
                    AssignmentError::MissingStudent(model.student_id(StudentIndex::new(s)))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { universities })
    }

    /// Returns the university of a student.
    #[inline]
    pub fn university_of(&self, student_index: StudentIndex) -> UniversityIndex {
        let index = student_index.get();
        debug_assert!(
            index < self.num_students(),
            "called `Assignment::university_of` with student index out of bounds: the len is {} but the index is {}",
            self.num_students(),
            index
        );

        self.universities[index]
    }

    /// Exchanges the universities of two students.
    #[inline]
    pub fn swap(&mut self, first: StudentIndex, second: StudentIndex) {
        self.universities.swap(first.get(), second.get());
    }

    /// Returns the number of students covered.
    #[inline]
    pub fn num_students(&self) -> usize {
        self.universities.len()
    }

    /// Returns the universities indexed by student.
    #[inline]
    pub fn as_slice(&self) -> &[UniversityIndex] {
        &self.universities
    }

    /// Iterates over `(student, university)` pairs in index order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (StudentIndex, UniversityIndex)> + '_ {
        self.universities
            .iter()
            .enumerate()
            .map(|(s, &u)| (StudentIndex::new(s), u))
    }

    /// Counts how many students each university holds.
    pub fn counts(&self, num_universities: usize) -> Vec<usize> {
        let mut counts = vec![0; num_universities];
        for u in &self.universities {
            counts[u.get()] += 1;
        }
        counts
    }

    /// Checks that the shape of this assignment matches `model`.
    pub fn validate_against(&self, model: &Model) -> Result<(), AssignmentError> {
        if self.num_students() != model.num_students() {
            return Err(AssignmentError::LengthMismatch {
                expected: model.num_students(),
                actual: self.num_students(),
            });
        }
        let num_universities = model.num_universities();
        for (student, university) in self.iter() {
            if university.get() >= num_universities {
                return Err(AssignmentError::UniversityOutOfRange {
                    student,
                    university,
                    num_universities,
                });
            }
        }
        Ok(())
    }

    /// Returns the first university whose capacity is exceeded, in index order.
    ///
    /// Assumes `validate_against(model)` succeeded.
    pub fn check_capacities(&self, model: &Model) -> Result<(), CapacityViolation> {
        let counts = self.counts(model.num_universities());
        for university in model.universities() {
            let assigned = counts[university.get()];
            let capacity = model.capacity(university);
            if assigned > capacity as usize {
                return Err(CapacityViolation {
                    university: model.university_id(university),
                    assigned,
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Returns `(student_id, university_id)` records sorted by student id.
    pub fn records(&self, model: &Model) -> Vec<(StudentId, UniversityId)> {
        let mut records: Vec<_> = self
            .iter()
            .map(|(s, u)| (model.student_id(s), model.university_id(u)))
            .collect();
        records.sort_unstable_by_key(|&(student, _)| student);
        records
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Assignment(students: {})", self.num_students())
    }
}
