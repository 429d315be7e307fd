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

//! CSV writer for assignments.
//!
//! The output has the header `student_id,university_id` and one row per
//! student, ordered by `student_id` ascending.

use crate::{assignment::Assignment, model::Model};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Writes assignments back in the external identifier vocabulary of a model.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentWriter<'m> {
    model: &'m Model,
}

impl<'m> AssignmentWriter<'m> {
    /// Creates a writer for assignments of `model`.
    #[inline]
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    /// Writes `assignment` as CSV to `w`.
    pub fn write_to<W: Write>(&self, assignment: &Assignment, mut w: W) -> std::io::Result<()> {
        debug_assert_eq!(
            assignment.num_students(),
            self.model.num_students(),
            "called `AssignmentWriter::write_to` with an assignment of {} students for a model of {}",
            assignment.num_students(),
            self.model.num_students()
        );

        writeln!(w, "student_id,university_id")?;
        for (student, university) in assignment.records(self.model) {
            writeln!(w, "{},{}", student, university)?;
        }
        w.flush()
    }

    /// Creates (or truncates) the file at `path` and writes `assignment` into it.
    pub fn write_to_path<P: AsRef<Path>>(
        &self,
        assignment: &Assignment,
        path: P,
    ) -> std::io::Result<()> {
        let file = File::create(path)?;
        self.write_to(assignment, BufWriter::new(file))
    }
}
