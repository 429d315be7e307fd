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

use unimatch_core::utils::index::{TypedIndex, TypedIndexTag};

/// A tag type for student indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StudentIndexTag;

impl TypedIndexTag for StudentIndexTag {
    const NAME: &'static str = "StudentIndex";
}

/// A dense position of a student inside the model tables.
pub type StudentIndex = TypedIndex<StudentIndexTag>;

/// A tag type for university indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UniversityIndexTag;

impl TypedIndexTag for UniversityIndexTag {
    const NAME: &'static str = "UniversityIndex";
}

/// A dense position of a university inside the model tables.
pub type UniversityIndex = TypedIndex<UniversityIndexTag>;

/// External student identifier, as it appears in the input tables.
pub type StudentId = u64;

/// External university identifier, as it appears in the input tables.
pub type UniversityId = u64;
