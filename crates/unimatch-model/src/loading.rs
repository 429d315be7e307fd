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

//! CSV loader for assignment instances.
//!
//! An instance is spread over three tables plus a seed assignment:
//!
//! ```raw
//! students.csv       student_id,pref_1,pref_2,...,pref_50
//! universities.csv   university_id,cap            (or `capacity`)
//! merit_list.csv     student_id,merit_rank
//! seed.csv           student_id,university_id
//! ```
//!
//! The reader is intentionally small. It understands a header row, comma
//! separated fields, double-quoted fields with `""` escapes, a leading UTF-8
//! byte order mark and blank lines. Columns are matched by name
//! (case-insensitively), so their order is free and unknown columns are
//! ignored. Empty preference cells (and `nan`, as written by dataframe tools)
//! leave that rank empty.
//!
//! Identifiers and integer cells accept integral floats such as `12.0`,
//! because exported preference columns with gaps are commonly written as
//! floating-point numbers.
//!
//! Every error names the resource it came from and, where applicable, the
//! 1-based line and the column, so a broken input can be located directly.

use crate::{
    assignment::{Assignment, AssignmentError},
    index::{StudentId, UniversityId},
    model::{Model, ModelBuilder, ModelError},
};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Details about a cell that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldError {
    /// The resource (usually a file path) the cell was read from.
    pub resource: String,
    /// The 1-based line number.
    pub line: usize,
    /// The column name from the header.
    pub column: String,
    /// The raw cell content.
    pub token: String,
    /// A description of what was expected.
    pub expected: &'static str,
}

impl std::fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: could not parse '{}' in column '{}' as {}",
            self.resource, self.line, self.token, self.column, self.expected
        )
    }
}

impl std::error::Error for ParseFieldError {}

/// The error type for instance loading.
#[derive(Debug)]
pub enum LoadError {
    /// The resource could not be opened or read.
    Io {
        resource: String,
        source: std::io::Error,
    },
    /// The resource has no header row.
    EmptyResource { resource: String },
    /// A required column is not present in the header.
    MissingColumn {
        resource: String,
        column: &'static str,
    },
    /// A cell could not be parsed.
    Parse(ParseFieldError),
    /// A row has a different number of fields than the header.
    RowLength {
        resource: String,
        line: usize,
        expected: usize,
        actual: usize,
    },
    /// The loaded tables are inconsistent with each other.
    Model(ModelError),
    /// The assignment is inconsistent with the model.
    Assignment(AssignmentError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { resource, source } => write!(f, "{}: I/O error: {}", resource, source),
            Self::EmptyResource { resource } => write!(f, "{}: no header row found", resource),
            Self::MissingColumn { resource, column } => {
                write!(f, "{}: missing required column '{}'", resource, column)
            }
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RowLength {
                resource,
                line,
                expected,
                actual,
            } => write!(
                f,
                "{}:{}: expected {} fields but found {}",
                resource, line, expected, actual
            ),
            Self::Model(e) => write!(f, "Invalid instance: {}", e),
            Self::Assignment(e) => write!(f, "Invalid assignment: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Model(e) => Some(e),
            Self::Assignment(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseFieldError> for LoadError {
    fn from(e: ParseFieldError) -> Self {
        Self::Parse(e)
    }
}

impl From<ModelError> for LoadError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<AssignmentError> for LoadError {
    fn from(e: AssignmentError) -> Self {
        Self::Assignment(e)
    }
}

/// A configurable loader for the CSV tables of an instance.
///
/// # Configuration
/// * `strict_preferences`: reject preferences that name an unknown university
///   instead of ignoring them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceLoader {
    strict_preferences: bool,
}

impl InstanceLoader {
    /// Creates a new `InstanceLoader` with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures whether an unknown university in a preference list is an error.
    #[inline]
    pub fn strict_preferences(mut self, yes: bool) -> Self {
        self.strict_preferences = yes;
        self
    }

    /// Loads a model from the three table files.
    pub fn load_model_from_paths<P1, P2, P3>(
        &self,
        students: P1,
        universities: P2,
        merit: P3,
    ) -> Result<Model, LoadError>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let (students_name, students_rdr) = open(students.as_ref())?;
        let (universities_name, universities_rdr) = open(universities.as_ref())?;
        let (merit_name, merit_rdr) = open(merit.as_ref())?;
        self.load_model_from_bufread(
            (&students_name, students_rdr),
            (&universities_name, universities_rdr),
            (&merit_name, merit_rdr),
        )
    }

    /// Loads a model from three in-memory tables.
    #[inline]
    pub fn load_model_from_str(
        &self,
        students: &str,
        universities: &str,
        merit: &str,
    ) -> Result<Model, LoadError> {
        self.load_model_from_bufread(
            ("students", students.as_bytes()),
            ("universities", universities.as_bytes()),
            ("merit", merit.as_bytes()),
        )
    }

    /// Loads a model from three named readers.
    ///
    /// Each argument pairs a resource name, used in error messages, with its reader.
    pub fn load_model_from_bufread<R1, R2, R3>(
        &self,
        students: (&str, R1),
        universities: (&str, R2),
        merit: (&str, R3),
    ) -> Result<Model, LoadError>
    where
        R1: BufRead,
        R2: BufRead,
        R3: BufRead,
    {
        let mut builder = ModelBuilder::new();
        builder.strict_preferences(self.strict_preferences);

        self.read_universities(&mut builder, universities.0, universities.1)?;
        self.read_students(&mut builder, students.0, students.1)?;
        self.read_merit(&mut builder, merit.0, merit.1)?;

        Ok(builder.build()?)
    }

    /// Loads an assignment for `model` from a file.
    pub fn load_assignment_from_path<P: AsRef<Path>>(
        &self,
        model: &Model,
        path: P,
    ) -> Result<Assignment, LoadError> {
        let (name, rdr) = open(path.as_ref())?;
        self.load_assignment_from_bufread(model, &name, rdr)
    }

    /// Loads an assignment for `model` from an in-memory table.
    #[inline]
    pub fn load_assignment_from_str(
        &self,
        model: &Model,
        s: &str,
    ) -> Result<Assignment, LoadError> {
        self.load_assignment_from_bufread(model, "assignment", s.as_bytes())
    }

    /// Loads an assignment for `model` from a named reader.
    pub fn load_assignment_from_bufread<R: BufRead>(
        &self,
        model: &Model,
        resource: &str,
        rdr: R,
    ) -> Result<Assignment, LoadError> {
        let mut table = CsvTable::new(resource, rdr)?;
        let student_col = table.require("student_id")?;
        let university_col = table.require("university_id")?;

        let mut records = Vec::with_capacity(model.num_students());
        while let Some(row) = table.next_row()? {
            let student: StudentId = row.parse_id(student_col)?;
            let university: UniversityId = row.parse_id(university_col)?;
            records.push((student, university));
        }

        Ok(Assignment::from_records(model, records)?)
    }

    fn read_universities<R: BufRead>(
        &self,
        builder: &mut ModelBuilder,
        resource: &str,
        rdr: R,
    ) -> Result<(), LoadError> {
        let mut table = CsvTable::new(resource, rdr)?;
        let id_col = table.require("university_id")?;
        let cap_col = match table.column("cap") {
            Some(c) => c,
            None => table.require("capacity")?,
        };

        while let Some(row) = table.next_row()? {
            let id = row.parse_id(id_col)?;
            let capacity = row.parse_u32(cap_col)?;
            builder.add_university(id, capacity)?;
        }
        Ok(())
    }

    fn read_students<R: BufRead>(
        &self,
        builder: &mut ModelBuilder,
        resource: &str,
        rdr: R,
    ) -> Result<(), LoadError> {
        let mut table = CsvTable::new(resource, rdr)?;
        let id_col = table.require("student_id")?;

        // (field position, preference position) for every `pref_k` column.
        let pref_cols: Vec<(usize, usize)> = table
            .header
            .iter()
            .enumerate()
            .filter_map(|(i, name)| preference_position(name).map(|p| (i, p)))
            .collect();
        let width = pref_cols.iter().map(|&(_, p)| p + 1).max().unwrap_or(0);

        while let Some(row) = table.next_row()? {
            let id = row.parse_id(id_col)?;
            let mut preferences = vec![None; width];
            for &(col, position) in &pref_cols {
                preferences[position] = row.parse_optional_id(col)?;
            }
            builder.add_student(id, preferences)?;
        }
        Ok(())
    }

    fn read_merit<R: BufRead>(
        &self,
        builder: &mut ModelBuilder,
        resource: &str,
        rdr: R,
    ) -> Result<(), LoadError> {
        let mut table = CsvTable::new(resource, rdr)?;
        let id_col = table.require("student_id")?;
        let rank_col = table.require("merit_rank")?;

        while let Some(row) = table.next_row()? {
            let id = row.parse_id(id_col)?;
            let rank = row.parse_u32(rank_col)?;
            builder.set_merit_rank(id, rank)?;
        }
        Ok(())
    }
}

fn open(path: &Path) -> Result<(String, BufReader<File>), LoadError> {
    let resource = path.display().to_string();
    match File::open(path) {
        Ok(file) => Ok((resource, BufReader::new(file))),
        Err(source) => Err(LoadError::Io { resource, source }),
    }
}

/// Maps a `pref_k` header (k >= 1) to the zero-based preference position.
fn preference_position(name: &str) -> Option<usize> {
    let lower = name.to_ascii_lowercase();
    let k: usize = lower.strip_prefix("pref_")?.parse().ok()?;
    k.checked_sub(1)
}

/// Splits one CSV line into trimmed fields, honoring double quotes.
fn split_fields(line: &str, out: &mut Vec<String>) {
    out.clear();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                out.push(field.trim().to_owned());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    out.push(field.trim().to_owned());
}

/// A header-aware line reader over one CSV resource.
struct CsvTable<'a, R> {
    resource: &'a str,
    rdr: R,
    header: Vec<String>,
    line: usize,
    buf: String,
    fields: Vec<String>,
}

impl<'a, R: BufRead> CsvTable<'a, R> {
    /// Reads the header row.
    fn new(resource: &'a str, rdr: R) -> Result<Self, LoadError> {
        let mut table = Self {
            resource,
            rdr,
            header: Vec::new(),
            line: 0,
            buf: String::new(),
            fields: Vec::new(),
        };

        if !table.fill_line()? {
            return Err(LoadError::EmptyResource {
                resource: resource.to_owned(),
            });
        }
        let mut header = Vec::new();
        split_fields(table.buf.trim_start_matches('\u{feff}'), &mut header);
        table.header = header;
        Ok(table)
    }

    /// Reads the next non-blank line into `buf`. Returns `Ok(false)` on EOF.
    fn fill_line(&mut self) -> Result<bool, LoadError> {
        loop {
            self.buf.clear();
            let n = self
                .rdr
                .read_line(&mut self.buf)
                .map_err(|source| LoadError::Io {
                    resource: self.resource.to_owned(),
                    source,
                })?;
            if n == 0 {
                return Ok(false);
            }
            self.line += 1;
            if !self.buf.trim().is_empty() {
                let trimmed_len = self.buf.trim_end_matches(['\r', '\n']).len();
                self.buf.truncate(trimmed_len);
                return Ok(true);
            }
        }
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    fn require(&self, name: &'static str) -> Result<usize, LoadError> {
        self.column(name).ok_or_else(|| LoadError::MissingColumn {
            resource: self.resource.to_owned(),
            column: name,
        })
    }

    fn next_row(&mut self) -> Result<Option<Row<'_>>, LoadError> {
        if !self.fill_line()? {
            return Ok(None);
        }
        split_fields(&self.buf, &mut self.fields);
        if self.fields.len() != self.header.len() {
            return Err(LoadError::RowLength {
                resource: self.resource.to_owned(),
                line: self.line,
                expected: self.header.len(),
                actual: self.fields.len(),
            });
        }
        Ok(Some(Row {
            resource: self.resource,
            line: self.line,
            header: &self.header,
            fields: &self.fields,
        }))
    }
}

/// One data row, borrowed from its table.
struct Row<'t> {
    resource: &'t str,
    line: usize,
    header: &'t [String],
    fields: &'t [String],
}

impl Row<'_> {
    fn error(&self, col: usize, expected: &'static str) -> ParseFieldError {
        ParseFieldError {
            resource: self.resource.to_owned(),
            line: self.line,
            column: self.header[col].clone(),
            token: self.fields[col].clone(),
            expected,
        }
    }

    fn parse_id(&self, col: usize) -> Result<u64, ParseFieldError> {
        parse_integral(&self.fields[col]).ok_or_else(|| self.error(col, "a non-negative integer"))
    }

    fn parse_optional_id(&self, col: usize) -> Result<Option<u64>, ParseFieldError> {
        let token = self.fields[col].as_str();
        if token.is_empty() || token.eq_ignore_ascii_case("nan") {
            return Ok(None);
        }
        parse_integral(token)
            .map(Some)
            .ok_or_else(|| self.error(col, "a non-negative integer or an empty cell"))
    }

    fn parse_u32(&self, col: usize) -> Result<u32, ParseFieldError> {
        parse_integral(&self.fields[col])
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| self.error(col, "a non-negative 32-bit integer"))
    }
}

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Parses `12` or an integral float such as `12.0`.
fn parse_integral(token: &str) -> Option<u64> {
    if let Ok(v) = token.parse::<u64>() {
        return Some(v);
    }
    let f: f64 = token.parse().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= MAX_EXACT_FLOAT {
        Some(f as u64)
    } else {
        None
    }
}
