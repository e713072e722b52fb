//! Turns raw mark-sheet rows into graded-ready student input.
//!
//! This is the form layer: it owns shape limits and drops incomplete rows so
//! that `calc` only ever sees well-formed students.

use crate::calc::{CalcError, StudentInput};
use serde::Deserialize;
use serde_json::{json, Value};

pub const MAX_SUBJECTS: usize = 10;
pub const MAX_STUDENTS: usize = 50;
pub const MAX_MARK: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetShape {
    pub subject_count: usize,
    pub student_count: usize,
}

impl SheetShape {
    pub fn new(subject_count: usize, student_count: usize) -> Result<Self, CalcError> {
        if !(1..=MAX_SUBJECTS).contains(&subject_count) {
            return Err(CalcError::new(
                "bad_shape",
                format!("number of subjects must be between 1 and {}", MAX_SUBJECTS),
            )
            .with_details(json!({ "subjectCount": subject_count })));
        }
        if !(1..=MAX_STUDENTS).contains(&student_count) {
            return Err(CalcError::new(
                "bad_shape",
                format!("number of students must be between 1 and {}", MAX_STUDENTS),
            )
            .with_details(json!({ "studentCount": student_count })));
        }
        Ok(Self {
            subject_count,
            student_count,
        })
    }
}

/// One row as submitted by the entry form. Cells are loose JSON because blank
/// inputs arrive as `null` or `""`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStudentRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub marks: Vec<Value>,
}

/// Parses a mark cell the way a numeric form input is read: integer part only,
/// leading whitespace ignored, anything outside `0..=100` rejected.
pub fn parse_mark(cell: &Value) -> Option<u32> {
    let n: i64 = match cell {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => leading_integer(s.trim())?,
        _ => return None,
    };
    if !(0..=i64::from(MAX_MARK)).contains(&n) {
        return None;
    }
    u32::try_from(n).ok()
}

// Decimal digits only; "0x10" reads as 0.
fn leading_integer(s: &str) -> Option<i64> {
    let (sign, digits) = match s.as_bytes().first().copied()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

/// Keeps rows that have a name and exactly `subject_count` usable marks.
pub fn collect_students(
    shape: SheetShape,
    rows: &[RawStudentRow],
) -> Result<Vec<StudentInput>, CalcError> {
    let mut out = Vec::new();
    for (index, row) in rows.iter().take(shape.student_count).enumerate() {
        let name = row.name.as_deref().map(str::trim).unwrap_or("");
        if name.is_empty() {
            tracing::debug!(index, "skipping row without a name");
            continue;
        }

        let marks: Vec<u32> = row
            .marks
            .iter()
            .take(shape.subject_count)
            .filter_map(parse_mark)
            .collect();
        if marks.len() != shape.subject_count {
            tracing::debug!(
                index,
                name,
                usable = marks.len(),
                expected = shape.subject_count,
                "skipping row with incomplete marks"
            );
            continue;
        }

        out.push(StudentInput {
            name: name.to_string(),
            marks,
        });
    }

    if out.is_empty() {
        return Err(CalcError::new(
            "no_complete_students",
            "fill in at least one student with all marks",
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: Option<&str>, marks: Value) -> RawStudentRow {
        serde_json::from_value(json!({ "name": name, "marks": marks })).expect("row")
    }

    #[test]
    fn shape_limits() {
        assert!(SheetShape::new(1, 1).is_ok());
        assert!(SheetShape::new(10, 50).is_ok());
        assert_eq!(SheetShape::new(0, 2).unwrap_err().code, "bad_shape");
        assert_eq!(SheetShape::new(11, 2).unwrap_err().code, "bad_shape");
        assert_eq!(SheetShape::new(3, 51).unwrap_err().code, "bad_shape");
    }

    #[test]
    fn parse_mark_reads_integer_part() {
        assert_eq!(parse_mark(&json!(85)), Some(85));
        assert_eq!(parse_mark(&json!(" 72 ")), Some(72));
        assert_eq!(parse_mark(&json!("85.7")), Some(85));
        assert_eq!(parse_mark(&json!(99.9)), Some(99));
        assert_eq!(parse_mark(&json!("")), None);
        assert_eq!(parse_mark(&json!("abc")), None);
        assert_eq!(parse_mark(&Value::Null), None);
        assert_eq!(parse_mark(&json!(101)), None);
        assert_eq!(parse_mark(&json!("-5")), None);
        assert_eq!(parse_mark(&json!("0x10")), Some(0));
    }

    #[test]
    fn incomplete_and_unnamed_rows_are_dropped() {
        let shape = SheetShape::new(3, 4).expect("shape");
        let rows = vec![
            row(Some("Alice"), json!([90, "95", 100])),
            row(Some("  "), json!([1, 2, 3])),
            row(Some("Bob"), json!([40, null, 45])),
            row(Some(" Cy "), json!([60, 61, 62, 63])),
        ];
        let students = collect_students(shape, &rows).expect("students");
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Alice");
        assert_eq!(students[0].marks, vec![90, 95, 100]);
        // Extra cells past the subject count are ignored.
        assert_eq!(students[1].name, "Cy");
        assert_eq!(students[1].marks, vec![60, 61, 62]);
    }

    #[test]
    fn rows_past_student_count_are_ignored() {
        let shape = SheetShape::new(1, 1).expect("shape");
        let rows = vec![row(Some("a"), json!([1])), row(Some("b"), json!([2]))];
        let students = collect_students(shape, &rows).expect("students");
        assert_eq!(students.len(), 1);
    }

    #[test]
    fn nothing_usable_is_reported() {
        let shape = SheetShape::new(2, 2).expect("shape");
        let rows = vec![row(None, json!([1, 2])), row(Some("x"), json!([1]))];
        let e = collect_students(shape, &rows).unwrap_err();
        assert_eq!(e.code, "no_complete_students");
    }
}
