use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Letter grade bands, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    F,
}

/// Inclusive lower bounds on the average, evaluated top to bottom.
const GRADE_BANDS: [(f64, Grade); 4] = [
    (90.0, Grade::APlus),
    (75.0, Grade::A),
    (60.0, Grade::B),
    (50.0, Grade::C),
];

impl Grade {
    pub fn from_average(average: f64) -> Self {
        GRADE_BANDS
            .iter()
            .find(|(floor, _)| average >= *floor)
            .map(|(_, g)| *g)
            .unwrap_or(Grade::F)
    }

    pub fn remark(self) -> Remark {
        match self {
            Grade::APlus => Remark::Outstanding,
            Grade::A => Remark::VeryGood,
            Grade::B => Remark::Good,
            Grade::C => Remark::Satisfactory,
            Grade::F => Remark::NeedsImprovement,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Remark {
    Outstanding,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Satisfactory,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Remark {
    pub fn label(self) -> &'static str {
        match self {
            Remark::Outstanding => "Outstanding",
            Remark::VeryGood => "Very Good",
            Remark::Good => "Good",
            Remark::Satisfactory => "Satisfactory",
            Remark::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Students per grade, keyed in first-seen order.
pub type GradeCounts = IndexMap<Grade, usize>;

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInput {
    pub name: String,
    pub marks: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkGrade {
    pub average: f64,
    pub best_subject_index: usize,
    pub grade: Grade,
    pub remark: Remark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedStudent {
    pub name: String,
    pub marks: Vec<u32>,
    pub average: f64,
    pub grade: Grade,
    // Older stored reports may predate this field.
    #[serde(default)]
    pub best_subject: String,
    pub remark: Remark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub class_average: f64,
    pub grade_counts: GradeCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub students: Vec<GradedStudent>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedStats {
    pub all_students: Vec<GradedStudent>,
    pub class_average: f64,
    pub grade_counts: GradeCounts,
}

/// Result of folding every stored report together. `NoData` is kept apart from
/// a zero class average so views can render an empty state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CombinedSummary {
    NoData,
    Data(CombinedStats),
}

impl CombinedSummary {
    pub fn has_data(&self) -> bool {
        matches!(self, CombinedSummary::Data(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_reports: usize,
    pub total_students: usize,
}

pub fn best_subject_label(index: usize) -> String {
    format!("Subject {}", index + 1)
}

/// Grades one student's marks. Returns `None` for an empty mark list rather
/// than an undefined average.
pub fn grade_marks(marks: &[u32]) -> Option<MarkGrade> {
    let (&first, rest) = marks.split_first()?;

    let mut sum: u64 = u64::from(first);
    let mut best = first;
    let mut best_subject_index = 0;
    for (i, &m) in rest.iter().enumerate() {
        sum += u64::from(m);
        // Strict comparison: the first occurrence of the maximum wins.
        if m > best {
            best = m;
            best_subject_index = i + 1;
        }
    }

    let average = sum as f64 / marks.len() as f64;
    let grade = Grade::from_average(average);
    Some(MarkGrade {
        average,
        best_subject_index,
        grade,
        remark: grade.remark(),
    })
}

/// Class average and grade histogram over already graded students.
/// Every student weighs the same regardless of how many subjects they took.
pub fn summarize(students: &[GradedStudent]) -> Option<ReportSummary> {
    if students.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut grade_counts = GradeCounts::new();
    for s in students {
        total += s.average;
        *grade_counts.entry(s.grade).or_insert(0) += 1;
    }

    Some(ReportSummary {
        class_average: total / students.len() as f64,
        grade_counts,
    })
}

pub fn grade_student(student: &StudentInput) -> Option<GradedStudent> {
    let g = grade_marks(&student.marks)?;
    Some(GradedStudent {
        name: student.name.clone(),
        marks: student.marks.clone(),
        average: g.average,
        grade: g.grade,
        best_subject: best_subject_label(g.best_subject_index),
        remark: g.remark,
    })
}

pub fn aggregate(students: &[StudentInput]) -> Result<Report, CalcError> {
    let mut graded = Vec::with_capacity(students.len());
    for (index, s) in students.iter().enumerate() {
        let Some(g) = grade_student(s) else {
            return Err(CalcError::new("no_marks", "student has no marks")
                .with_details(serde_json::json!({ "index": index, "name": s.name })));
        };
        graded.push(g);
    }

    let Some(summary) = summarize(&graded) else {
        return Err(CalcError::new("no_students", "report has no students"));
    };

    Ok(Report {
        students: graded,
        summary,
    })
}

/// Flattens students across reports (report order, then original order) and
/// recomputes the summary over the whole set.
pub fn combine<'a, I>(reports: I) -> CombinedSummary
where
    I: IntoIterator<Item = &'a Report>,
{
    let all_students: Vec<GradedStudent> = reports
        .into_iter()
        .flat_map(|r| r.students.iter().cloned())
        .collect();

    match summarize(&all_students) {
        None => CombinedSummary::NoData,
        Some(summary) => CombinedSummary::Data(CombinedStats {
            all_students,
            class_average: summary.class_average,
            grade_counts: summary.grade_counts,
        }),
    }
}

pub fn profile_stats<'a, I>(reports: I) -> ProfileStats
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut stats = ProfileStats {
        total_reports: 0,
        total_students: 0,
    };
    for r in reports {
        stats.total_reports += 1;
        stats.total_students += r.students.len();
    }
    stats
}
