use serde::{Deserialize, Serialize};

use super::{CsvRow, Resource, Searchable, string_or_number};

/// Student record as returned by `/students/`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gpa: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

pub(crate) fn default_active() -> bool {
    true
}

/// Create/update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentForm {
    pub student_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub date_of_birth: String,
    pub gender: String,
    pub grade: String,
    pub address: String,
    pub gpa: String,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            student_id: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            date_of_birth: String::new(),
            gender: "M".to_string(),
            grade: String::new(),
            address: String::new(),
            gpa: String::new(),
        }
    }
}

impl From<&Student> for StudentForm {
    /// Prefill an edit form from an existing record
    fn from(student: &Student) -> Self {
        let (first_name, last_name) = split_name(student.full_name.as_deref().unwrap_or_default());
        Self {
            student_id: student.student_id.clone().unwrap_or_default(),
            email: student.email.clone().unwrap_or_default(),
            first_name,
            last_name,
            phone_number: String::new(),
            date_of_birth: student.date_of_birth.clone().unwrap_or_default(),
            gender: student.gender.clone().unwrap_or_else(|| "M".to_string()),
            grade: student.grade.clone().unwrap_or_default(),
            address: student.address.clone().unwrap_or_default(),
            gpa: student.gpa.clone().unwrap_or_default(),
        }
    }
}

/// First word is the first name, the rest is the last name
pub(crate) fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

impl Resource for Student {
    const PATH: &'static str = "/students/";
    const LABEL: &'static str = "students";
    type Form = StudentForm;
}

impl Searchable for Student {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.student_id.as_deref(),
            self.full_name.as_deref(),
            self.email.as_deref(),
        ]
    }
}

impl CsvRow for Student {
    const HEADER: &'static [&'static str] = &["Student ID", "Name", "Email", "Grade", "GPA", "Status"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.student_id.clone().unwrap_or_default(),
            self.full_name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.grade.clone().unwrap_or_default(),
            self.gpa.clone().unwrap_or_default(),
            status_label(self.is_active).to_string(),
        ]
    }
}

pub(crate) fn status_label(active: bool) -> &'static str {
    if active { "Active" } else { "Inactive" }
}

/// Search box plus the grade dropdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilter {
    pub search: String,
    /// Exact grade; `None` or empty means all grades
    pub grade: Option<String>,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        let grade_matches = match self.grade.as_deref() {
            None | Some("") => true,
            Some(grade) => student.grade.as_deref() == Some(grade),
        };
        grade_matches && student.matches_search(&self.search)
    }

    pub fn apply<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        students.iter().filter(|s| self.matches(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, student_id: &str, name: &str, email: &str, grade: &str) -> Student {
        Student {
            id,
            student_id: Some(student_id.to_string()),
            full_name: Some(name.to_string()),
            email: Some(email.to_string()),
            grade: Some(grade.to_string()),
            is_active: true,
            ..Default::default()
        }
    }

    fn roster() -> Vec<Student> {
        vec![
            student(1, "S-001", "Alice Smith", "alice@school.edu", "10"),
            student(2, "S-002", "Bob Jones", "bob@school.edu", "11"),
            student(3, "S-003", "Carol White", "carol@example.org", "10"),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let students = roster();
        let filter = StudentFilter {
            search: "ALICE".to_string(),
            grade: None,
        };

        let found = filter.apply(&students);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_search_matches_id_and_email() {
        let students = roster();
        assert_eq!(super::super::filter_by_search(&students, "s-002").len(), 1);
        assert_eq!(super::super::filter_by_search(&students, "example.org").len(), 1);
        assert_eq!(super::super::filter_by_search(&students, "school.edu").len(), 2);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let students = roster();
        assert_eq!(StudentFilter::default().apply(&students).len(), 3);

        let blank_grade = StudentFilter {
            search: "  ".to_string(),
            grade: Some(String::new()),
        };
        assert_eq!(blank_grade.apply(&students).len(), 3);
    }

    #[test]
    fn test_grade_filter_combines_with_search() {
        let students = roster();
        let filter = StudentFilter {
            search: "c".to_string(),
            grade: Some("10".to_string()),
        };

        let ids: Vec<i64> = filter.apply(&students).iter().map(|s| s.id).collect();
        // every row contains "c"; Bob is grade 11
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_missing_fields_do_not_match() {
        let bare = Student {
            id: 4,
            ..Default::default()
        };
        assert!(!bare.matches_search("x"));
        assert!(bare.matches_search(""));
    }

    #[test]
    fn test_deserialize_drf_payload() {
        let json = r#"{
            "id": 12,
            "user": {"id": 40, "email": "dan@school.edu"},
            "student_id": "S-012",
            "full_name": "Dan Brown",
            "email": "dan@school.edu",
            "date_of_birth": "2009-04-01",
            "age": 16,
            "gender": "M",
            "grade": "9",
            "gpa": "3.25",
            "is_active": false,
            "created_at": "2025-01-01T00:00:00Z"
        }"#;

        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!(student.grade.as_deref(), Some("9"));
        assert_eq!(student.gpa.as_deref(), Some("3.25"));
        assert_eq!(student.age, Some(16));
        assert!(!student.is_active);
    }

    #[test]
    fn test_form_from_student() {
        let mut record = student(1, "S-001", "Alice May Smith", "alice@school.edu", "10");
        record.gpa = Some("3.8".to_string());

        let form = StudentForm::from(&record);

        assert_eq!(form.first_name, "Alice");
        assert_eq!(form.last_name, "May Smith");
        assert_eq!(form.gender, "M");
        assert_eq!(form.gpa, "3.8");
    }

    #[test]
    fn test_csv_row() {
        let mut record = student(1, "S-001", "Alice Smith", "alice@school.edu", "10");
        record.is_active = false;

        assert_eq!(
            record.csv_row(),
            vec!["S-001", "Alice Smith", "alice@school.edu", "10", "", "Inactive"]
        );
    }
}
