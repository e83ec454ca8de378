//! Built-in subject catalog shown before a test starts.

use std::collections::BTreeMap;

/// Semester subjects, keyed by semester number.
pub fn semester_subjects() -> BTreeMap<u8, Vec<&'static str>> {
  BTreeMap::from([
    (3, vec!["C Programming", "Data Structures", "Database Management", "Computer Networks"]),
    (5, vec!["Operating Systems", "Compiler Design", "Machine Learning", "Web Technologies"]),
  ])
}

/// Subjects offered for interview preparation.
pub fn interview_subjects() -> Vec<&'static str> {
  vec!["C Programming", "Data Structures", "Algorithms", "DBMS", "Operating Systems", "Computer Networks"]
}
