pub mod accounts;
pub mod grades;
pub mod matching;
pub mod subjects;
