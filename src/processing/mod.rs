//! Local text processing: keyword counting and the resume draft store

pub mod keywords;
pub mod resume;
