pub mod genre;
pub mod summary;
pub mod track;
