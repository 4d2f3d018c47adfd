pub mod models;
pub mod submission;
