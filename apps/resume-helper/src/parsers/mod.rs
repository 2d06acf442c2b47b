pub mod job;
pub mod pdf;
