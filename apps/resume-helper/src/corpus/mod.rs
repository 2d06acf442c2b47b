pub mod merge;
pub mod store;
