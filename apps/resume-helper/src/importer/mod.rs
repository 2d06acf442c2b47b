pub mod coverage;
pub mod dedup;
pub mod extractor;
pub mod field_merge;
pub mod ingest;
pub mod prompts;
