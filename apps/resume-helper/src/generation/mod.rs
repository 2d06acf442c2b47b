// Resume tailoring: prompt assembly, reply post-processing, and the pipeline.
// All LLM calls go through llm_client.

pub mod builder;
pub mod formatter;
pub mod prompts;
