pub mod analyze;
pub mod llm;
