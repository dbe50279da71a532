pub mod openai;
pub mod summarizer;
pub(crate) mod tokens;
