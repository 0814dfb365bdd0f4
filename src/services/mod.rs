pub mod host;
pub mod llm;
pub mod prompts;
pub mod structure;
#[cfg(test)]
pub mod testing;
pub mod translator;
