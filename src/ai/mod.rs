pub mod ollama;
pub mod prompt;
pub mod response;
pub mod search;
