pub mod cache;
pub mod gamma_api;
pub mod normalizer;
pub mod types;
