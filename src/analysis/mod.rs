pub mod analyst;
pub mod pipeline;
