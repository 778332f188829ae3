pub mod display;
pub mod formatter;
