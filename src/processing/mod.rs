//! Text preprocessing module

pub mod budget;
pub mod text_processor;

pub use budget::SizeBudget;
pub use text_processor::{preprocess, ProcessedText, TextProcessor};
