pub mod accuracy;
pub mod align;
pub mod analyzer;
pub mod engine;
pub mod report;
pub mod scoring;
pub mod vibrato;
