//! File input and output.

pub mod export;
