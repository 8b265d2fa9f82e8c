//! Core parsing and evaluation.

pub mod engine;
pub mod syntax;
