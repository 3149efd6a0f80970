// src/handlers/mod.rs
pub mod calculators;
pub mod error;
pub mod rate;
