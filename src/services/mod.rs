// src/services/mod.rs
pub mod cdi;
pub mod contribution;
pub mod format;
pub mod growth;
pub mod horizon;
pub mod parsing;
pub mod rate_cache;
pub mod rate_provider;
pub mod shares;
