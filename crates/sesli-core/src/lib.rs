//! Core types, config, errors, and conversation model for Sesli.

pub mod config;
pub mod error;
pub mod history;
pub mod protocol;
