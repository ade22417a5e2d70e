//! Utility functions for the application

pub mod file;
pub mod json;
pub mod sql;
