//! # conveyor-core
//!
//! Core crate for Conveyor. Contains configuration schemas, the unified
//! error system, and validation helpers.
//!
//! This crate has **no** internal dependencies on other Conveyor crates.

pub mod config;
pub mod error;
pub mod result;
pub mod validate;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
