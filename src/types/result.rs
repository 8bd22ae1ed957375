//! Result alias used across the crate.

use super::error::EvalError;

pub type Result<T> = std::result::Result<T, EvalError>;
