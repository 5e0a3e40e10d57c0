//! # Calculator Error Type
//!
//! [`CalcError`] collects the ways an evaluation can fail: the embedded
//! grammar or tokenizer could not be built, the input did not parse or an
//! operation failed (both reported by `llkit`), or the expression produced
//! something other than an integer.
use llkit::{LlError, Value};
use smartstring::alias::String;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    /// The embedded grammar or tokenizer tables could not be built.
    #[error("calculator tables: {0}")]
    Tables(String),

    /// A syntax error or a failed operation such as division by zero.
    ///
    /// Converted from [`LlError`] via `#[from]`.
    #[error(transparent)]
    Eval(#[from] LlError),

    /// The start symbol carried no integer result.
    #[error("expression produced {0} instead of an integer")]
    NotInteger(Value),
}

impl CalcError {
    /// Was the input malformed, as opposed to well-formed but not computable?
    pub fn is_syntax(&self) -> bool {
        matches!(self, CalcError::Eval(LlError::Syntax { .. }))
    }
}
