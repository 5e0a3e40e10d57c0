//! # llkit-calc
//!
//! A small integer calculator built on **llkit**, showing the whole
//! pipeline: an automaton tokenizer compiled from mini-patterns, a
//! left-recursive grammar read from an embedded `.llg` file and converted to
//! LL(1), and native functions called by the grammar's semantic actions.
//!
//! ```rust
//! use llkit_calc::Calculator;
//!
//! let calc = Calculator::with_vars([("blocks", 3)]);
//! assert_eq!(calc.eval("blocks * 4k + 1").unwrap(), 12289);
//! ```
//!
//! The converted grammar and tokenizer are built once and shared by every
//! [`Calculator`].

pub mod calc;
pub mod error;
pub mod lexer;

pub use calc::{Calculator, grammar, parse_size};
pub use error::CalcError;
