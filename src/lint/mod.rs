//! Lint layer
//! - checker.rs: Checker trait and the `lll` subprocess invoker
//! - parser.rs: turns checker output into problems
//! - error.rs: CheckerError

pub mod checker;
pub mod error;
pub mod parser;

pub use checker::{Checker, LllChecker};
pub use error::CheckerError;
pub use parser::{Problem, parse_output};
