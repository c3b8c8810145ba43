//! Port scanning: the lsof output parser and the scanner built on it.

mod lsof;
pub mod parser;

pub use lsof::LsofScanner;
pub use parser::{parse_lsof_output, parse_name_field};
