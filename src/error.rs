//! Error definition & utilities.
//!
//! Every fallible operation in the engine reports a [QuedistError], which carries the location
//! where the error was produced alongside a human-readable message.

use std::{error, fmt};

/// An error produced somewhere in the engine.
#[derive(Debug, Clone)]
pub struct QuedistError {
    /// The function the error was produced in.
    pub function: String,
    /// The line the error was produced on.
    pub line: u32,
    /// The file the error was produced in.
    pub file: String,
    /// The error message.
    pub message: String,
}

impl error::Error for QuedistError {}
impl fmt::Display for QuedistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Create a [QuedistError] with a formatted message.
#[macro_export]
macro_rules! error {
    ( $( $arg:expr ),+ ) => {{
        QuedistError {
            message: format!($( $arg ),+),
            function: module_path!().to_string(),
            file: file!().to_string(),
            line: line!(),
        }
    }};
}

/// Create an `Err` containing a [QuedistError] with a formatted message.
#[macro_export]
macro_rules! fail {
    ( $( $arg:expr ),+ ) => {{
        Err(error!($( $arg ),+))
    }};
}
