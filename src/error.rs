use std::error;
use std::fmt;




/**
 * Error to represent invalid physical parameters or an inconsistent grid
 * hierarchy, detected at setup time.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    NonPhysicalParameter { name: &'static str, value: f64 },
    IncompatibleLayout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        use Error::*;

        match self {
            NonPhysicalParameter { name, value } => write!(fmt, "non-physical parameter {}: {}", name, value),
            IncompatibleLayout(what) => write!(fmt, "incompatible layout: {}", what),
        }
    }
}

impl error::Error for Error {}
