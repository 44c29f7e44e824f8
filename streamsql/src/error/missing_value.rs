use std::error::Error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq)]
pub struct MissingValueError {
    pub field_name: String,
}

impl MissingValueError {
    pub fn new<F>(field_name: F) -> Self
    where
        F: Into<String>,
    {
        MissingValueError {
            field_name: field_name.into(),
        }
    }
}

impl Error for MissingValueError {}

impl Display for MissingValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Missing value for field '{}'", self.field_name)
    }
}
