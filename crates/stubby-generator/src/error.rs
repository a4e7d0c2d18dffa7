use thiserror::Error;

/// Errors returned when configuring a generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("alphabet is empty")]
    EmptyAlphabet,
    #[error("alphabet symbol {0:?} is not an ASCII letter or digit")]
    InvalidSymbol(char),
    #[error("alphabet symbol {0:?} appears more than once")]
    DuplicateSymbol(char),
    #[error("invalid alias length {length}; expected 1..={max_length}")]
    InvalidLength { length: usize, max_length: usize },
}
