use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No cutting plan satisfies the demand: {0}")]
    Infeasible(String),
    #[error("Solver failure: {0}")]
    Solver(String),
    #[error("Stock length {stock_length} produces more than {limit} cutting patterns")]
    TooManyPatterns { stock_length: u64, limit: usize },
}

impl OptimizeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        OptimizeError::InvalidInput(message.into())
    }
}
