use thiserror::Error;

/// Rejections raised while turning client filter data into SQL. All of them
/// are the caller's fault and surface as 400s.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid where clause: {0}")]
    InvalidWhere(&'static str),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("{op} expects {expected}")]
    InvalidOperand { op: String, expected: &'static str },

    #[error("{0} must be non-negative")]
    NegativePaging(&'static str),
}
