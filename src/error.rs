use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid range: from={from} must not exceed to={to}")]
    InvalidRange { from: f64, to: f64 },

    #[error("time scale has no data points")]
    EmptyScale,

    #[error("subscription attempted on a destroyed delegate")]
    UseAfterDestroy,
}
