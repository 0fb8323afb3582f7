use thiserror::Error;

pub type HlResult<T> = Result<T, HlError>;

#[derive(Error, Debug)]
pub enum HlError {
    #[error("Unknown load field: {name}")]
    UnknownField { name: String },
}
