use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value} (index={index})")]
    NonFinite {
        what: &'static str,
        value: f64,
        index: usize,
    },
}
