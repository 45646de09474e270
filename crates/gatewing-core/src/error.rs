use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Backfill task failed: {0}")]
    Backfill(String),
}
