use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("transaction encoding failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay rejected transaction ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("relay returned no signature")]
    MissingSignature,
    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),
}
