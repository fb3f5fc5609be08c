use std::path::PathBuf;

use alloy::signers::local::LocalSignerError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the deployment table builder and the typed-signature assembler.
///
/// Nothing is recovered locally: every variant aborts the current run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A deployment source record without exactly one usable chain identifier.
    #[error("malformed deployments input: {0}")]
    MalformedInput(String),

    /// A signature blob that is not exactly 65 bytes.
    #[error("invalid signature length {0}, cannot split")]
    InvalidSignatureLength(usize),

    #[error("invalid hex signature: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Whatever the signer reported, untouched.
    #[error(transparent)]
    Signing(#[from] alloy::signers::Error),

    #[error("message does not match schema: {0}")]
    SchemaMismatch(String),

    #[error(transparent)]
    Eip712(#[from] alloy::dyn_abi::Error),

    #[error("failed to derive signing identity: {0}")]
    Identity(#[from] LocalSignerError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
