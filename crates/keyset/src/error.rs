//! Errors raised while exporting or importing composite keys.

use thiserror::Error;

/// Errors returned by keyset export and import.
#[derive(Error, Debug)]
pub enum Error {
    /// The keyset holds no enabled key matching its primary key id.
    #[error("key not written")]
    KeyNotWritten,

    /// The key's type URL is not the composite public-key URL.
    #[error("can't export key with keyURL:{0}")]
    UnexportableKeyType(String),

    /// The composite key's key-wrap parameters carry an unsupported key
    /// type.
    #[error("undefined key type: '{0}'")]
    UndefinedKeyType(String),

    /// The curve name is outside the supported alias set.
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    /// The composite key's curve is outside the exportable set.
    #[error("undefined curve: {0}")]
    UndefinedCurve(String),

    /// The keyset holds a key that is not private material, so no public
    /// half can be derived from it.
    #[error("keyset contains a non-private key")]
    NonPrivateKey,

    /// Secret key material must not pass through the public-key writer.
    #[error("exporting secret key material is not supported")]
    SecretMaterial,

    /// A key entry is structurally incomplete.
    #[error("malformed key entry: {0}")]
    Malformed(&'static str),

    /// The embedded protobuf could not be decoded.
    #[error("decode composite key proto: {0}")]
    Proto(#[from] prost::DecodeError),

    /// The public key record could not be encoded or decoded.
    #[error("public key JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the record to the underlying writer failed.
    #[error("write public key: {0}")]
    Io(#[from] std::io::Error),
}
