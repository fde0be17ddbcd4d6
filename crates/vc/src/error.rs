//! # Credential Errors
//!
//! Every fallible stage of credential processing surfaces a typed error. The
//! decoding pipeline labels its errors with the stage that produced them, so
//! a failure reads as `decode new credential: …`, `validate new credential:
//! …` and so on.

use thiserror::Error;

/// Errors returned while decoding, validating, or serializing a Verifiable
/// Credential.
#[derive(Error, Debug)]
pub enum Error {
    /// The JWT/JWS envelope could not be decoded: malformed compact form, a
    /// missing public key fetcher, or a failed signature verification.
    #[error("decode new credential: {0}")]
    Envelope(String),

    /// The document is not structurally valid JSON.
    #[error("unmarshal new credential: {0}")]
    Json(String),

    /// The `credentialSchema` declarations could not be decoded.
    #[error("load schemas of new credential: {0}")]
    Schema(String),

    /// A declared custom schema could not be fetched (HTTP non-200 status or
    /// transport failure).
    #[error("validate new credential: load of custom credential schema from {url}: {reason}")]
    SchemaFetch {
        /// URL of the declared schema.
        url: String,
        /// Underlying HTTP or transport failure.
        reason: String,
    },

    /// The document failed JSON-Schema validation. The message aggregates
    /// every reported violation with its field path.
    #[error("validate new credential: {0}")]
    SchemaValidate(String),

    /// A polymorphic field decoder rejected its input (issuer, context,
    /// type, schema, or subject variant).
    #[error("build new credential: {0}")]
    Field(String),

    /// The decoded credential violated the active model validation mode.
    #[error("{0}")]
    ModelValidate(String),

    /// The subject id could not be resolved from the credential subject.
    #[error("{0}")]
    Subject(String),

    /// The credential could not be serialized back to JSON.
    #[error("JSON marshalling of verifiable credential: {0}")]
    Marshal(String),

    /// A custom credential producer accepted the credential but failed to
    /// build its extended model.
    #[error("build extended verifiable credential: {0}")]
    Producer(String),
}
