//! # Verifiable Credentials
//!
//! An implementation of the W3C [Verifiable Credentials Data Model v1.1]
//! centred on credential ingestion: a credential arriving from the network or
//! storage as bare JSON, as an unsecured JWT, or as a signed JWS is decoded
//! into a canonical in-memory [`Credential`], validated against a
//! configurable schema policy, and re-serialized without loss: unknown
//! members of the source document survive the round trip verbatim.
//!
//! Decoding is driven by [`Credential::decode`] and configured through
//! [`CredentialOptions`]; schema resolution is handled by
//! [`CredentialSchemaLoader`] over an injectable [`SchemaCache`].
//!
//! [Verifiable Credentials Data Model v1.1]: https://www.w3.org/TR/vc-data-model

pub mod core;
pub mod error;
pub mod jose;
pub mod model;
pub mod proof;
pub mod schema;

pub use error::Error;
pub use jose::jwk::PublicKeyJwk;
pub use jose::jws::PublicKeyFetcher;
pub use model::vc::{
    create_custom_credential, subject_id, Credential, CredentialOptions,
    CustomCredentialProducer, Issuer, TypedId, Validation, BASE_CONTEXT, VC_TYPE, VP_TYPE,
};
pub use model::vp::Presentation;
pub use proof::{JwtCredClaims, Proof};
pub use schema::{
    CredentialSchemaLoader, CredentialSchemaLoaderBuilder, ExpirableSchemaCache, SchemaCache,
};
