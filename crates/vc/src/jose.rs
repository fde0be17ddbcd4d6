//! # JSON Object Signing and Encryption
//!
//! The JOSE building blocks needed to carry a credential inside a JWT: a
//! simplified JWK model and compact JWS decoding with signature
//! verification.

pub mod jwk;
pub mod jws;
