//! # Composite Keyset Export & Import
//!
//! A composite key carries an elliptic-curve public key inside a protobuf
//! envelope together with its key-wrap and AEAD parameters. This crate
//! bridges that wire format and a stable JSON [`PublicKey`] record:
//!
//! - [`PubKeyWriter`] emits the primary enabled key of a keyset as the JSON
//!   record, and [`extract_primary_public_key`] drives it from a
//!   [`KeysetHandle`], deriving the public half of private material first.
//! - [`public_key_to_keyset_handle`] rebuilds a keyset handle from the
//!   record, accepting the documented set of curve-name aliases.

pub mod error;
pub mod handle;
pub mod keyio;
pub mod proto;

pub use error::Error;
pub use handle::KeysetHandle;
pub use keyio::{
    extract_primary_public_key, public_key_to_keyset_handle, PubKeyWriter, PublicKey,
    ECDH_AES_PUBLIC_KEY_TYPE_URL,
};
