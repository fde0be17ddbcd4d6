//! # Keyset Handle
//!
//! A [`KeysetHandle`] wraps a cleartext [`Keyset`] and mediates access to
//! it: the public half of private material can be derived with
//! [`KeysetHandle::public`], and [`KeysetHandle::write_with_no_secrets`]
//! refuses to pass secret material to a writer.

use std::io;

use prost::Message as _;

use crate::error::Error;
use crate::keyio::{PubKeyWriter, ECDH_AES_PRIVATE_KEY_TYPE_URL, ECDH_AES_PUBLIC_KEY_TYPE_URL};
use crate::proto::{EcdhAeadPrivateKey, KeyData, KeyMaterialType, Keyset, KeysetKey};

/// A handle to a cleartext keyset.
#[derive(Clone, Debug)]
pub struct KeysetHandle {
    keyset: Keyset,
}

impl KeysetHandle {
    /// Wraps a cleartext keyset read from memory. The caller vouches for
    /// the provenance of the key material.
    #[must_use]
    pub fn from_keyset(keyset: Keyset) -> Self {
        Self { keyset }
    }

    /// The underlying keyset.
    #[must_use]
    pub fn keyset(&self) -> &Keyset {
        &self.keyset
    }

    /// Derives the keyset holding the public halves of this handle's
    /// private keys.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NonPrivateKey`] when a key of the set is not
    /// private material, and with a decoding error when the private key
    /// payload cannot be parsed.
    pub fn public(&self) -> Result<Self, Error> {
        let mut keys = Vec::with_capacity(self.keyset.key.len());

        for key in &self.keyset.key {
            let Some(key_data) = &key.key_data else {
                return Err(Error::Malformed("key entry without key data"));
            };
            if key_data.key_material_type() != KeyMaterialType::AsymmetricPrivate {
                return Err(Error::NonPrivateKey);
            }
            if key_data.type_url != ECDH_AES_PRIVATE_KEY_TYPE_URL {
                return Err(Error::UnexportableKeyType(key_data.type_url.clone()));
            }

            let private = EcdhAeadPrivateKey::decode(key_data.value.as_slice())?;
            let Some(public) = private.public_key else {
                return Err(Error::Malformed("private key without public half"));
            };

            keys.push(KeysetKey {
                key_data: Some(KeyData {
                    type_url: ECDH_AES_PUBLIC_KEY_TYPE_URL.to_string(),
                    value: public.encode_to_vec(),
                    key_material_type: KeyMaterialType::AsymmetricPublic as i32,
                }),
                status: key.status,
                key_id: key.key_id,
                output_prefix_type: key.output_prefix_type,
            });
        }

        Ok(Self::from_keyset(Keyset { primary_key_id: self.keyset.primary_key_id, key: keys }))
    }

    /// Writes the keyset through `writer`, refusing any keyset that still
    /// carries secret material.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::SecretMaterial`] when the keyset holds anything
    /// but public or remote key material, or when the writer fails.
    pub fn write_with_no_secrets<W: io::Write>(
        &self, writer: &mut PubKeyWriter<W>,
    ) -> Result<(), Error> {
        for key in &self.keyset.key {
            let Some(key_data) = &key.key_data else {
                return Err(Error::Malformed("key entry without key data"));
            };
            match key_data.key_material_type() {
                KeyMaterialType::AsymmetricPublic | KeyMaterialType::Remote => {}
                _ => return Err(Error::SecretMaterial),
            }
        }

        writer.write(&self.keyset)
    }
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;
    use crate::proto::{
        EcdhAeadParams, EcdhAeadPublicKey, EcdhKwParams, EllipticCurveType, KeyStatusType,
        KeyType, OutputPrefixType,
    };

    fn private_keyset() -> Keyset {
        let public = EcdhAeadPublicKey {
            version: 0,
            params: Some(EcdhAeadParams {
                kw_params: Some(EcdhKwParams {
                    curve_type: EllipticCurveType::NistP256 as i32,
                    key_type: KeyType::Ec as i32,
                }),
                enc_params: None,
                ec_point_format: 1,
            }),
            kid: "key-1".into(),
            x: vec![1u8; 32],
            y: vec![2u8; 32],
        };
        let private = EcdhAeadPrivateKey {
            version: 0,
            public_key: Some(public),
            key_value: vec![3u8; 32],
        };

        Keyset {
            primary_key_id: 7,
            key: vec![KeysetKey {
                key_data: Some(KeyData {
                    type_url: ECDH_AES_PRIVATE_KEY_TYPE_URL.into(),
                    value: private.encode_to_vec(),
                    key_material_type: KeyMaterialType::AsymmetricPrivate as i32,
                }),
                status: KeyStatusType::Enabled as i32,
                key_id: 7,
                output_prefix_type: OutputPrefixType::Raw as i32,
            }],
        }
    }

    #[test]
    fn public_half_derivation() {
        let handle = KeysetHandle::from_keyset(private_keyset());
        let public = handle.public().expect("should derive public keyset");

        let key = &public.keyset().key[0];
        let key_data = key.key_data.as_ref().expect("key data should be set");
        assert_eq!(key_data.type_url, ECDH_AES_PUBLIC_KEY_TYPE_URL);
        assert_eq!(key_data.key_material_type(), KeyMaterialType::AsymmetricPublic);
        assert_eq!(key.key_id, 7);
        assert_eq!(public.keyset().primary_key_id, 7);

        let decoded = EcdhAeadPublicKey::decode(key_data.value.as_slice())
            .expect("public key should decode");
        assert_eq!(decoded.kid, "key-1");
        assert_eq!(decoded.x, vec![1u8; 32]);
    }

    #[test]
    fn public_keyset_is_not_private() {
        let handle = KeysetHandle::from_keyset(private_keyset());
        let public = handle.public().expect("should derive public keyset");

        let err = public.public().expect_err("public material has no private half");
        assert!(matches!(err, Error::NonPrivateKey), "got: {err}");
    }

    #[test]
    fn writer_refuses_secret_material() {
        let handle = KeysetHandle::from_keyset(private_keyset());

        let mut buf = Vec::new();
        let mut writer = PubKeyWriter::new(&mut buf);
        let err = handle
            .write_with_no_secrets(&mut writer)
            .expect_err("private material must not be written");
        assert!(matches!(err, Error::SecretMaterial), "got: {err}");
        assert!(buf.is_empty());
    }
}
