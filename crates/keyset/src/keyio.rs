//! # Composite Public Key Export & Import
//!
//! [`PubKeyWriter`] writes the primary public key of a keyset as a JSON
//! [`PublicKey`] record, and [`public_key_to_keyset_handle`] rebuilds a
//! keyset handle from such a record. Only composite elliptic-curve public
//! keys are exportable; other key types must go through their own export
//! paths.

use std::io;

use prost::Message as _;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::handle::KeysetHandle;
use crate::proto::{
    AesGcmKeyFormat, EcPointFormat, EcdhAeadEncParams, EcdhAeadParams, EcdhAeadPublicKey,
    EcdhKwParams, EllipticCurveType, KeyData, KeyMaterialType, KeyStatusType, KeyTemplate,
    KeyType, Keyset, KeysetKey, OutputPrefixType,
};

/// Type URL of an exportable composite elliptic-curve public key.
pub const ECDH_AES_PUBLIC_KEY_TYPE_URL: &str =
    "type.hyperledger.org/hyperledger.aries.crypto.tink.EcdhAesAeadPublicKey";

/// Type URL of the private half of a composite elliptic-curve key.
pub(crate) const ECDH_AES_PRIVATE_KEY_TYPE_URL: &str =
    "type.hyperledger.org/hyperledger.aries.crypto.tink.EcdhAesAeadPrivateKey";

const AES_GCM_KEY_TYPE_URL: &str = "type.googleapis.com/google.crypto.tink.AesGcmKey";
const AES256_GCM_KEY_SIZE: u32 = 32;

/// The JSON record of a composite elliptic-curve public key. Coordinate
/// bytes are base64 encoded; the curve carries its canonical symbolic name
/// (`NIST_P256`, `NIST_P384`, `NIST_P521`).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublicKey {
    /// Key identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kid: String,

    /// Key type, e.g. "`EC`".
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,

    /// Canonical curve name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub curve: String,

    /// X coordinate of the EC point.
    #[serde(with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub x: Vec<u8>,

    /// Y coordinate of the EC point.
    #[serde(with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<u8>,
}

mod base64_bytes {
    use base64ct::{Base64, Encoding};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(D::Error::custom)
    }
}

/// `PubKeyWriter` writes the primary public key of a keyset as a JSON
/// [`PublicKey`] record. The matched key must carry the composite
/// elliptic-curve public-key type URL.
pub struct PubKeyWriter<W: io::Write> {
    w: W,
}

impl<W: io::Write> PubKeyWriter<W> {
    /// Creates a writer emitting into `w`.
    pub fn new(w: W) -> Self {
        Self { w }
    }

    /// Writes the key whose id equals the keyset's primary key id and whose
    /// status is enabled.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::KeyNotWritten`] when no such key exists, with
    /// [`Error::UnexportableKeyType`] for a non-composite type URL, and
    /// with decoding errors for a malformed key payload.
    pub fn write(&mut self, keyset: &Keyset) -> Result<(), Error> {
        for key in &keyset.key {
            if key.key_id == keyset.primary_key_id && key.status() == KeyStatusType::Enabled {
                let Some(key_data) = &key.key_data else {
                    return Err(Error::Malformed("key entry without key data"));
                };

                let pub_key = proto_to_composite_key(key_data)?;
                let record = serde_json::to_vec(&pub_key)?;
                self.w.write_all(&record)?;

                return Ok(());
            }
        }

        Err(Error::KeyNotWritten)
    }
}

// Re-emits the composite key carried in `key_data` as a public key record.
fn proto_to_composite_key(key_data: &KeyData) -> Result<PublicKey, Error> {
    if key_data.type_url != ECDH_AES_PUBLIC_KEY_TYPE_URL {
        return Err(Error::UnexportableKeyType(key_data.type_url.clone()));
    }

    let proto = EcdhAeadPublicKey::decode(key_data.value.as_slice())?;
    let Some(kw_params) = proto.params.as_ref().and_then(|p| p.kw_params.as_ref()) else {
        return Err(Error::Malformed("composite key without key-wrap params"));
    };

    if kw_params.key_type() != KeyType::Ec {
        return Err(Error::UndefinedKeyType(kw_params.key_type().as_str_name().into()));
    }

    let curve = kw_params.curve_type().as_str_name();
    curve_proto(curve).map_err(|_| Error::UndefinedCurve(curve.into()))?;

    Ok(PublicKey {
        kid: proto.kid.clone(),
        type_: kw_params.key_type().as_str_name().into(),
        curve: curve.into(),
        x: proto.x,
        y: proto.y,
    })
}

/// Extracts the primary public key of `handle` as a [`PublicKey`] record.
///
/// The public half of the handle is derived first; a handle already holding
/// only public material is used as-is.
///
/// # Errors
///
/// Fails when the public half cannot be derived, the primary key is not an
/// exportable composite key, or the emitted record cannot be parsed.
pub fn extract_primary_public_key(handle: &KeysetHandle) -> Result<PublicKey, Error> {
    let key_bytes = write_pub_key_from_handle(handle)?;

    Ok(serde_json::from_slice(&key_bytes)?)
}

fn write_pub_key_from_handle(handle: &KeysetHandle) -> Result<Vec<u8>, Error> {
    let public = match handle.public() {
        Ok(public) => public,
        // the handle already holds only public material
        Err(Error::NonPrivateKey) => handle.clone(),
        Err(e) => return Err(e),
    };

    let mut buf = Vec::new();
    let mut writer = PubKeyWriter::new(&mut buf);
    public.write_with_no_secrets(&mut writer)?;

    Ok(buf)
}

/// Converts a [`PublicKey`] record into a keyset handle holding a single
/// enabled composite public key with id 1, marked primary, with the raw
/// output prefix.
///
/// The resulting handle identifies a key-agreement peer key; it cannot be
/// used for direct primitive execution as the content-encryption key is
/// unset.
///
/// # Errors
///
/// Fails with [`Error::UnsupportedCurve`] when the record's curve is not in
/// the supported alias set.
pub fn public_key_to_keyset_handle(pub_key: &PublicKey) -> Result<KeysetHandle, Error> {
    let curve = curve_proto(&pub_key.curve)?;

    let proto_key = EcdhAeadPublicKey {
        version: 0,
        params: Some(EcdhAeadParams {
            kw_params: Some(EcdhKwParams {
                curve_type: curve as i32,
                key_type: KeyType::Ec as i32,
            }),
            enc_params: Some(EcdhAeadEncParams { aead_enc: Some(aes256_gcm_key_template()) }),
            ec_point_format: EcPointFormat::Uncompressed as i32,
        }),
        kid: pub_key.kid.clone(),
        x: pub_key.x.clone(),
        y: pub_key.y.clone(),
    };

    Ok(KeysetHandle::from_keyset(new_keyset(
        ECDH_AES_PUBLIC_KEY_TYPE_URL,
        proto_key.encode_to_vec(),
        KeyMaterialType::AsymmetricPublic,
    )))
}

/// Maps a curve name, through the accepted alias set, onto its canonical
/// symbolic name.
///
/// # Errors
///
/// Fails with [`Error::UnsupportedCurve`] for names outside the alias set.
pub fn canonical_curve(curve: &str) -> Result<&'static str, Error> {
    Ok(curve_proto(curve)?.as_str_name())
}

fn curve_proto(curve: &str) -> Result<EllipticCurveType, Error> {
    match curve {
        "secp256r1" | "NIST_P256" | "P-256" | "EllipticCurveType_NIST_P256" => {
            Ok(EllipticCurveType::NistP256)
        }
        "secp384r1" | "NIST_P384" | "P-384" | "EllipticCurveType_NIST_P384" => {
            Ok(EllipticCurveType::NistP384)
        }
        "secp521r1" | "NIST_P521" | "P-521" | "EllipticCurveType_NIST_P521" => {
            Ok(EllipticCurveType::NistP521)
        }
        _ => Err(Error::UnsupportedCurve(curve.to_string())),
    }
}

fn aes256_gcm_key_template() -> KeyTemplate {
    KeyTemplate {
        type_url: AES_GCM_KEY_TYPE_URL.to_string(),
        value: AesGcmKeyFormat { key_size: AES256_GCM_KEY_SIZE }.encode_to_vec(),
        output_prefix_type: OutputPrefixType::Tink as i32,
    }
}

fn new_keyset(type_url: &str, marshaled_key: Vec<u8>, material: KeyMaterialType) -> Keyset {
    Keyset {
        primary_key_id: 1,
        key: vec![KeysetKey {
            key_data: Some(KeyData {
                type_url: type_url.to_string(),
                value: marshaled_key,
                key_material_type: material as i32,
            }),
            status: KeyStatusType::Enabled as i32,
            // the key is built from raw key bytes, so the raw prefix applies
            key_id: 1,
            output_prefix_type: OutputPrefixType::Raw as i32,
        }],
    }
}

#[cfg(test)]
mod tests {
    use prost::Message as _;
    use serde_json::json;

    use super::*;

    fn sample_key() -> PublicKey {
        PublicKey {
            kid: "key-1".into(),
            type_: "EC".into(),
            curve: "NIST_P256".into(),
            x: vec![1u8; 32],
            y: vec![2u8; 32],
        }
    }

    #[test]
    fn record_round_trip() {
        let pub_key = sample_key();

        let handle = public_key_to_keyset_handle(&pub_key).expect("should build handle");
        let keyset = handle.keyset();
        assert_eq!(keyset.primary_key_id, 1);
        assert_eq!(keyset.key.len(), 1);

        let key = &keyset.key[0];
        assert_eq!(key.key_id, 1);
        assert_eq!(key.status(), KeyStatusType::Enabled);
        assert_eq!(key.output_prefix_type(), OutputPrefixType::Raw);

        let key_data = key.key_data.as_ref().expect("key data should be set");
        assert_eq!(key_data.type_url, ECDH_AES_PUBLIC_KEY_TYPE_URL);
        assert_eq!(key_data.key_material_type(), KeyMaterialType::AsymmetricPublic);

        let exported = extract_primary_public_key(&handle).expect("should export");
        assert_eq!(exported, pub_key);
    }

    #[test]
    fn embedded_proto_carries_aead_template() {
        let handle = public_key_to_keyset_handle(&sample_key()).expect("should build handle");
        let key_data = handle.keyset().key[0].key_data.as_ref().expect("key data");

        let proto = EcdhAeadPublicKey::decode(key_data.value.as_slice()).expect("should decode");
        assert_eq!(proto.version, 0);

        let params = proto.params.expect("params should be set");
        assert_eq!(params.ec_point_format(), EcPointFormat::Uncompressed);
        assert_eq!(params.kw_params.expect("kw params").key_type(), KeyType::Ec);

        let template =
            params.enc_params.expect("enc params").aead_enc.expect("template should be set");
        assert_eq!(template.type_url, AES_GCM_KEY_TYPE_URL);
        let format = AesGcmKeyFormat::decode(template.value.as_slice()).expect("should decode");
        assert_eq!(format.key_size, AES256_GCM_KEY_SIZE);
    }

    #[test]
    fn curve_aliases() {
        for alias in ["secp256r1", "NIST_P256", "P-256", "EllipticCurveType_NIST_P256"] {
            assert_eq!(canonical_curve(alias).expect("alias should map"), "NIST_P256");
        }
        assert_eq!(canonical_curve("P-384").expect("alias should map"), "NIST_P384");
        assert_eq!(canonical_curve("secp521r1").expect("alias should map"), "NIST_P521");

        let err = canonical_curve("curve25519").expect_err("unknown curve should fail");
        assert!(matches!(err, Error::UnsupportedCurve(_)), "got: {err}");

        let mut unsupported = sample_key();
        unsupported.curve = "brainpoolP256r1".into();
        let err =
            public_key_to_keyset_handle(&unsupported).expect_err("unknown curve should fail");
        assert!(matches!(err, Error::UnsupportedCurve(_)), "got: {err}");
    }

    #[test]
    fn record_json_shape() {
        let record = serde_json::to_value(sample_key()).expect("should serialize");
        assert_eq!(record["kid"], json!("key-1"));
        assert_eq!(record["type"], json!("EC"));
        assert_eq!(record["curve"], json!("NIST_P256"));
        assert!(record["x"].is_string(), "coordinates should serialize as base64 strings");

        let parsed: PublicKey =
            serde_json::from_value(record).expect("record should deserialize");
        assert_eq!(parsed, sample_key());
    }

    #[test]
    fn writer_requires_enabled_primary_key() {
        let handle = public_key_to_keyset_handle(&sample_key()).expect("should build handle");

        let mut keyset = handle.keyset().clone();
        keyset.key[0].status = KeyStatusType::Disabled as i32;
        let mut writer = PubKeyWriter::new(Vec::new());
        let err = writer.write(&keyset).expect_err("disabled key should not be written");
        assert!(matches!(err, Error::KeyNotWritten), "got: {err}");

        let mut keyset = handle.keyset().clone();
        keyset.primary_key_id = 99;
        let mut writer = PubKeyWriter::new(Vec::new());
        let err = writer.write(&keyset).expect_err("missing primary key should not be written");
        assert!(matches!(err, Error::KeyNotWritten), "got: {err}");
    }

    #[test]
    fn writer_rejects_foreign_type_url() {
        let handle = public_key_to_keyset_handle(&sample_key()).expect("should build handle");

        let mut keyset = handle.keyset().clone();
        if let Some(key_data) = keyset.key[0].key_data.as_mut() {
            key_data.type_url = "type.googleapis.com/google.crypto.tink.Ed25519PublicKey".into();
        }

        let mut writer = PubKeyWriter::new(Vec::new());
        let err = writer.write(&keyset).expect_err("foreign type URL should fail");
        assert!(matches!(err, Error::UnexportableKeyType(_)), "got: {err}");
    }

    #[test]
    fn writer_rejects_non_ec_composite_keys() {
        let make_keyset = |curve_type: i32, key_type: i32| {
            let proto_key = EcdhAeadPublicKey {
                version: 0,
                params: Some(EcdhAeadParams {
                    kw_params: Some(EcdhKwParams { curve_type, key_type }),
                    enc_params: None,
                    ec_point_format: EcPointFormat::Uncompressed as i32,
                }),
                kid: "key-1".into(),
                x: vec![1u8; 32],
                y: vec![2u8; 32],
            };
            new_keyset(
                ECDH_AES_PUBLIC_KEY_TYPE_URL,
                proto_key.encode_to_vec(),
                KeyMaterialType::AsymmetricPublic,
            )
        };

        let okp = make_keyset(EllipticCurveType::NistP256 as i32, KeyType::Okp as i32);
        let mut writer = PubKeyWriter::new(Vec::new());
        let err = writer.write(&okp).expect_err("OKP key-wrap type should fail");
        assert!(matches!(err, Error::UndefinedKeyType(_)), "got: {err}");

        let curve25519 = make_keyset(EllipticCurveType::Curve25519 as i32, KeyType::Ec as i32);
        let mut writer = PubKeyWriter::new(Vec::new());
        let err = writer.write(&curve25519).expect_err("non-NIST curve should fail");
        assert!(matches!(err, Error::UndefinedCurve(_)), "got: {err}");
    }

    #[test]
    fn export_from_private_material() {
        use crate::proto::EcdhAeadPrivateKey;

        let public = EcdhAeadPublicKey {
            version: 0,
            params: Some(EcdhAeadParams {
                kw_params: Some(EcdhKwParams {
                    curve_type: EllipticCurveType::NistP384 as i32,
                    key_type: KeyType::Ec as i32,
                }),
                enc_params: None,
                ec_point_format: EcPointFormat::Uncompressed as i32,
            }),
            kid: "key-9".into(),
            x: vec![9u8; 48],
            y: vec![8u8; 48],
        };
        let private = EcdhAeadPrivateKey {
            version: 0,
            public_key: Some(public),
            key_value: vec![7u8; 48],
        };

        let keyset = Keyset {
            primary_key_id: 3,
            key: vec![KeysetKey {
                key_data: Some(KeyData {
                    type_url: ECDH_AES_PRIVATE_KEY_TYPE_URL.into(),
                    value: private.encode_to_vec(),
                    key_material_type: KeyMaterialType::AsymmetricPrivate as i32,
                }),
                status: KeyStatusType::Enabled as i32,
                key_id: 3,
                output_prefix_type: OutputPrefixType::Raw as i32,
            }],
        };

        let exported = extract_primary_public_key(&KeysetHandle::from_keyset(keyset))
            .expect("should derive and export");
        assert_eq!(exported.kid, "key-9");
        assert_eq!(exported.curve, "NIST_P384");
        assert_eq!(exported.type_, "EC");
        assert_eq!(exported.x, vec![9u8; 48]);
    }
}
