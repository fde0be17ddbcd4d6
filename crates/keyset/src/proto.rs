//! # Key Container Messages
//!
//! Protobuf messages for the keyset container and the composite
//! elliptic-curve key it carries. The message and enum shapes mirror the
//! wire format of the composite-key ecosystem so that keysets produced
//! elsewhere decode here unchanged.

/// A keyset: an ordered collection of keys with exactly one of them marked
/// as primary.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Keyset {
    /// Identifies the primary key of the set.
    #[prost(uint32, tag = "1")]
    pub primary_key_id: u32,

    /// The keys of the set.
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<KeysetKey>,
}

/// A single key of a keyset, together with its status and output prefix.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeysetKey {
    /// The key material and its type.
    #[prost(message, optional, tag = "1")]
    pub key_data: Option<KeyData>,

    /// Whether the key is enabled for use.
    #[prost(enumeration = "KeyStatusType", tag = "2")]
    pub status: i32,

    /// Identifier of the key within the set.
    #[prost(uint32, tag = "3")]
    pub key_id: u32,

    /// How ciphertexts produced with this key are prefixed.
    #[prost(enumeration = "OutputPrefixType", tag = "4")]
    pub output_prefix_type: i32,
}

/// Key material: a serialized key message plus the URL identifying its type.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyData {
    /// Type URL of the serialized key message in `value`.
    #[prost(string, tag = "1")]
    pub type_url: String,

    /// The serialized key message.
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,

    /// Classification of the key material.
    #[prost(enumeration = "KeyMaterialType", tag = "3")]
    pub key_material_type: i32,
}

/// A template describing how to generate a key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyTemplate {
    /// Type URL of the key the template generates.
    #[prost(string, tag = "1")]
    pub type_url: String,

    /// Serialized key format message.
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,

    /// Output prefix of keys generated from the template.
    #[prost(enumeration = "OutputPrefixType", tag = "3")]
    pub output_prefix_type: i32,
}

/// Key format for AES-GCM keys.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AesGcmKeyFormat {
    /// Key size in bytes.
    #[prost(uint32, tag = "2")]
    pub key_size: u32,
}

/// Key-wrap parameters of a composite key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EcdhKwParams {
    /// The elliptic curve of the key-agreement key.
    #[prost(enumeration = "EllipticCurveType", tag = "1")]
    pub curve_type: i32,

    /// The kind of key-agreement key.
    #[prost(enumeration = "KeyType", tag = "2")]
    pub key_type: i32,
}

/// Content-encryption parameters of a composite key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EcdhAeadEncParams {
    /// Template of the AEAD primitive wrapping the content.
    #[prost(message, optional, tag = "1")]
    pub aead_enc: Option<KeyTemplate>,
}

/// Parameters of a composite key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EcdhAeadParams {
    /// Key-wrap parameters.
    #[prost(message, optional, tag = "1")]
    pub kw_params: Option<EcdhKwParams>,

    /// Content-encryption parameters.
    #[prost(message, optional, tag = "2")]
    pub enc_params: Option<EcdhAeadEncParams>,

    /// Encoding of the EC point.
    #[prost(enumeration = "EcPointFormat", tag = "3")]
    pub ec_point_format: i32,
}

/// The public half of a composite key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EcdhAeadPublicKey {
    /// Key message version.
    #[prost(uint32, tag = "1")]
    pub version: u32,

    /// Composite key parameters.
    #[prost(message, optional, tag = "2")]
    pub params: Option<EcdhAeadParams>,

    /// Key identifier.
    #[prost(string, tag = "3")]
    pub kid: String,

    /// X coordinate of the EC point.
    #[prost(bytes = "vec", tag = "4")]
    pub x: Vec<u8>,

    /// Y coordinate of the EC point.
    #[prost(bytes = "vec", tag = "5")]
    pub y: Vec<u8>,
}

/// The private half of a composite key, embedding its public half.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EcdhAeadPrivateKey {
    /// Key message version.
    #[prost(uint32, tag = "1")]
    pub version: u32,

    /// The embedded public half.
    #[prost(message, optional, tag = "2")]
    pub public_key: Option<EcdhAeadPublicKey>,

    /// The private scalar.
    #[prost(bytes = "vec", tag = "3")]
    pub key_value: Vec<u8>,
}

/// Status of a keyset key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KeyStatusType {
    /// Unknown status.
    UnknownStatus = 0,
    /// The key may be used.
    Enabled = 1,
    /// The key is retained but must not be used.
    Disabled = 2,
    /// The key material has been destroyed.
    Destroyed = 3,
}

/// Prefix prepended to ciphertexts produced with a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OutputPrefixType {
    /// Unknown prefix.
    UnknownPrefix = 0,
    /// 5-byte versioned prefix.
    Tink = 1,
    /// Legacy 5-byte prefix.
    Legacy = 2,
    /// No prefix; raw key bytes.
    Raw = 3,
    /// Crunchy-compatible prefix.
    Crunchy = 4,
}

/// Classification of key material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KeyMaterialType {
    /// Unknown material.
    UnknownKeymaterial = 0,
    /// Symmetric key material.
    Symmetric = 1,
    /// Asymmetric private key material.
    AsymmetricPrivate = 2,
    /// Asymmetric public key material.
    AsymmetricPublic = 3,
    /// Key material held remotely.
    Remote = 4,
}

/// Supported elliptic curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EllipticCurveType {
    /// Unknown curve.
    UnknownCurve = 0,
    /// NIST P-256.
    NistP256 = 2,
    /// NIST P-384.
    NistP384 = 3,
    /// NIST P-521.
    NistP521 = 4,
    /// Curve25519.
    Curve25519 = 5,
}

/// Encoding of an EC point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EcPointFormat {
    /// Unknown format.
    UnknownFormat = 0,
    /// Uncompressed point encoding.
    Uncompressed = 1,
    /// Compressed point encoding.
    Compressed = 2,
    /// Crunchy-compatible uncompressed encoding.
    DoNotUseCrunchyUncompressed = 3,
}

/// Kind of key-agreement key carried by a composite key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KeyType {
    /// Unknown key type.
    UnknownKeyType = 0,
    /// Elliptic-curve key.
    Ec = 1,
    /// Octet key pair.
    Okp = 2,
}

impl EllipticCurveType {
    /// The symbolic name of the curve, as rendered into exported key
    /// records.
    #[must_use]
    pub const fn as_str_name(&self) -> &'static str {
        match self {
            Self::UnknownCurve => "UNKNOWN_CURVE",
            Self::NistP256 => "NIST_P256",
            Self::NistP384 => "NIST_P384",
            Self::NistP521 => "NIST_P521",
            Self::Curve25519 => "CURVE25519",
        }
    }
}

impl KeyType {
    /// The symbolic name of the key type.
    #[must_use]
    pub const fn as_str_name(&self) -> &'static str {
        match self {
            Self::UnknownKeyType => "UNKNOWN_KEY_TYPE",
            Self::Ec => "EC",
            Self::Okp => "OKP",
        }
    }
}
