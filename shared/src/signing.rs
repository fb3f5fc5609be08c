//! EIP-712 payload assembly for test fixtures.
//!
//! Two ways in: the token metadata bundle schema, compiled in with `sol!` and
//! available as a single bundle or as the `TokenMetadatas` batch wrapper, and
//! [`TypedDataRequest`] for any other schema declared at runtime (split
//! configs and the like). Hashing and signing are alloy's; this module only
//! shapes payloads and takes signatures apart.

use std::collections::BTreeMap;
use std::fmt;

use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, Signature, B256, U256},
    signers::Signer,
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::log_debug;

/// Raw `r || s || v` signature length.
pub const SIGNATURE_LENGTH: usize = 65;

const DOMAIN_TYPE: &str = "EIP712Domain";

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct TokenMetadata {
        uint256 tokenId;
        address payout;
        string metadataId;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct TokenMetadatas {
        TokenMetadata[] bundles;
    }
}

/// Domain separator inputs, static per deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl DomainConfig {
    pub fn to_eip712_domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(self.version.clone().into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.version,
            "chainId": self.chain_id,
            "verifyingContract": self.verifying_contract,
        })
    }
}

impl fmt::Display for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ name: {}, version: {}, chainId: {}, verifyingContract: {} }}",
            self.name, self.version, self.chain_id, self.verifying_contract
        )
    }
}

/// A payload for the bundle schema, either one bundle or the batch wrapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundlePayload {
    Single(TokenMetadata),
    Batch(TokenMetadatas),
}

impl BundlePayload {
    pub fn single(bundle: TokenMetadata) -> Self {
        Self::Single(bundle)
    }

    pub fn batch(bundles: Vec<TokenMetadata>) -> Self {
        Self::Batch(TokenMetadatas { bundles })
    }

    pub fn primary_type(&self) -> &'static str {
        match self {
            Self::Single(_) => TokenMetadata::NAME,
            Self::Batch(_) => TokenMetadatas::NAME,
        }
    }

    /// The typed-data hash a signer signs for this payload under `domain`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        match self {
            Self::Single(bundle) => bundle.eip712_signing_hash(domain),
            Self::Batch(batch) => batch.eip712_signing_hash(domain),
        }
    }
}

/// -------------------------------------------
/// Requests a typed-data signature over a bundle payload. Signer errors are
/// returned as they come.
/// -------------------------------------------
pub async fn sign_bundle<S>(
    signer: &S,
    domain: &Eip712Domain,
    payload: &BundlePayload,
) -> Result<Signature>
where
    S: Signer + Send + Sync,
{
    log_debug!("Signing {} payload", payload.primary_type());
    let signature = match payload {
        BundlePayload::Single(bundle) => signer.sign_typed_data(bundle, domain).await?,
        BundlePayload::Batch(batch) => signer.sign_typed_data(batch, domain).await?,
    };
    Ok(signature)
}

/// Token id layout used by the fixtures: the artist address in the top 20
/// bytes, a big-endian index in the low 12.
pub fn token_id(artist: Address, index: u64) -> U256 {
    let mut word = [0u8; 32];
    word[..20].copy_from_slice(artist.as_slice());
    word[24..].copy_from_slice(&index.to_be_bytes());
    U256::from_be_bytes(word)
}

/// `n` left-padded to a 20-byte address.
pub fn payout_address(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}

/// One field of a runtime-declared struct type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Struct name to field declarations.
pub type SchemaSet = BTreeMap<String, Vec<FieldDecl>>;

/// Everything a "sign typed data" call takes, for a schema declared at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataRequest {
    pub domain: DomainConfig,
    pub types: SchemaSet,
    pub primary_type: String,
    pub message: Value,
}

impl TypedDataRequest {
    /// Checks the declarations are closed over their field types and that the
    /// message carries exactly the fields of the primary type, recursively.
    pub fn validate(&self) -> Result<()> {
        // The domain type always comes from `domain`, with all four fields.
        if self.types.contains_key(DOMAIN_TYPE) {
            return Err(Error::SchemaMismatch(format!(
                "{} is derived from the domain and cannot be declared",
                DOMAIN_TYPE
            )));
        }
        for (name, fields) in &self.types {
            for field in fields {
                let base = base_type(&field.ty);
                if !self.types.contains_key(base) && !is_primitive(base) {
                    return Err(Error::SchemaMismatch(format!(
                        "{}.{} has undeclared type '{}'",
                        name, field.name, field.ty
                    )));
                }
            }
        }
        validate_struct(&self.types, &self.primary_type, &self.message, &self.primary_type)
    }

    pub fn to_typed_data(&self) -> Result<TypedData> {
        self.validate()?;

        let mut types = serde_json::Map::new();
        types.insert(
            DOMAIN_TYPE.to_string(),
            json!([
                { "name": "name", "type": "string" },
                { "name": "version", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" },
            ]),
        );
        for (name, fields) in &self.types {
            types.insert(name.clone(), serde_json::to_value(fields)?);
        }

        let typed_data = json!({
            "types": types,
            "primaryType": self.primary_type,
            "domain": self.domain.to_json(),
            "message": self.message,
        });
        Ok(serde_json::from_value(typed_data)?)
    }

    pub fn signing_hash(&self) -> Result<B256> {
        Ok(self.to_typed_data()?.eip712_signing_hash()?)
    }

    pub async fn sign<S>(&self, signer: &S) -> Result<Signature>
    where
        S: Signer + Send + Sync,
    {
        let typed_data = self.to_typed_data()?;
        log_debug!("Signing {} payload", self.primary_type);
        Ok(signer.sign_dynamic_typed_data(&typed_data).await?)
    }
}

fn validate_struct(types: &SchemaSet, type_name: &str, value: &Value, path: &str) -> Result<()> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Error::SchemaMismatch(format!("type '{}' is not declared", type_name)))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::SchemaMismatch(format!("{} must be an object", path)))?;

    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        let field_value = object
            .get(&field.name)
            .ok_or_else(|| Error::SchemaMismatch(format!("missing field {}", field_path)))?;
        validate_field(types, &field.ty, field_value, &field_path)?;
    }

    if let Some(extra) = object
        .keys()
        .find(|key| !fields.iter().any(|field| &field.name == *key))
    {
        return Err(Error::SchemaMismatch(format!(
            "unexpected field {}.{}",
            path, extra
        )));
    }
    Ok(())
}

fn validate_field(types: &SchemaSet, ty: &str, value: &Value, path: &str) -> Result<()> {
    if let Some(element) = array_element_type(ty) {
        let items = value
            .as_array()
            .ok_or_else(|| Error::SchemaMismatch(format!("{} must be an array", path)))?;
        for (i, item) in items.iter().enumerate() {
            validate_field(types, element, item, &format!("{}[{}]", path, i))?;
        }
        return Ok(());
    }
    if types.contains_key(ty) {
        return validate_struct(types, ty, value, path);
    }
    // Primitive values are coerced (and rejected) by the encoder.
    Ok(())
}

fn array_element_type(ty: &str) -> Option<&str> {
    if ty.ends_with(']') {
        ty.rfind('[').map(|open| &ty[..open])
    } else {
        None
    }
}

fn base_type(ty: &str) -> &str {
    ty.find('[').map_or(ty, |open| &ty[..open])
}

fn is_primitive(ty: &str) -> bool {
    fn sized(rest: &str) -> bool {
        rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit())
    }
    match ty {
        "address" | "bool" | "string" | "bytes" => true,
        _ => ty
            .strip_prefix("uint")
            .or_else(|| ty.strip_prefix("int"))
            .map(sized)
            .or_else(|| {
                ty.strip_prefix("bytes")
                    .map(|rest| !rest.is_empty() && sized(rest))
            })
            .unwrap_or(false),
    }
}

/// The three standard components of a 65-byte signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitSignature {
    /// Byte 64 exactly as the signer returned it.
    pub recovery_id: u8,
    pub r: B256,
    pub s: B256,
}

impl SplitSignature {
    fn from_bytes(raw: &[u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            recovery_id: raw[64],
            r: B256::from_slice(&raw[..32]),
            s: B256::from_slice(&raw[32..64]),
        }
    }
}

impl fmt::Display for SplitSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.recovery_id, self.r, self.s)
    }
}

/// -------------------------------------------
/// Splits a 65-byte signature into (v, r, s). Compact 64-byte signatures are
/// not accepted.
/// -------------------------------------------
pub fn split(raw: &[u8]) -> Result<SplitSignature> {
    let raw: &[u8; SIGNATURE_LENGTH] = raw
        .try_into()
        .map_err(|_| Error::InvalidSignatureLength(raw.len()))?;
    Ok(SplitSignature::from_bytes(raw))
}

/// Same as [`split`], for the hex string a signer hands back.
pub fn split_hex(signature: &str) -> Result<SplitSignature> {
    let trimmed = signature.trim();
    let raw = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))?;
    split(&raw)
}

pub fn split_signature(signature: &Signature) -> SplitSignature {
    SplitSignature::from_bytes(&signature.as_bytes())
}
