//! Fixture files read by `typed-signer`.
//!
//! A bundle fixture lists the domains to sign under and the bundles to sign:
//!
//! ```json
//! {
//!   "domains": [{ "name": "SonaDirectMint", "version": "1", "chainId": 31337,
//!                 "verifyingContract": "0x34A1D3fff3958843C43aD80F30b94c510645C316" }],
//!   "mode": "batch",
//!   "bundles": [
//!     { "tokenId": { "artist": "0x5D2d2Ea1B0C7e2f086cC731A496A38Be1F19FD3f", "index": 68 },
//!       "payout": "0x0000000000000000000000000000000000000019",
//!       "metadataId": "Hello World!" }
//!   ]
//! }
//! ```
//!
//! Any other schema goes through a [`TypedDataRequest`] file instead.

use std::path::Path;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::read_json;
use crate::signing::{token_id, BundlePayload, DomainConfig, TokenMetadata, TypedDataRequest};

/// Which payload shapes to produce from the fixture bundles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningMode {
    /// One `TokenMetadata` payload per bundle.
    Single,
    /// One `TokenMetadatas` payload wrapping every bundle.
    #[default]
    Batch,
    Both,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenIdSpec {
    Composite { artist: Address, index: u64 },
    Raw(U256),
}

impl TokenIdSpec {
    pub fn resolve(&self) -> U256 {
        match self {
            Self::Composite { artist, index } => token_id(*artist, *index),
            Self::Raw(id) => *id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSpec {
    pub token_id: TokenIdSpec,
    pub payout: Address,
    pub metadata_id: String,
}

impl From<&BundleSpec> for TokenMetadata {
    fn from(spec: &BundleSpec) -> Self {
        TokenMetadata {
            tokenId: spec.token_id.resolve(),
            payout: spec.payout,
            metadataId: spec.metadata_id.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleFixture {
    pub domains: Vec<DomainConfig>,
    #[serde(default)]
    pub mode: SigningMode,
    pub bundles: Vec<BundleSpec>,
}

impl BundleFixture {
    /// Payloads in signing order: singles first, then the batch.
    pub fn payloads(&self) -> Vec<BundlePayload> {
        let bundles: Vec<TokenMetadata> = self.bundles.iter().map(TokenMetadata::from).collect();
        let mut payloads = Vec::new();
        if matches!(self.mode, SigningMode::Single | SigningMode::Both) {
            payloads.extend(bundles.iter().cloned().map(BundlePayload::single));
        }
        if matches!(self.mode, SigningMode::Batch | SigningMode::Both) {
            payloads.push(BundlePayload::batch(bundles));
        }
        payloads
    }
}

pub fn load_bundle_fixture(path: &Path) -> Result<BundleFixture> {
    read_json(path)
}

pub fn load_typed_data_request(path: &Path) -> Result<TypedDataRequest> {
    read_json(path)
}
