// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::path::PathBuf;

// Shared project modules
use shared::{
    fixtures::{load_bundle_fixture, load_typed_data_request, BundleFixture},
    identity::{signer_from_mnemonic, DEV_MNEMONIC},
    log_debug, log_info,
    signing::{sign_bundle, split_signature, TypedDataRequest},
    utils::parse_cli_args_typed_signer,
};

use alloy::{
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};

use tracing_subscriber::EnvFilter;
use url::Url;

/// -------------------------------------------
/// Turns on request logging of an anvil node so the signing session shows up
/// in its output.
/// -------------------------------------------
async fn enable_node_logging(eth_rpc_url: &str) -> Result<(), anyhow::Error> {
    let rpc_url: Url = eth_rpc_url.parse().context("Invalid RPC URL")?;
    let provider = ProviderBuilder::new().on_http(rpc_url);

    let _: serde_json::Value = provider
        .raw_request("anvil_setLoggingEnabled".into(), (true,))
        .await
        .context("Failed to enable logging on the dev node")?;
    log_info!("Logging enabled on {}", eth_rpc_url);
    Ok(())
}

/// Hashes, and unless `hash_only`, signs every fixture payload under every
/// fixture domain, one request at a time.
async fn run_fixture(
    fixture: &BundleFixture,
    signer: &PrivateKeySigner,
    hash_only: bool,
) -> Result<(), anyhow::Error> {
    let payloads = fixture.payloads();
    log_debug!("{} payload(s) per domain", payloads.len());

    for domain_config in &fixture.domains {
        println!("\ndomain: {}", domain_config);
        let domain = domain_config.to_eip712_domain();

        for payload in &payloads {
            println!("{}: {:#?}", payload.primary_type(), payload);
            println!("message hash: {}", payload.signing_hash(&domain));

            if hash_only {
                continue;
            }
            let signature = sign_bundle(signer, &domain, payload)
                .await
                .with_context(|| format!("Failed to sign {} payload", payload.primary_type()))?;
            println!(
                "{} signature: {}",
                domain_config.name,
                split_signature(&signature)
            );
        }
    }
    Ok(())
}

async fn run_request(
    request: &TypedDataRequest,
    signer: &PrivateKeySigner,
    hash_only: bool,
) -> Result<(), anyhow::Error> {
    println!("\ndomain: {}", request.domain);
    println!("types: {}", serde_json::to_string_pretty(&request.types)?);
    println!(
        "{}: {}",
        request.primary_type,
        serde_json::to_string_pretty(&request.message)?
    );
    println!("message hash: {}", request.signing_hash()?);

    if !hash_only {
        let signature = request
            .sign(signer)
            .await
            .with_context(|| format!("Failed to sign {} payload", request.primary_type))?;
        println!("signature: {}", split_signature(&signature));
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();

    let matches = parse_cli_args_typed_signer();
    let verbose = matches.get_flag("verbose");
    let hash_only = matches.get_flag("hash-only");

    let filter = if verbose {
        // debug for everything
        "debug"
    } else {
        // info+ for everything
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    // Signing identity: mnemonic and index from .env unless overridden
    let mnemonic = env::var("MNEMONIC").unwrap_or_else(|_| DEV_MNEMONIC.to_string());
    let account_index = match matches.get_one::<u32>("account-index") {
        Some(index) => *index,
        None => match env::var("ACCOUNT_INDEX") {
            Ok(index) => index.parse().context("ACCOUNT_INDEX must be an integer")?,
            Err(_) => 0,
        },
    };
    let signer = signer_from_mnemonic(&mnemonic, account_index)
        .context("Failed to derive the signing account")?;
    println!("account: {}", signer.address());

    let rpc_url = matches
        .get_one::<String>("rpc-url")
        .cloned()
        .or_else(|| env::var("ETH_RPC_URL").ok());
    if let (Some(rpc_url), false) = (rpc_url, hash_only) {
        enable_node_logging(&rpc_url).await?;
    }

    if let Some(path) = matches.get_one::<PathBuf>("fixture") {
        let fixture = load_bundle_fixture(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        run_fixture(&fixture, &signer, hash_only).await?;
    } else if let Some(path) = matches.get_one::<PathBuf>("request") {
        let request = load_typed_data_request(path)
            .with_context(|| format!("Failed to load request {}", path.display()))?;
        run_request(&request, &signer, hash_only).await?;
    }

    Ok(())
}
