// SPDX-License-Identifier: MIT

// Re‑export the tracing crate so macros can use `$crate::tracing::…`
pub use tracing;

pub mod log;

pub mod deployments;
pub mod error;
pub mod fixtures;
pub mod identity;
pub mod signing;

pub use error::{Error, Result};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Reads and parses a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

pub mod utils {
    use clap::{Arg, ArgAction, ArgGroup, Command};
    use std::path::PathBuf;

    /// -------------------------------------------
    /// Parses CLI arguments and returns the matches for the deployments binary.
    /// -------------------------------------------
    pub fn parse_cli_args_deployments() -> clap::ArgMatches {
        deployments_command().get_matches()
    }

    fn deployments_command() -> Command {
        Command::new("deployments")
            .version("1.0")
            .about("Merges per-chain deployment files into a contract -> chain -> address table")
            .arg(
                Arg::new("file")
                    .short('f')
                    .long("file")
                    .value_name("DEPLOYMENTS_FILE")
                    .help("Deployment output file ({ \"<chainId>\": { \"<Contract>\": \"0x…\" } }); repeat for more chains, later files win")
                    .required(true)
                    .action(ArgAction::Append)
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("OUTPUT_FILE")
                    .help("Writes the merged table to this file as JSON")
                    .required(false)
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Enable verbose (debug‑level) logging")
                    .action(ArgAction::SetTrue),
            )
    }

    /// -------------------------------------------
    /// Parses CLI arguments and returns the matches for the typed-signer binary.
    /// -------------------------------------------
    pub fn parse_cli_args_typed_signer() -> clap::ArgMatches {
        typed_signer_command().get_matches()
    }

    fn typed_signer_command() -> Command {
        Command::new("typed-signer")
            .version("1.0")
            .about("Builds EIP-712 payloads for test fixtures, signs them with the dev account and splits the signatures")
            .arg(
                Arg::new("fixture")
                    .short('f')
                    .long("fixture")
                    .value_name("BUNDLE_FIXTURE")
                    .help("Token metadata bundle fixture (domains, mode, bundles)")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("request")
                    .short('r')
                    .long("request")
                    .value_name("TYPED_DATA_REQUEST")
                    .help("Typed-data request for any schema (domain, types, primaryType, message)")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .group(
                ArgGroup::new("input")
                    .args(["fixture", "request"])
                    .required(true),
            )
            .arg(
                Arg::new("account-index")
                    .short('i')
                    .long("account-index")
                    .value_name("ACCOUNT_INDEX")
                    .help("Mnemonic account index of the signer (defaults to $ACCOUNT_INDEX, then 0)")
                    .required(false)
                    .value_parser(clap::value_parser!(u32)),
            )
            .arg(
                Arg::new("hash-only")
                    .long("hash-only")
                    .help("Print the typed-data hashes without signing")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("rpc-url")
                    .short('u')
                    .long("rpc-url")
                    .value_name("ETH_RPC_URL")
                    .help("Dev node to enable logging on before signing (defaults to $ETH_RPC_URL)")
                    .required(false),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Enable verbose (debug‑level) logging")
                    .action(ArgAction::SetTrue),
            )
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_deployments_files_keep_order() {
            let matches = deployments_command()
                .try_get_matches_from(["deployments", "-f", "b.json", "--file", "a.json", "-v"])
                .unwrap();
            let files: Vec<PathBuf> = matches
                .get_many::<PathBuf>("file")
                .unwrap()
                .cloned()
                .collect();
            assert_eq!(files, vec![PathBuf::from("b.json"), PathBuf::from("a.json")]);
            assert!(matches.get_flag("verbose"));
            assert!(matches.get_one::<PathBuf>("output").is_none());
        }

        #[test]
        fn test_deployments_requires_a_file() {
            assert!(deployments_command()
                .try_get_matches_from(["deployments"])
                .is_err());
        }

        #[test]
        fn test_typed_signer_inputs_are_exclusive() {
            assert!(typed_signer_command()
                .try_get_matches_from(["typed-signer"])
                .is_err());
            assert!(typed_signer_command()
                .try_get_matches_from(["typed-signer", "-f", "a.json", "-r", "b.json"])
                .is_err());

            let matches = typed_signer_command()
                .try_get_matches_from(["typed-signer", "-r", "split.json", "-i", "3", "--hash-only"])
                .unwrap();
            assert_eq!(matches.get_one::<u32>("account-index"), Some(&3));
            assert!(matches.get_flag("hash-only"));
            assert!(!matches.get_flag("verbose"));
        }
    }
}
