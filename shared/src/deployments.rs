//! Per-chain deployment addresses merged into a contract-first lookup table.
//!
//! A deployment pipeline writes one file per network, shaped as
//! `{ "<chainId>": { "<ContractName>": "0x…" } }`. The code generator wants the
//! transpose, `{ "<ContractName>": { "<chainId>": "0x…" } }`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{log_debug, log_warn, read_json};

/// Numeric network identifier. Serialized as a decimal string map key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = Error;

    /// Only canonical decimal is accepted, so `"01"` and `"1"` never name the same chain.
    fn from_str(s: &str) -> Result<Self> {
        let chain_id = s
            .parse::<u64>()
            .map(ChainId)
            .map_err(|_| Error::MalformedInput(format!("chain identifier '{}' is not an integer", s)))?;
        if chain_id.to_string() != s {
            return Err(Error::MalformedInput(format!(
                "chain identifier '{}' is not in canonical decimal form",
                s
            )));
        }
        Ok(chain_id)
    }
}

/// One deployment output file: a single chain identifier mapping contract
/// names to addresses. Addresses are kept exactly as written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentRecord(pub BTreeMap<String, BTreeMap<String, String>>);

impl DeploymentRecord {
    /// Record for a single chain.
    pub fn new<I, K, V>(chain_id: u64, contracts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let contracts = contracts
            .into_iter()
            .map(|(name, address)| (name.into(), address.into()))
            .collect();
        let mut chains = BTreeMap::new();
        chains.insert(chain_id.to_string(), contracts);
        Self(chains)
    }

    /// The one chain identifier this record is keyed by.
    ///
    /// Files are single-chain by convention; a record with zero or several
    /// chain keys is rejected instead of guessing which one was meant.
    pub fn chain_id(&self) -> Result<ChainId> {
        let mut keys = self.0.keys();
        match (keys.next(), keys.next()) {
            (None, _) => Err(Error::MalformedInput(
                "no chain identifier found in deployments file".to_string(),
            )),
            (Some(key), None) => key.parse(),
            (Some(_), Some(_)) => Err(Error::MalformedInput(format!(
                "expected a single chain identifier per deployments file, found {}",
                self.0.keys().cloned().collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    /// Contract name to address pairs under the record's chain.
    pub fn contracts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .values()
            .flat_map(|contracts| contracts.iter().map(|(n, a)| (n.as_str(), a.as_str())))
    }
}

/// Contract name → chain → address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentTable(BTreeMap<String, BTreeMap<ChainId, String>>);

impl DeploymentTable {
    pub fn get(&self, contract: &str, chain_id: u64) -> Option<&str> {
        self.0
            .get(contract)
            .and_then(|chains| chains.get(&ChainId(chain_id)))
            .map(String::as_str)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Chains a contract is deployed on, with their addresses.
    pub fn chains(&self, contract: &str) -> Option<&BTreeMap<ChainId, String>> {
        self.0.get(contract)
    }

    /// Number of contracts in the table.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// -------------------------------------------
/// Merges deployment records into a table, in order. For the same contract
/// on the same chain the later record wins.
/// -------------------------------------------
pub fn merge_deployments<'a, I>(records: I) -> Result<DeploymentTable>
where
    I: IntoIterator<Item = &'a DeploymentRecord>,
{
    let mut table: BTreeMap<String, BTreeMap<ChainId, String>> = BTreeMap::new();

    for record in records {
        let chain_id = record.chain_id()?;
        log_debug!("Merging deployments for chain {}", chain_id);

        for (contract, address) in record.contracts() {
            let chains = table.entry(contract.to_string()).or_default();
            if let Some(previous) = chains.insert(chain_id, address.to_string()) {
                if previous != address {
                    log_warn!(
                        "{} on chain {} overwritten: {} -> {}",
                        contract,
                        chain_id,
                        previous,
                        address
                    );
                }
            }
        }
    }

    Ok(DeploymentTable(table))
}

/// -------------------------------------------
/// Reads a deployment record from a JSON file
/// -------------------------------------------
pub fn load_deployment_record(path: &Path) -> Result<DeploymentRecord> {
    let record = read_json(path)?;
    log_debug!("Loaded deployments from {}", path.display());
    Ok(record)
}

/// Reads deployment records keeping the order of `paths`, which is the merge order.
pub fn load_deployment_records(paths: &[PathBuf]) -> Result<Vec<DeploymentRecord>> {
    paths.iter().map(|path| load_deployment_record(path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    const FOO_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const FOO_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn record(value: serde_json::Value) -> DeploymentRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_record() {
        let sources = [record(json!({ "1": { "Foo": FOO_A } }))];
        let table = merge_deployments(&sources).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Foo", 1), Some(FOO_A));
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({ "Foo": { "1": FOO_A } })
        );
    }

    #[test]
    fn test_same_contract_on_two_chains() {
        let sources = [
            record(json!({ "1": { "Foo": FOO_A } })),
            record(json!({ "2": { "Foo": FOO_B } })),
        ];
        let table = merge_deployments(&sources).unwrap();

        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({ "Foo": { "1": FOO_A, "2": FOO_B } })
        );
    }

    #[test]
    fn test_later_record_wins() {
        let a = DeploymentRecord::new(11155111, [("Foo", FOO_A)]);
        let b = DeploymentRecord::new(11155111, [("Foo", FOO_B)]);

        let table = merge_deployments([&a, &b]).unwrap();
        assert_eq!(table.get("Foo", 11155111), Some(FOO_B));

        let table = merge_deployments([&b, &a]).unwrap();
        assert_eq!(table.get("Foo", 11155111), Some(FOO_A));
    }

    #[test]
    fn test_disjoint_records_are_unioned() {
        let a = DeploymentRecord::new(1, [("Foo", FOO_A)]);
        let b = DeploymentRecord::new(31337, [("Bar", FOO_B)]);
        let table = merge_deployments([&a, &b]).unwrap();

        assert_eq!(table.contracts().collect::<Vec<_>>(), vec!["Bar", "Foo"]);
        assert_eq!(table.get("Foo", 1), Some(FOO_A));
        assert_eq!(table.get("Bar", 31337), Some(FOO_B));
        assert_eq!(table.get("Foo", 31337), None);
        assert_eq!(table.get("Bar", 1), None);
        assert_eq!(table.chains("Foo").map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let a = DeploymentRecord::new(1, [("Foo", FOO_A)]);
        let b = DeploymentRecord::new(1, [("Foo", FOO_B)]);
        let before = (a.clone(), b.clone());
        merge_deployments([&a, &b]).unwrap();
        assert_eq!((a, b), before);
    }

    #[test]
    fn test_empty_record_is_rejected() {
        let sources = [DeploymentRecord::default()];
        let err = merge_deployments(&sources).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("no chain identifier"));
    }

    #[test]
    fn test_empty_record_after_valid_one_aborts_merge() {
        let sources = [
            DeploymentRecord::new(1, [("Foo", FOO_A)]),
            DeploymentRecord::default(),
        ];
        assert!(matches!(
            merge_deployments(&sources),
            Err(Error::MalformedInput(_))
        ));
    }

    // Several chains in one file used to resolve to whichever key came last.
    // That was never a supported layout, so it fails instead.
    #[test]
    fn test_multi_chain_record_is_rejected() {
        let sources = [record(json!({
            "1": { "Foo": FOO_A },
            "2": { "Foo": FOO_B }
        }))];
        let err = merge_deployments(&sources).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("1, 2"));
    }

    #[test]
    fn test_non_numeric_chain_id_is_rejected() {
        let sources = [record(json!({ "sepolia": { "Foo": FOO_A } }))];
        assert!(matches!(
            merge_deployments(&sources),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_non_canonical_chain_id_is_rejected() {
        for key in ["01", " 1", "1 ", "+1"] {
            let sources = [record(json!({ (key): { "Foo": FOO_A } }))];
            assert!(
                matches!(merge_deployments(&sources), Err(Error::MalformedInput(_))),
                "{:?}",
                key
            );
        }
        assert_eq!("0".parse::<ChainId>().unwrap(), ChainId(0));
    }

    #[test]
    fn test_addresses_pass_through_unvalidated() {
        let sources = [record(json!({ "1": { "Foo": "not-an-address" } }))];
        let table = merge_deployments(&sources).unwrap();
        assert_eq!(table.get("Foo", 1), Some("not-an-address"));
    }

    #[test]
    fn test_chain_with_no_contracts() {
        let sources = [record(json!({ "1": {} }))];
        let table = merge_deployments(&sources).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_deployment_records_keeps_order() {
        let dir = std::env::temp_dir().join(format!("deployments-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let first = dir.join("11155111.json");
        let second = dir.join("11155111-redeploy.json");
        fs::write(&first, json!({ "11155111": { "Foo": FOO_A } }).to_string()).unwrap();
        fs::write(&second, json!({ "11155111": { "Foo": FOO_B } }).to_string()).unwrap();

        let records = load_deployment_records(&[first, second]).unwrap();
        let table = merge_deployments(&records).unwrap();
        assert_eq!(table.get("Foo", 11155111), Some(FOO_B));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_deployment_record(Path::new("/nonexistent/31337.json")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
