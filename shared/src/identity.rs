//! The one signing identity fixtures are produced under, derived from a
//! mnemonic the same way wallets do (`m/44'/60'/0'/0/{index}`).

use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};

use crate::error::Result;
use crate::log_debug;

/// Well-known development mnemonic (anvil / hardhat). Never holds real funds.
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// -------------------------------------------
/// Derives the signer at `account_index` from a BIP-39 phrase
/// -------------------------------------------
pub fn signer_from_mnemonic(phrase: &str, account_index: u32) -> Result<PrivateKeySigner> {
    let signer = MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(account_index)?
        .build()?;
    log_debug!(
        "Derived signer {} at account index {}",
        signer.address(),
        account_index
    );
    Ok(signer)
}

pub fn dev_signer(account_index: u32) -> Result<PrivateKeySigner> {
    signer_from_mnemonic(DEV_MNEMONIC, account_index)
}
