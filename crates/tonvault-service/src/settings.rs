//! Settings list derivations.
//!
//! Pure functions from account state to what the settings screens show.
//! Nothing here persists or fetches; the inputs arrive already resolved.

use tonvault_wallet::WalletVersion;

/// One wallet version row as known to the settings screen.
#[derive(Debug, Clone)]
pub struct WalletVersionItem {
    pub version: WalletVersion,
    /// Already attached to the account.
    pub added: bool,
    /// Balance in nanotons.
    pub balance: u128,
    pub has_token_balances: bool,
}

impl WalletVersionItem {
    fn is_visible(&self) -> bool {
        self.version.is_primary() || self.added || self.balance > 0 || self.has_token_balances
    }
}

/// Filter the wallet version list down to what the user should see.
///
/// Backward-compat-only versions are hidden unless they are attached, hold
/// a balance, or hold token balances. Order is preserved.
pub fn visible_versions(items: &[WalletVersionItem]) -> Vec<&WalletVersionItem> {
    items.iter().filter(|item| item.is_visible()).collect()
}

/// How the account's key material is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Mnemonic,
    Ledger,
    WatchOnly,
    Testnet,
}

/// An entry of the account settings list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEntry {
    RecoveryPhrase,
    WalletVersions,
    ConnectedApps,
    SignOut,
    DeleteAccount,
}

/// The ordered settings entries for an account kind.
///
/// Watch-only accounts have no key material and cannot connect to dApps;
/// Ledger accounts keep their phrase on the device.
pub fn settings_entries(kind: AccountKind) -> Vec<SettingsEntry> {
    use SettingsEntry::*;

    match kind {
        AccountKind::Mnemonic | AccountKind::Testnet => vec![
            RecoveryPhrase,
            WalletVersions,
            ConnectedApps,
            SignOut,
            DeleteAccount,
        ],
        AccountKind::Ledger => vec![WalletVersions, ConnectedApps, SignOut, DeleteAccount],
        AccountKind::WatchOnly => vec![SignOut, DeleteAccount],
    }
}
