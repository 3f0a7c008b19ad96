//! Wallet contract versions and networks.

/// TON network, identified on-chain by a global id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// The network's global id, mixed into W5 wallet ids.
    pub fn global_id(self) -> i32 {
        match self {
            Network::Mainnet => -239,
            Network::Testnet => -3,
        }
    }
}

/// Base subwallet id used by V3 and V4 contracts on workchain 0.
const V3_V4_BASE_WALLET_ID: i32 = 698_983_191;

/// Supported wallet contract versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WalletVersion {
    V3R1,
    V3R2,
    V4R1,
    V4R2,
    W5,
}

impl WalletVersion {
    /// Maximum number of internal messages one external message can carry.
    ///
    /// W5 chains send actions in a linked list and allows 255; V3 and V4
    /// store each message as a direct reference and allow 4.
    pub fn max_messages(self) -> usize {
        match self {
            WalletVersion::W5 => 255,
            _ => 4,
        }
    }

    /// Versions shown to every user regardless of balance or history.
    pub fn is_primary(self) -> bool {
        matches!(self, WalletVersion::W5 | WalletVersion::V4R2)
    }

    /// The default wallet id for this version on the given network and
    /// workchain.
    ///
    /// V3/V4 use a fixed base plus the workchain. W5 XORs the network
    /// global id with a client context word laid out as
    /// `[flag:1][workchain:8][version:8][subwallet:15]`.
    pub fn default_wallet_id(self, network: Network, workchain: i32) -> i32 {
        match self {
            WalletVersion::W5 => {
                let workchain_byte = ((workchain as i8) as u32) & 0xFF;
                let context: u32 = (1u32 << 31) | (workchain_byte << 23);
                network.global_id() ^ (context as i32)
            }
            _ => V3_V4_BASE_WALLET_ID + workchain,
        }
    }

    /// Short identifier, as shown in wallet settings.
    pub fn as_str(self) -> &'static str {
        match self {
            WalletVersion::V3R1 => "v3R1",
            WalletVersion::V3R2 => "v3R2",
            WalletVersion::V4R1 => "v4R1",
            WalletVersion::V4R2 => "v4R2",
            WalletVersion::W5 => "W5",
        }
    }

    /// All supported versions, newest first.
    pub fn all() -> [WalletVersion; 5] {
        [
            WalletVersion::W5,
            WalletVersion::V4R2,
            WalletVersion::V4R1,
            WalletVersion::V3R2,
            WalletVersion::V3R1,
        ]
    }
}

impl std::fmt::Display for WalletVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
