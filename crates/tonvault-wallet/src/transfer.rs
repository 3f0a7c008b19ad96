//! Transfer body construction and external message wrapping.
//!
//! A transfer goes out as an external message whose body is the wallet
//! contract's signed request. The unsigned body layout and the signature
//! position depend on the contract version:
//!
//! - W5: `op wallet_id valid_until seqno ^actions`, signature appended
//!   after the body bits
//! - V4: `wallet_id valid_until seqno op [mode ^msg]*`, signature first
//! - V3: like V4 without the op byte, signature first

use std::sync::Arc;

use tonvault_cell::{BagOfCells, Cell, CellBuilder, CellResult, TonAddress};

use crate::error::{WalletError, WalletResult};
use crate::keys::KeyPair;
use crate::message::InternalMessage;
use crate::version::WalletVersion;

/// "sign" in ASCII, the W5 signed-external op.
const W5_OP_AUTH_SIGNED: u32 = 0x7369676e;

/// Tag of action_send_msg in the W5 action list.
const W5_ACTION_SEND_MSG: u32 = 0x0ec3c86d;

/// An unsigned transfer body, ready to be signed or placeholder-signed.
#[derive(Debug, Clone)]
pub struct TransferBody {
    version: WalletVersion,
    cell: Cell,
}

impl TransferBody {
    /// Build the unsigned body for the given version.
    ///
    /// Fails when the message list is empty or exceeds the version's
    /// ceiling.
    pub fn build(
        version: WalletVersion,
        wallet_id: i32,
        seqno: u32,
        valid_until: u32,
        messages: &[InternalMessage],
    ) -> WalletResult<Self> {
        if messages.is_empty() {
            return Err(WalletError::NoMessages);
        }
        let max = version.max_messages();
        if messages.len() > max {
            return Err(WalletError::TooManyMessages {
                max,
                got: messages.len(),
            });
        }

        let cell = match version {
            WalletVersion::W5 => Self::build_w5(wallet_id, seqno, valid_until, messages)?,
            WalletVersion::V4R1 | WalletVersion::V4R2 => {
                Self::build_v3_v4(wallet_id, seqno, valid_until, messages, true)?
            }
            WalletVersion::V3R1 | WalletVersion::V3R2 => {
                Self::build_v3_v4(wallet_id, seqno, valid_until, messages, false)?
            }
        };

        Ok(Self { version, cell })
    }

    fn build_w5(
        wallet_id: i32,
        seqno: u32,
        valid_until: u32,
        messages: &[InternalMessage],
    ) -> WalletResult<Cell> {
        // Linked action list, last message innermost.
        let mut actions: Option<Cell> = None;
        for message in messages.iter().rev() {
            let msg_cell = message.build()?;

            let mut builder = CellBuilder::new();
            builder.store_u32(W5_ACTION_SEND_MSG)?;
            builder.store_u8(message.mode)?;
            builder.store_ref(Arc::new(msg_cell))?;
            if let Some(prev) = actions.take() {
                builder.store_ref(Arc::new(prev))?;
            }
            actions = Some(builder.build()?);
        }
        let actions = actions.ok_or(WalletError::NoMessages)?;

        let mut builder = CellBuilder::new();
        builder.store_u32(W5_OP_AUTH_SIGNED)?;
        builder.store_i32(wallet_id)?;
        builder.store_u32(valid_until)?;
        builder.store_u32(seqno)?;
        builder.store_ref(Arc::new(actions))?;
        Ok(builder.build()?)
    }

    fn build_v3_v4(
        wallet_id: i32,
        seqno: u32,
        valid_until: u32,
        messages: &[InternalMessage],
        with_op: bool,
    ) -> CellResult<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_i32(wallet_id)?;
        builder.store_u32(valid_until)?;
        builder.store_u32(seqno)?;
        if with_op {
            builder.store_u8(0)?; // op = simple send
        }
        for message in messages {
            builder.store_u8(message.mode)?;
            builder.store_ref(Arc::new(message.build()?))?;
        }
        builder.build()
    }

    /// Hash that gets signed.
    pub fn hash(&self) -> [u8; 32] {
        self.cell.hash()
    }

    /// The unsigned body cell.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Sign with the given keypair.
    pub fn sign(&self, keypair: &KeyPair) -> WalletResult<Cell> {
        self.assemble(&keypair.sign(&self.hash()))
    }

    /// Assemble with an all-zero signature.
    ///
    /// The result has the exact size and structure of a signed body and is
    /// used for fee estimation with signature checks disabled. It can never
    /// be accepted by the chain.
    pub fn sign_placeholder(&self) -> WalletResult<Cell> {
        self.assemble(&[0u8; 64])
    }

    fn assemble(&self, signature: &[u8; 64]) -> WalletResult<Cell> {
        let mut builder = CellBuilder::new();
        match self.version {
            WalletVersion::W5 => {
                store_cell_contents(&mut builder, &self.cell)?;
                builder.store_bytes(signature)?;
            }
            _ => {
                builder.store_bytes(signature)?;
                store_cell_contents(&mut builder, &self.cell)?;
            }
        }
        Ok(builder.build()?)
    }
}

/// Copy a cell's data bits and references into a builder.
fn store_cell_contents(builder: &mut CellBuilder, cell: &Cell) -> CellResult<()> {
    for i in 0..cell.bit_len() {
        let byte = cell.data()[i / 8];
        builder.store_bit((byte >> (7 - i % 8)) & 1 == 1)?;
    }
    for reference in cell.references() {
        builder.store_ref(reference.clone())?;
    }
    Ok(())
}

/// An external inbound message carrying a signed transfer body.
#[derive(Debug, Clone)]
pub struct ExternalMessage {
    cell: Cell,
}

impl ExternalMessage {
    /// Wrap a signed body for delivery to the wallet at `dest`.
    pub fn wrap(dest: &TonAddress, signed_body: Cell) -> CellResult<Self> {
        let mut builder = CellBuilder::new();

        // ext_in_msg_info$10 src:addr_none dest import_fee:0
        builder.store_uint(0b10, 2)?;
        builder.store_address_none()?;
        builder.store_address(dest)?;
        builder.store_coins(0)?;

        // init absent, body in ref
        builder.store_bit(false)?;
        builder.store_bit(true)?;
        builder.store_ref(Arc::new(signed_body))?;

        Ok(Self {
            cell: builder.build()?,
        })
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Serialize to a base64 BoC, the form the HTTP API accepts.
    pub fn to_boc_base64(&self) -> CellResult<String> {
        BagOfCells::from_root(self.cell.clone()).serialize_to_base64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::send_mode;
    use crate::version::Network;

    fn message(amount: u128) -> InternalMessage {
        InternalMessage::new(
            TonAddress::new(0, [0x17; 32]),
            amount,
            true,
            send_mode::PAY_GAS_SEPARATELY,
        )
    }

    fn w5_body(messages: &[InternalMessage]) -> TransferBody {
        let wallet_id = WalletVersion::W5.default_wallet_id(Network::Mainnet, 0);
        TransferBody::build(WalletVersion::W5, wallet_id, 7, 1_700_000_300, messages).unwrap()
    }

    #[test]
    fn test_empty_message_list_rejected() {
        assert!(matches!(
            TransferBody::build(WalletVersion::W5, 0, 0, 0, &[]),
            Err(WalletError::NoMessages)
        ));
    }

    #[test]
    fn test_v4_ceiling_enforced() {
        let messages: Vec<_> = (0..5).map(|_| message(1)).collect();
        assert!(matches!(
            TransferBody::build(WalletVersion::V4R2, 698_983_191, 0, 0, &messages),
            Err(WalletError::TooManyMessages { max: 4, got: 5 })
        ));
    }

    #[test]
    fn test_v4_accepts_four() {
        let messages: Vec<_> = (0..4).map(|_| message(1)).collect();
        let body =
            TransferBody::build(WalletVersion::V4R2, 698_983_191, 0, 0, &messages).unwrap();
        assert_eq!(body.cell().reference_count(), 4);
        // wallet_id + valid_until + seqno + op + 4 modes
        assert_eq!(body.cell().bit_len(), 32 + 32 + 32 + 8 + 4 * 8);
    }

    #[test]
    fn test_v3_has_no_op_byte() {
        let body =
            TransferBody::build(WalletVersion::V3R2, 698_983_191, 0, 0, &[message(1)]).unwrap();
        assert_eq!(body.cell().bit_len(), 32 + 32 + 32 + 8);
    }

    #[test]
    fn test_w5_body_layout() {
        let body = w5_body(&[message(1)]);
        let cell = body.cell();
        assert_eq!(cell.bit_len(), 32 + 32 + 32 + 32);
        assert_eq!(cell.reference_count(), 1);
        assert_eq!(&cell.data()[0..4], &W5_OP_AUTH_SIGNED.to_be_bytes());

        // Single action: tag, mode, message ref, no prev.
        let action = &cell.references()[0];
        assert_eq!(&action.data()[0..4], &W5_ACTION_SEND_MSG.to_be_bytes());
        assert_eq!(action.reference_count(), 1);
    }

    #[test]
    fn test_w5_action_list_links_in_order() {
        let body = w5_body(&[message(1), message(2), message(3)]);
        let mut node = body.cell().references()[0].clone();
        let mut count = 1;
        while node.reference_count() == 2 {
            node = node.references()[1].clone();
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_w5_accepts_many_messages() {
        let messages: Vec<_> = (0..255).map(|_| message(1)).collect();
        assert!(w5_body(&messages).cell().reference_count() == 1);
    }

    #[test]
    fn test_w5_signature_appended() {
        let body = w5_body(&[message(1)]);
        let keypair = KeyPair::from_secret([3u8; 32]);
        let signed = body.sign(&keypair).unwrap();

        assert_eq!(signed.bit_len(), body.cell().bit_len() + 512);
        // Body bits come first.
        assert_eq!(&signed.data()[0..4], &W5_OP_AUTH_SIGNED.to_be_bytes());
    }

    #[test]
    fn test_v4_signature_first() {
        let body =
            TransferBody::build(WalletVersion::V4R2, 698_983_191, 1, 2, &[message(1)]).unwrap();
        let keypair = KeyPair::from_secret([3u8; 32]);
        let signed = body.sign(&keypair).unwrap();

        assert_eq!(signed.bit_len(), 512 + body.cell().bit_len());
        let signature = keypair.sign(&body.hash());
        assert_eq!(&signed.data()[0..64], &signature[..]);
    }

    #[test]
    fn test_placeholder_matches_signed_shape() {
        let body = w5_body(&[message(1)]);
        let keypair = KeyPair::from_secret([5u8; 32]);
        let signed = body.sign(&keypair).unwrap();
        let placeholder = body.sign_placeholder().unwrap();

        assert_eq!(signed.bit_len(), placeholder.bit_len());
        assert_eq!(signed.reference_count(), placeholder.reference_count());
        assert_ne!(signed.hash(), placeholder.hash());
    }

    #[test]
    fn test_external_message_wraps_body_in_ref() {
        let body = w5_body(&[message(1)]);
        let signed = body.sign_placeholder().unwrap();
        let signed_hash = signed.hash();

        let dest = TonAddress::new(0, [0x99; 32]);
        let external = ExternalMessage::wrap(&dest, signed).unwrap();

        // ext_in_msg_info$10
        assert_eq!(external.cell().get_bit(0), Some(true));
        assert_eq!(external.cell().get_bit(1), Some(false));
        assert_eq!(external.cell().reference_count(), 1);
        assert_eq!(external.cell().references()[0].hash(), signed_hash);

        let boc = external.to_boc_base64().unwrap();
        let roots = BagOfCells::deserialize_from_base64(&boc).unwrap();
        assert_eq!(roots.single_root().unwrap().hash(), external.cell().hash());
    }
}
