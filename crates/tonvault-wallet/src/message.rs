//! Internal message construction and send modes.

use std::sync::Arc;

use tonvault_cell::{Cell, CellBuilder, CellResult, TonAddress};

/// Send modes, combined by OR-ing flags.
pub mod send_mode {
    /// Pay forwarding fees separately from the message value.
    pub const PAY_GAS_SEPARATELY: u8 = 1;

    /// Ignore errors arising during action phase processing.
    pub const IGNORE_ERRORS: u8 = 2;

    /// Carry the entire remaining balance instead of the stated value.
    pub const CARRY_ALL_REMAINING_BALANCE: u8 = 128;
}

/// An internal message a wallet contract will send on our behalf.
#[derive(Debug, Clone)]
pub struct InternalMessage {
    pub to: TonAddress,
    /// Value in nanotons. Ignored by the chain when the send mode carries
    /// the whole balance.
    pub amount: u128,
    pub bounce: bool,
    pub mode: u8,
    /// Optional body cell, stored as a reference.
    pub payload: Option<Arc<Cell>>,
    /// Optional StateInit, stored as a reference. Set when deploying the
    /// recipient contract alongside the transfer.
    pub state_init: Option<Arc<Cell>>,
}

impl InternalMessage {
    pub fn new(to: TonAddress, amount: u128, bounce: bool, mode: u8) -> Self {
        Self {
            to,
            amount,
            bounce,
            mode,
            payload: None,
            state_init: None,
        }
    }

    pub fn with_payload(mut self, payload: Arc<Cell>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_state_init(mut self, state_init: Arc<Cell>) -> Self {
        self.state_init = Some(state_init);
        self
    }

    /// Encode as a MessageRelaxed cell with an int_msg_info$0 header.
    ///
    /// Source is addr_none (filled in by the chain), fees and logical time
    /// are zero at construction. StateInit and body always go into
    /// references when present.
    pub fn build(&self) -> CellResult<Cell> {
        let mut builder = CellBuilder::new();

        // int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
        builder.store_bit(false)?;
        builder.store_bit(true)?;
        builder.store_bit(self.bounce)?;
        builder.store_bit(false)?;

        builder.store_address_none()?;
        builder.store_address(&self.to)?;

        // value:CurrencyCollection (no extra currencies)
        builder.store_coins(self.amount)?;
        builder.store_bit(false)?;

        // ihr_fee fwd_fee created_lt created_at
        builder.store_coins(0)?;
        builder.store_coins(0)?;
        builder.store_u64(0)?;
        builder.store_u32(0)?;

        // init:(Maybe (Either StateInit ^StateInit))
        match &self.state_init {
            Some(init) => {
                builder.store_bit(true)?;
                builder.store_bit(true)?;
                builder.store_ref(init.clone())?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        // body:(Either X ^X)
        match &self.payload {
            Some(payload) => {
                builder.store_bit(true)?;
                builder.store_ref(payload.clone())?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        builder.build()
    }
}
