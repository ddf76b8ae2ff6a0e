//! Trade: an immutable settlement record (part of C6).

use crate::types::{AccountId, InstrumentId, Price, Shares};

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub buy_account_id: AccountId,
    pub sell_account_id: AccountId,
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub num_shares: Shares,
    pub timestamp: u64,
}

impl Trade {
    pub fn new(
        buy_account_id: AccountId,
        sell_account_id: AccountId,
        instrument_id: InstrumentId,
        price: Price,
        num_shares: Shares,
        timestamp: u64,
    ) -> Self {
        Self { buy_account_id, sell_account_id, instrument_id, price, num_shares, timestamp }
    }
}
