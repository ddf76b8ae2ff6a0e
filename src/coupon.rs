//! Coupon: a signed position in a single claim held by one account.

use crate::side::CouponSide;
use crate::types::{InstrumentId, Shares};

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Coupon {
    pub instrument_id: InstrumentId,
    pub shares: Shares,
    pub side: CouponSide,
}

impl Coupon {
    pub fn new(instrument_id: InstrumentId, shares: Shares, side: CouponSide) -> Self {
        debug_assert!(shares > 0, "a coupon is always constructed with positive shares");
        Self { instrument_id, shares, side }
    }

    /// Nets `num_shares` of `side` into this coupon. Same side adds; opposite
    /// side subtracts, flipping `self.side` and negating back to positive if
    /// the opposite side outweighs the current holding.
    pub fn add_shares(&mut self, side: CouponSide, num_shares: Shares) {
        if side == self.side {
            self.shares += num_shares;
        } else {
            self.shares -= num_shares;
            if self.shares < 0 {
                self.side = self.side.opposite();
                self.shares = -self.shares;
            }
        }
    }
}
