//! Order (C1): an immutable-except-for-rank-and-quantity record of a single
//! limit order.

use crate::error::{CoreError, CoreResult};
use crate::side::Side;
use crate::types::{AccountId, Amount, InstrumentId, Price, Rank, Shares};

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub account_id: AccountId,
    pub side: Side,
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub num_shares: Shares,
    pub timestamp: u64,
    /// Assigned on first insertion into an `InstrumentBook`; `None` beforehand.
    pub rank: Option<Rank>,
}

impl Order {
    /// Validates and constructs an order with no rank assigned yet.
    pub fn new(
        account_id: AccountId,
        side: Side,
        instrument_id: InstrumentId,
        price: Price,
        num_shares: Shares,
        timestamp: u64,
    ) -> CoreResult<Self> {
        if account_id.is_empty() {
            return Err(CoreError::InvalidOrder("account_id must not be empty".into()));
        }
        if instrument_id.is_empty() {
            return Err(CoreError::InvalidOrder("instrument_id must not be empty".into()));
        }
        if price.0 <= 0 || price.0 >= Price::MAX_UNIT {
            return Err(CoreError::InvalidOrder(format!(
                "price {price} must be strictly between 0 and 100"
            )));
        }
        if num_shares <= 0 {
            return Err(CoreError::InvalidOrder("num_shares must be positive".into()));
        }
        Ok(Self {
            account_id,
            side,
            instrument_id,
            price,
            num_shares,
            timestamp,
            rank: None,
        })
    }

    /// Worst-case locked cash this order contributes to its account's risk:
    /// `price * shares` for a bid, `(100 - price) * shares` for an ask.
    pub fn cost(&self) -> Amount {
        match self.side {
            Side::Bid => self.price.0 * self.num_shares,
            Side::Ask => self.price.complement().0 * self.num_shares,
        }
    }

    /// True iff this order and `other` could trade: same instrument,
    /// different accounts, opposite sides, and crossing prices. Commutative.
    pub fn matches(&self, other: &Order) -> bool {
        if self.instrument_id != other.instrument_id
            || self.account_id == other.account_id
            || self.side == other.side
        {
            return false;
        }
        Self::crosses(self.side, self.price, other.price)
    }

    /// Same-account contrary-order test used for self-cancellation (engine
    /// Step 1). Unlike `matches`, this requires the SAME account: a user can
    /// never trade with themselves, so their own opposite-side orders that
    /// would cross this one are consumed by cancellation first.
    pub fn contrary_to(&self, resting: &Order) -> bool {
        if self.account_id != resting.account_id
            || self.instrument_id != resting.instrument_id
            || self.side == resting.side
        {
            return false;
        }
        Self::crosses(self.side, self.price, resting.price)
    }

    fn crosses(side: Side, price: Price, other_price: Price) -> bool {
        match side {
            Side::Bid => price.0 >= other_price.0,
            Side::Ask => price.0 <= other_price.0,
        }
    }

    /// Shrinks this order's quantity by `by`. `by` must be positive and not
    /// exceed the current quantity.
    pub fn shrink(&mut self, by: Shares) -> CoreResult<()> {
        if by <= 0 || by > self.num_shares {
            return Err(CoreError::InvalidQuantity(format!(
                "cannot remove {by} shares from order with {} remaining",
                self.num_shares
            )));
        }
        self.num_shares -= by;
        Ok(())
    }

    /// A short label identifying the order by its `claim#rank` key, used by
    /// the `cancel`/`gcancel` commands.
    pub fn label(&self) -> String {
        match self.rank {
            Some(r) => format!("{}#{}", self.instrument_id, r),
            None => format!("{}#?", self.instrument_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(account: &str, side: Side, price: i64, shares: Shares) -> Order {
        Order::new(account.into(), side, "claim".into(), Price(price), shares, 0).unwrap()
    }

    #[test]
    fn rejects_empty_account() {
        assert!(Order::new("".into(), Side::Bid, "c".into(), Price(3000), 1, 0).is_err());
    }

    #[test]
    fn rejects_boundary_prices() {
        assert!(Order::new("a".into(), Side::Bid, "c".into(), Price(0), 1, 0).is_err());
        assert!(Order::new("a".into(), Side::Bid, "c".into(), Price(10000), 1, 0).is_err());
        assert!(Order::new("a".into(), Side::Bid, "c".into(), Price(1), 1, 0).is_ok());
        assert!(Order::new("a".into(), Side::Bid, "c".into(), Price(9999), 1, 0).is_ok());
    }

    #[test]
    fn rejects_zero_quantity() {
        assert!(Order::new("a".into(), Side::Bid, "c".into(), Price(3000), 0, 0).is_err());
    }

    #[test]
    fn cost_bid_and_ask() {
        assert_eq!(order("u", Side::Bid, 3000, 4).cost(), 12_000);
        assert_eq!(order("u", Side::Ask, 2900, 4).cost(), 28_400);
    }

    #[test]
    fn matches_requires_different_accounts_and_crossing_price() {
        let bid = order("u1", Side::Bid, 3000, 4);
        let ask_same_account = order("u1", Side::Ask, 2900, 4);
        let ask_other_account = order("u2", Side::Ask, 2900, 4);
        assert!(!bid.matches(&ask_same_account));
        assert!(bid.matches(&ask_other_account));
        assert!(ask_other_account.matches(&bid));

        let ask_too_high = order("u2", Side::Ask, 3100, 4);
        assert!(!bid.matches(&ask_too_high));
    }

    #[test]
    fn contrary_to_requires_same_account_and_crossing_price() {
        let resting_bid = order("u1", Side::Bid, 5000, 10);
        let incoming_ask = order("u1", Side::Ask, 5000, 4);
        assert!(incoming_ask.contrary_to(&resting_bid));

        let non_crossing_ask = order("u1", Side::Ask, 6000, 4);
        assert!(!non_crossing_ask.contrary_to(&resting_bid));

        let other_account_ask = order("u2", Side::Ask, 5000, 4);
        assert!(!other_account_ask.contrary_to(&resting_bid));
    }

    #[test]
    fn shrink_validates_range() {
        let mut o = order("u", Side::Bid, 3000, 10);
        assert!(o.shrink(0).is_err());
        assert!(o.shrink(11).is_err());
        o.shrink(4).unwrap();
        assert_eq!(o.num_shares, 6);
    }
}
