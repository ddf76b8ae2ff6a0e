//! Portfolio and Positions (C4): per-account cash balance, coupon holdings,
//! and the locked-cash/affordability computations that guard order
//! placement.

use rustc_hash::FxHashMap;

use crate::coupon::Coupon;
use crate::error::{CoreError, CoreResult};
use crate::order::Order;
use crate::order_book::Risk;
use crate::side::{CouponSide, Side};
use crate::types::{AccountId, Amount, InstrumentId, Shares, INITIAL_CASH, PAYOUT};

#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Portfolio {
    pub account_id: AccountId,
    pub cash_balance: Amount,
    pub coupons: FxHashMap<InstrumentId, Coupon>,
}

impl Portfolio {
    pub fn new(account_id: AccountId) -> Self {
        Self { account_id, cash_balance: INITIAL_CASH, coupons: FxHashMap::default() }
    }

    /// Nets `new` into the existing coupon on `new.instrument_id` (if any) at
    /// per-share `cost`, adjusting `cash_balance` to match. `cost` is the
    /// price, in the fixed-point scale, of the side `new` is denominated in
    /// (a Yes coupon costs the order's own price; a No coupon costs its
    /// complement).
    ///
    /// Three cases: no existing position (full cost debited); same-side
    /// accumulation (full cost debited); opposite-side netting, which either
    /// closes part of the existing position (credited at the complementary
    /// price) or flips past it entirely — in the flip case the full
    /// incoming quantity is charged at `cost`, not just the excess over the
    /// closed amount.
    pub fn add_coupon(&mut self, new: Coupon, cost: Amount) {
        let instrument_id = new.instrument_id.clone();
        match self.coupons.get_mut(&instrument_id) {
            None => {
                self.cash_balance -= cost * new.shares;
                if new.shares > 0 {
                    self.coupons.insert(instrument_id, new);
                }
            }
            Some(curr) => {
                if curr.side == new.side {
                    self.cash_balance -= cost * new.shares;
                    curr.add_shares(new.side, new.shares);
                } else if curr.shares >= new.shares {
                    self.cash_balance += (PAYOUT - cost) * new.shares;
                    curr.add_shares(new.side, new.shares);
                } else {
                    self.cash_balance += PAYOUT * curr.shares;
                    self.cash_balance -= cost * new.shares;
                    curr.add_shares(new.side, new.shares);
                }
                // Invariant 1: a coupon that nets to zero shares is removed.
                if self.coupons.get(&instrument_id).is_some_and(|c| c.shares == 0) {
                    self.coupons.remove(&instrument_id);
                }
            }
        }
    }

    fn adjusted(&self, instrument_id: &str, entry_bid: Amount, entry_ask: Amount) -> (Amount, Amount) {
        let (mut a, mut b) = (entry_bid, entry_ask);
        if let Some(c) = self.coupons.get(instrument_id) {
            match c.side {
                CouponSide::Yes => a -= PAYOUT * c.shares,
                CouponSide::No => b -= PAYOUT * c.shares,
            }
        }
        (a, b)
    }

    /// Worst-case cash this account has reserved across every instrument in
    /// `risk`, net of the payout it would already receive from its own
    /// coupon holdings on each instrument.
    pub fn locked_cash(&self, risk: &Risk) -> Amount {
        risk.iter()
            .map(|(instrument_id, entry)| {
                let (a, b) = self.adjusted(instrument_id, entry.bid, entry.ask);
                a.max(b).max(0)
            })
            .sum()
    }

    /// The largest `order.num_shares` this account could place on `order`'s
    /// side at `order`'s price without its reserved cash exceeding
    /// `cash_balance`, given everything else it already has resting in
    /// `risk`. May be negative (not affordable at all).
    pub fn afford(&self, risk: &Risk, order: &Order) -> Shares {
        let locking: Amount = risk
            .iter()
            .filter(|(instrument_id, _)| *instrument_id != &order.instrument_id)
            .map(|(instrument_id, entry)| {
                let (a, b) = self.adjusted(instrument_id, entry.bid, entry.ask);
                a.max(b).max(0)
            })
            .sum();
        let available = self.cash_balance - locking;
        let entry = risk.get(&order.instrument_id).copied().unwrap_or_default();
        let (a, b) = self.adjusted(&order.instrument_id, entry.bid, entry.ask);
        match order.side {
            Side::Ask => (available - a).div_euclid(order.price.complement().0),
            Side::Bid => (available - b).div_euclid(order.price.0),
        }
    }
}

/// Registry of all known accounts' portfolios.
#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Positions {
    pub portfolios: FxHashMap<AccountId, Portfolio>,
}

impl Positions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, account_id: AccountId) -> CoreResult<&mut Portfolio> {
        if self.portfolios.contains_key(&account_id) {
            return Err(CoreError::AlreadyExists(format!("account {account_id} already registered")));
        }
        self.portfolios.insert(account_id.clone(), Portfolio::new(account_id.clone()));
        Ok(self.portfolios.get_mut(&account_id).expect("just inserted"))
    }

    pub fn get(&self, account_id: &str) -> CoreResult<&Portfolio> {
        self.portfolios
            .get(account_id)
            .ok_or_else(|| CoreError::NotFound(format!("no portfolio for {account_id}")))
    }

    pub fn get_mut(&mut self, account_id: &str) -> CoreResult<&mut Portfolio> {
        self.portfolios
            .get_mut(account_id)
            .ok_or_else(|| CoreError::NotFound(format!("no portfolio for {account_id}")))
    }
}
