//! Core fixed-point types shared across the trading core: account and
//! instrument identifiers, price, shares, cash amounts, and per-instrument
//! rank.

use std::fmt;

/// Opaque external account identifier (a hostmask, in the original chat bot).
pub type AccountId = String;

/// Opaque claim/instrument identifier (the claim's symbolic name).
pub type InstrumentId = String;

/// Price of a coupon, in hundredths of a unit, open interval `(0, 100)`.
///
/// `Price(3000)` represents the probability-price `30.00`. Valid order
/// prices lie in `1..=9999`; `0` and `10000` (the excluded endpoints 0 and
/// 100) are rejected by [`crate::order::Order::new`]. Using a fixed-point
/// integer instead of a float keeps every downstream cost and cash
/// computation exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Price(pub i64);

impl Price {
    /// Hundredths-of-a-unit scale: `Price(100)` is one whole unit (`1.00`).
    pub const SCALE: i64 = 100;
    /// The value of "100" in the price domain, expressed on this scale.
    pub const MAX_UNIT: i64 = 100 * Self::SCALE;

    /// `100 - price`, the price of the opposite side of a coupon pair.
    pub fn complement(self) -> Price {
        Price(Self::MAX_UNIT - self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / Self::SCALE, (self.0 % Self::SCALE).abs())
    }
}

/// Number of shares/coupons. Whole units only: the original allows decimal
/// quantities, but in practice (and per the fixed-point guidance) every
/// quantity observed is integral, so this crate keeps it that way.
pub type Shares = i64;

/// Cash or payout amount, in hundredths of a unit. Shares the same
/// fixed-point scale as [`Price`] (`100` units of payout == [`PAYOUT`]), so a
/// per-share price and a per-share payout are directly commensurate without
/// further scaling.
pub type Amount = i64;

/// Amount paid out per winning coupon share when a claim resolves.
pub const PAYOUT: Amount = 100 * Price::SCALE;

/// Cash granted to a newly created portfolio.
pub const INITIAL_CASH: Amount = 1_000_000 * Price::SCALE;

/// Per-instrument, monotonically increasing sequence number assigned to an
/// order on first insertion into an [`crate::instrument_book::InstrumentBook`].
/// Defines time priority: smaller rank means earlier, i.e. higher priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Rank(pub u64);

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
