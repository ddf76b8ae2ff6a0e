//! Order side (bid/ask) and coupon side (yes/no).

use std::fmt;

/// Side of a limit order: a bid buys "yes" exposure, an ask sells it
/// (equivalently, buys "no" at the complementary price).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// The coupon side a filled order on this side produces: a bid fill
    /// yields a "yes" coupon, an ask fill a "no" coupon.
    #[inline]
    pub fn coupon_side(self) -> CouponSide {
        match self {
            Side::Bid => CouponSide::Yes,
            Side::Ask => CouponSide::No,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Bid => "b",
            Side::Ask => "a",
        })
    }
}

/// Which outcome of a claim a coupon pays out on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum CouponSide {
    Yes,
    No,
}

impl CouponSide {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            CouponSide::Yes => CouponSide::No,
            CouponSide::No => CouponSide::Yes,
        }
    }
}

impl fmt::Display for CouponSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CouponSide::Yes => "y",
            CouponSide::No => "n",
        })
    }
}
