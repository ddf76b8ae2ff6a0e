//! Property-based tests for trading-core invariants.
//!
//! These tests use proptest to verify that key invariants hold across
//! randomly generated sequences of orders.

use claimbook::{Order, Price, Side, TradingEngine, INITIAL_CASH, PAYOUT};
use proptest::prelude::*;

const ACCOUNTS: [&str; 3] = ["u1", "u2", "u3"];

fn price_strategy() -> impl Strategy<Value = Price> {
    (4700i64..=5300i64).prop_map(Price)
}

fn shares_strategy() -> impl Strategy<Value = i64> {
    1i64..=10_000i64
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Bid), Just(Side::Ask)]
}

fn account_strategy() -> impl Strategy<Value = usize> {
    0usize..ACCOUNTS.len()
}

fn engine_with_accounts() -> TradingEngine {
    let mut e = TradingEngine::new();
    for a in ACCOUNTS {
        e.positions.register(a.to_string()).unwrap();
    }
    e
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// `matches` is commutative: if A crosses B, B crosses A, for any two
    /// freshly constructed orders.
    #[test]
    fn matches_is_commutative(
        a_idx in account_strategy(), b_idx in account_strategy(),
        a_side in side_strategy(), b_side in side_strategy(),
        a_price in price_strategy(), b_price in price_strategy(),
        shares in shares_strategy(),
    ) {
        let a = Order::new(ACCOUNTS[a_idx].into(), a_side, "c".into(), a_price, shares, 0).unwrap();
        let b = Order::new(ACCOUNTS[b_idx].into(), b_side, "c".into(), b_price, shares, 1).unwrap();
        prop_assert_eq!(a.matches(&b), b.matches(&a));
    }

    /// After any sequence of placements on one instrument, no crossing pair
    /// remains resting (the settlement loop always runs to exhaustion), and
    /// no resting order or stored coupon has zero or negative shares.
    #[test]
    fn no_crossing_remains_and_no_zero_share_entities_persist(
        ops in prop::collection::vec((account_strategy(), side_strategy(), price_strategy(), shares_strategy()), 1..30),
    ) {
        let mut e = engine_with_accounts();
        for (idx, side, price, shares) in ops {
            let order = Order::new(ACCOUNTS[idx].into(), side, "c".into(), price, shares, 0).unwrap();
            e.place(order).unwrap();
        }

        if let Some(book) = e.order_book.instrument("c") {
            if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
                prop_assert!(bid.price.0 < ask.price.0, "crossing orders left resting: bid {} ask {}", bid.price, ask.price);
            }
            for o in book.orders_iter() {
                prop_assert!(o.num_shares > 0);
            }
        }
        for account in ACCOUNTS {
            if let Ok(portfolio) = e.positions.get(account) {
                for coupon in portfolio.coupons.values() {
                    prop_assert!(coupon.shares > 0);
                }
            }
        }
    }

    /// Total yes shares outstanding always equals total no shares
    /// outstanding on one instrument: every trade mints exactly one of each.
    #[test]
    fn yes_and_no_shares_stay_balanced(
        ops in prop::collection::vec((account_strategy(), side_strategy(), price_strategy(), shares_strategy()), 1..30),
    ) {
        let mut e = engine_with_accounts();
        for (idx, side, price, shares) in ops {
            let order = Order::new(ACCOUNTS[idx].into(), side, "c".into(), price, shares, 0).unwrap();
            e.place(order).unwrap();
        }

        let mut yes_total = 0i64;
        let mut no_total = 0i64;
        for account in ACCOUNTS {
            if let Ok(portfolio) = e.positions.get(account) {
                if let Some(coupon) = portfolio.coupons.get("c") {
                    match coupon.side {
                        claimbook::CouponSide::Yes => yes_total += coupon.shares,
                        claimbook::CouponSide::No => no_total += coupon.shares,
                    }
                }
            }
        }
        prop_assert_eq!(yes_total, no_total);
    }

    /// `Σ cash + PAYOUT × Σ yes_shares` is conserved at `accounts × INITIAL_CASH`:
    /// every trade transfers cash between two accounts and mints exactly one
    /// yes coupon and one no coupon of equal size, so this sum never moves.
    #[test]
    fn cash_plus_yes_payout_value_is_conserved(
        ops in prop::collection::vec((account_strategy(), side_strategy(), price_strategy(), shares_strategy()), 1..30),
    ) {
        let mut e = engine_with_accounts();
        for (idx, side, price, shares) in ops {
            let order = Order::new(ACCOUNTS[idx].into(), side, "c".into(), price, shares, 0).unwrap();
            e.place(order).unwrap();
        }

        let mut total = 0i64;
        for account in ACCOUNTS {
            let portfolio = e.positions.get(account).unwrap();
            total += portfolio.cash_balance;
            if let Some(coupon) = portfolio.coupons.get("c") {
                if coupon.side == claimbook::CouponSide::Yes {
                    total += PAYOUT * coupon.shares;
                }
            }
        }
        prop_assert_eq!(total, INITIAL_CASH * ACCOUNTS.len() as i64);
    }
}
