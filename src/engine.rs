//! TradingEngine (C5): the order placement algorithm — self-cancellation,
//! affordability trim, book insertion, and priority-cross settlement.

use crate::coupon::Coupon;
use crate::error::CoreResult;
use crate::order::Order;
use crate::order_book::OrderBook;
use crate::portfolio::Positions;
use crate::side::{CouponSide, Side};
use crate::trade::Trade;
use crate::trades_log::Trades;
use crate::types::{Amount, InstrumentId, Price, Shares, PAYOUT};

/// Outcome of a single `TradingEngine::place` call.
///
/// On an early return from Step 1 (the incoming order was fully absorbed by
/// self-cancellation) or Step 2 (the account cannot afford any shares at
/// this price), only `cancelled_shares` and `remaining_shares` are
/// meaningful — `trades`, `cash_delta`, and the coupon fields stay at their
/// defaults, matching the source placement algorithm's early-return shape.
#[derive(Clone, Debug, Default)]
pub struct PlacementResult {
    /// Shares cancelled out against the account's own resting contrary orders.
    pub cancelled_shares: Shares,
    /// Trades produced by this placement, oldest first.
    pub trades: Vec<Trade>,
    /// Total shares matched against other accounts.
    pub shares_exchanged: Shares,
    /// Shares still resting in the book from this placement, after matching.
    pub remaining_shares: Shares,
    /// Net change in the poster's cash balance.
    pub cash_delta: Amount,
    /// The poster's coupon on this instrument before placement, if any.
    pub old_coupon: Option<(CouponSide, Shares)>,
    /// The poster's coupon on this instrument after placement, if any.
    pub new_coupon: Option<(CouponSide, Shares)>,
    /// Shares neither cancelled, matched, nor posted — the affordability
    /// trim's bite, measured against the quantity that survived Step 1.
    pub residual: Shares,
}

#[derive(Clone, Debug, Default)]
pub struct TradingEngine {
    pub order_book: OrderBook,
    pub positions: Positions,
    pub trades: Trades,
}

impl TradingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `order`: cancels the poster's own crossing resting orders,
    /// trims the remainder to what the poster can afford, inserts it, and
    /// settles every resulting priority cross.
    pub fn place(&mut self, mut order: Order) -> CoreResult<PlacementResult> {
        let mut result = PlacementResult::default();
        let account_id = order.account_id.clone();
        let instrument_id = order.instrument_id.clone();

        let cash_before = self.positions.get(&account_id)?.cash_balance;
        let old_coupon = self
            .positions
            .get(&account_id)?
            .coupons
            .get(&instrument_id)
            .map(|c| (c.side, c.shares));
        result.old_coupon = old_coupon;

        // Step 1: cancel the poster's own resting orders that this order
        // would otherwise cross, newest first.
        let contrary_ranks = self
            .order_book
            .instrument(&instrument_id)
            .map(|book| book.contrary_ranks(&order))
            .unwrap_or_default();
        for rank in contrary_ranks {
            let resting = self
                .order_book
                .instrument(&instrument_id)
                .and_then(|book| book.get(rank))
                .expect("contrary rank points at a live order")
                .clone();
            match resting.num_shares.cmp(&order.num_shares) {
                std::cmp::Ordering::Greater => {
                    self.order_book.remove_shares(&instrument_id, rank, order.num_shares)?;
                    result.cancelled_shares += order.num_shares;
                    result.remaining_shares = 0;
                    return Ok(result);
                }
                std::cmp::Ordering::Equal => {
                    self.order_book.remove_order(&instrument_id, rank)?;
                    result.cancelled_shares += order.num_shares;
                    result.remaining_shares = 0;
                    return Ok(result);
                }
                std::cmp::Ordering::Less => {
                    self.order_book.remove_order(&instrument_id, rank)?;
                    result.cancelled_shares += resting.num_shares;
                    order.num_shares -= resting.num_shares;
                }
            }
        }
        if order.num_shares <= 0 {
            result.remaining_shares = 0;
            return Ok(result);
        }

        // Step 2: trim to what the poster can afford.
        let shares_after_cancellation = order.num_shares;
        let portfolio = self.positions.get(&account_id)?;
        let risk = self.order_book.risk_for(&account_id).cloned().unwrap_or_default();
        let afford = portfolio.afford(&risk, &order);
        if afford <= 0 {
            result.remaining_shares = shares_after_cancellation;
            return Ok(result);
        }
        order.num_shares = afford.min(shares_after_cancellation);
        let posted_shares = order.num_shares;

        // Step 3: insert, then settle every priority cross it creates.
        self.order_book.add_order(order);
        while let Some((resting_rank, incoming_rank)) = self.order_book.priority_cross(&instrument_id)? {
            let trade = self.settle_cross(&instrument_id, resting_rank, incoming_rank)?;
            result.shares_exchanged += trade.num_shares;
            result.trades.push(trade);
        }

        // Step 4: finalize.
        let portfolio = self.positions.get(&account_id)?;
        result.cash_delta = portfolio.cash_balance - cash_before;
        result.new_coupon = portfolio.coupons.get(&instrument_id).map(|c| (c.side, c.shares));
        // What's still resting is exactly the posted quantity minus what
        // matched; the affordability trim's unfilled remainder never
        // touched the book at all.
        result.remaining_shares = posted_shares - result.shares_exchanged;
        result.residual = shares_after_cancellation - result.shares_exchanged;
        Ok(result)
    }

    /// Settles one priority cross between `resting_rank` (lower rank, sets
    /// the trade price) and `incoming_rank` (higher rank, receives whatever
    /// price improvement the resting order's price affords).
    fn settle_cross(
        &mut self,
        instrument_id: &InstrumentId,
        resting_rank: crate::types::Rank,
        incoming_rank: crate::types::Rank,
    ) -> CoreResult<Trade> {
        let resting = self
            .order_book
            .instrument(instrument_id)
            .and_then(|b| b.get(resting_rank))
            .expect("priority_cross returned a live resting rank")
            .clone();
        let incoming = self
            .order_book
            .instrument(instrument_id)
            .and_then(|b| b.get(incoming_rank))
            .expect("priority_cross returned a live incoming rank")
            .clone();
        let shares = resting.num_shares.min(incoming.num_shares);

        self.order_book.remove_shares(instrument_id, resting_rank, shares)?;
        self.order_book.remove_shares(instrument_id, incoming_rank, shares)?;

        let resting_cost = match resting.side {
            Side::Bid => resting.price.0,
            Side::Ask => resting.price.complement().0,
        };
        let incoming_cost = Price::MAX_UNIT - resting_cost;

        self.positions.get_mut(&resting.account_id)?.add_coupon(
            Coupon::new(instrument_id.clone(), shares, resting.side.coupon_side()),
            resting_cost,
        );
        self.positions.get_mut(&incoming.account_id)?.add_coupon(
            Coupon::new(instrument_id.clone(), shares, incoming.side.coupon_side()),
            incoming_cost,
        );

        let (buy_account_id, sell_account_id) = match resting.side {
            Side::Bid => (resting.account_id.clone(), incoming.account_id.clone()),
            Side::Ask => (incoming.account_id.clone(), resting.account_id.clone()),
        };
        let trade = Trade::new(
            buy_account_id,
            sell_account_id,
            instrument_id.clone(),
            resting.price,
            shares,
            resting.timestamp.max(incoming.timestamp),
        );
        self.trades.add_trade(trade.clone());
        Ok(trade)
    }

    /// Resolves a judged claim on `instrument_id`: cancels every resting
    /// order on it (asks first, then bids, matching the source judging
    /// routine's order), pays out `PAYOUT` per share to every coupon on the
    /// winning `result` side, and deletes every coupon on the instrument
    /// regardless of side.
    pub fn resolve_claim(&mut self, instrument_id: &InstrumentId, result: CouponSide) -> CoreResult<()> {
        for rank in self.order_book.ranks_on_side(instrument_id, Side::Ask) {
            self.order_book.remove_order(instrument_id, rank)?;
        }
        for rank in self.order_book.ranks_on_side(instrument_id, Side::Bid) {
            self.order_book.remove_order(instrument_id, rank)?;
        }
        for portfolio in self.positions.portfolios.values_mut() {
            if let Some(coupon) = portfolio.coupons.get(instrument_id) {
                if coupon.side == result {
                    portfolio.cash_balance += PAYOUT * coupon.shares;
                }
                portfolio.coupons.remove(instrument_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn mkorder(account: &str, side: Side, price: i64, shares: i64, ts: u64) -> Order {
        Order::new(account.into(), side, "c1".into(), Price(price), shares, ts).unwrap()
    }

    fn engine_with(accounts: &[&str]) -> TradingEngine {
        let mut e = TradingEngine::new();
        for a in accounts {
            e.positions.register((*a).to_string()).unwrap();
        }
        e
    }

    /// Scenario 1: resting bid@30 (u1) crosses an incoming ask@29 (u2) for 4
    /// shares; the trade settles at the resting price, 30.
    #[test]
    fn settles_at_resting_price() {
        let mut e = engine_with(&["u1", "u2"]);
        e.place(mkorder("u1", Side::Bid, 3000, 4, 0)).unwrap();
        let result = e.place(mkorder("u2", Side::Ask, 2900, 4, 1)).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, Price(3000));
        assert_eq!(result.shares_exchanged, 4);
        assert_eq!(result.cash_delta, -(70 * 100 * 4));
        assert_eq!(e.positions.get("u1").unwrap().cash_balance - crate::types::INITIAL_CASH, -12_000);
    }

    #[test]
    fn self_crossing_order_cancels_instead_of_matching() {
        let mut e = engine_with(&["u1"]);
        e.place(mkorder("u1", Side::Bid, 3000, 4, 0)).unwrap();
        let result = e.place(mkorder("u1", Side::Ask, 2900, 4, 1)).unwrap();
        assert_eq!(result.cancelled_shares, 4);
        assert_eq!(result.trades.len(), 0);
        assert!(e.order_book.instrument("c1").unwrap().best_bid().is_none());
    }

    #[test]
    fn partial_self_cancellation_shrinks_resting_order() {
        let mut e = engine_with(&["u1"]);
        e.place(mkorder("u1", Side::Bid, 3000, 10, 0)).unwrap();
        let result = e.place(mkorder("u1", Side::Ask, 2900, 4, 1)).unwrap();
        assert_eq!(result.cancelled_shares, 4);
        assert_eq!(e.order_book.instrument("c1").unwrap().best_bid().unwrap().num_shares, 6);
    }

    #[test]
    fn unaffordable_order_is_rejected_without_posting() {
        let mut e = engine_with(&["u1"]);
        // Exhaust u1's cash via a cheap ask (costs 1.00/share), then a
        // second order priced so the remaining cash affords zero shares.
        e.place(mkorder("u1", Side::Ask, 9900, 2_000_000, 0)).unwrap();
        let result = e.place(mkorder("u1", Side::Bid, 1, 5, 1)).unwrap();
        assert_eq!(result.trades.len(), 0);
        assert_eq!(result.remaining_shares, 5);
        assert!(e.order_book.instrument("c1").unwrap().best_ask().is_some());
    }

    #[test]
    fn residual_is_requested_minus_matched_when_nothing_is_cancelled() {
        let mut e = engine_with(&["u1", "u2"]);
        e.place(mkorder("u1", Side::Bid, 5000, 10, 0)).unwrap();
        let result = e.place(mkorder("u2", Side::Ask, 4000, 15, 1)).unwrap();
        assert_eq!(result.shares_exchanged, 10);
        assert_eq!(result.residual, 5);
        assert_eq!(result.remaining_shares, 5);
    }
}
