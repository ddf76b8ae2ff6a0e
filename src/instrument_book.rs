//! InstrumentBook (C2): the sorted bid/ask sides for a single instrument,
//! rank assignment, and priority-cross discovery.
//!
//! Orders live by value in a single arena (`orders`) keyed by their
//! per-instrument `Rank`, per the cyclic-state-hazard guidance: the two
//! sorted indexes below store only `(sort key) -> Rank` associations and
//! never duplicate the order itself.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::order::Order;
use crate::side::Side;
use crate::types::{Price, Rank, Shares};

/// Bid key: ascending by price, then by `Reverse(rank)` so that, for equal
/// price, the smallest rank (oldest order) sorts last. `next_back()` over
/// this map therefore yields the best bid (highest price, oldest at a tie).
type BidKey = (Price, Reverse<Rank>);
/// Ask key: ascending by `Reverse(price)` (i.e. descending price), then by
/// `Reverse(rank)`. `next_back()` yields the best ask (lowest price, oldest
/// at a tie).
type AskKey = (Reverse<Price>, Reverse<Rank>);

#[derive(Clone, Debug, Default)]
pub struct InstrumentBook {
    orders: HashMap<Rank, Order>,
    bids: BTreeMap<BidKey, ()>,
    asks: BTreeMap<AskKey, ()>,
    next_rank: u64,
}

/// A plain snapshot of an `InstrumentBook`, suitable for serialization. The
/// sorted indexes are rebuilt from `orders` on load.
#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct InstrumentBookSnapshot {
    pub orders: Vec<Order>,
    pub next_rank: u64,
}

impl InstrumentBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn bid_key(order: &Order) -> BidKey {
        (order.price, Reverse(order.rank.expect("resting order has rank")))
    }

    fn ask_key(order: &Order) -> AskKey {
        (Reverse(order.price), Reverse(order.rank.expect("resting order has rank")))
    }

    /// Inserts `order`, assigning it a fresh rank if it does not have one.
    /// Returns the rank it was (or already is) stored under.
    pub fn add(&mut self, mut order: Order) -> Rank {
        let rank = order.rank.unwrap_or_else(|| {
            let r = Rank(self.next_rank);
            self.next_rank += 1;
            r
        });
        order.rank = Some(rank);
        match order.side {
            Side::Bid => {
                self.bids.insert(Self::bid_key(&order), ());
            }
            Side::Ask => {
                self.asks.insert(Self::ask_key(&order), ());
            }
        }
        self.orders.insert(rank, order);
        rank
    }

    /// Removes and returns the order at `rank`, if present.
    pub fn remove(&mut self, rank: Rank) -> CoreResult<Order> {
        let order = self
            .orders
            .remove(&rank)
            .ok_or_else(|| CoreError::NotFound(format!("no order at rank {rank}")))?;
        match order.side {
            Side::Bid => {
                self.bids.remove(&Self::bid_key(&order));
            }
            Side::Ask => {
                self.asks.remove(&Self::ask_key(&order));
            }
        }
        Ok(order)
    }

    /// Shrinks the order at `rank` by `by` shares. If this empties it, the
    /// order is removed entirely (invariant 1: no zero-share stored orders).
    pub fn remove_shares(&mut self, rank: Rank, by: Shares) -> CoreResult<()> {
        let mut order = self.remove(rank)?;
        order.shrink(by)?;
        if order.num_shares > 0 {
            self.add(order);
        }
        Ok(())
    }

    pub fn get(&self, rank: Rank) -> Option<&Order> {
        self.orders.get(&rank)
    }

    pub fn orders_iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn best_bid(&self) -> Option<&Order> {
        self.bids.keys().next_back().map(|(_, Reverse(rank))| &self.orders[rank])
    }

    pub fn best_ask(&self) -> Option<&Order> {
        self.asks.keys().next_back().map(|(_, Reverse(rank))| &self.orders[rank])
    }

    /// Total shares resting at the best price on `side`, used for `depth`.
    pub fn quantity_at_best(&self, side: Side) -> Shares {
        let best_price = match side {
            Side::Bid => self.best_bid().map(|o| o.price),
            Side::Ask => self.best_ask().map(|o| o.price),
        };
        let Some(best_price) = best_price else {
            return 0;
        };
        self.orders
            .values()
            .filter(|o| o.side == side && o.price == best_price)
            .map(|o| o.num_shares)
            .sum()
    }

    /// Ranks of `incoming`'s poster's resting orders on the opposite side
    /// that would cross it, in reverse insertion order (newest first) —
    /// since rank strictly increases with insertion, this is simply
    /// descending rank order.
    pub fn contrary_ranks(&self, incoming: &Order) -> Vec<Rank> {
        let contrary_side = incoming.side.opposite();
        let mut ranks: Vec<Rank> = self
            .orders
            .values()
            .filter(|o| o.side == contrary_side && incoming.contrary_to(o))
            .map(|o| o.rank.expect("resting order has rank"))
            .collect();
        ranks.sort_by_key(|r| std::cmp::Reverse(*r));
        ranks
    }

    /// The next pair to settle: `(resting_rank, incoming_rank)`, where the
    /// resting order (lower rank, older) sets the trade price and the
    /// incoming order (higher rank, newer) receives whatever price
    /// improvement the resting order's price affords. `None` if the sides
    /// are empty or don't cross.
    pub fn priority_cross(&self) -> CoreResult<Option<(Rank, Rank)>> {
        let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) else {
            return Ok(None);
        };
        if bid.price.0 < ask.price.0 {
            return Ok(None);
        }
        let bid_rank = bid.rank.expect("resting order has rank");
        let ask_rank = ask.rank.expect("resting order has rank");
        match bid_rank.0.cmp(&ask_rank.0) {
            std::cmp::Ordering::Less => Ok(Some((bid_rank, ask_rank))),
            std::cmp::Ordering::Greater => Ok(Some((ask_rank, bid_rank))),
            std::cmp::Ordering::Equal => Err(CoreError::Inconsistent(
                "two orders on the same instrument share a rank".into(),
            )),
        }
    }

    pub fn snapshot(&self) -> InstrumentBookSnapshot {
        let mut orders: Vec<Order> = self.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.rank.map(|r| r.0).unwrap_or(0));
        InstrumentBookSnapshot {
            orders,
            next_rank: self.next_rank,
        }
    }

    pub fn from_snapshot(snapshot: InstrumentBookSnapshot) -> Self {
        let mut book = Self {
            next_rank: snapshot.next_rank,
            ..Self::default()
        };
        for order in snapshot.orders {
            match order.side {
                Side::Bid => {
                    book.bids.insert(Self::bid_key(&order), ());
                }
                Side::Ask => {
                    book.asks.insert(Self::ask_key(&order), ());
                }
            }
            book.orders.insert(order.rank.expect("snapshot order has rank"), order);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(account: &str, side: Side, price: i64, shares: i64) -> Order {
        Order::new(account.into(), side, "claim".into(), Price(price), shares, 0).unwrap()
    }

    #[test]
    fn best_bid_ask_and_no_cross() {
        let mut book = InstrumentBook::new();
        book.add(order("u1", Side::Bid, 3000, 10));
        book.add(order("u2", Side::Ask, 3100, 5));
        assert_eq!(book.best_bid().unwrap().price, Price(3000));
        assert_eq!(book.best_ask().unwrap().price, Price(3100));
        assert!(book.priority_cross().unwrap().is_none());
    }

    #[test]
    fn priority_cross_picks_older_as_resting() {
        let mut book = InstrumentBook::new();
        let bid_rank = book.add(order("u1", Side::Bid, 3000, 10));
        let ask_rank = book.add(order("u2", Side::Ask, 2900, 4));
        let (resting, incoming) = book.priority_cross().unwrap().unwrap();
        assert_eq!(resting, bid_rank);
        assert_eq!(incoming, ask_rank);
    }

    #[test]
    fn tie_break_prefers_oldest_at_best_price() {
        let mut book = InstrumentBook::new();
        let first = book.add(order("u1", Side::Bid, 3000, 10));
        book.add(order("u2", Side::Bid, 3000, 5));
        assert_eq!(book.best_bid().unwrap().rank, Some(first));
    }

    #[test]
    fn remove_shares_deletes_on_zero() {
        let mut book = InstrumentBook::new();
        let rank = book.add(order("u1", Side::Bid, 3000, 4));
        book.remove_shares(rank, 4).unwrap();
        assert!(book.get(rank).is_none());
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn remove_shares_rejects_overdraw() {
        let mut book = InstrumentBook::new();
        let rank = book.add(order("u1", Side::Bid, 3000, 4));
        assert!(book.remove_shares(rank, 5).is_err());
    }

    #[test]
    fn rank_never_collides_after_add_remove_add() {
        let mut book = InstrumentBook::new();
        let r0 = book.add(order("u1", Side::Bid, 3000, 4));
        book.remove(r0).unwrap();
        let r1 = book.add(order("u1", Side::Bid, 3000, 4));
        assert_ne!(r0, r1);
    }

    #[test]
    fn contrary_ranks_reverse_insertion_order() {
        let mut book = InstrumentBook::new();
        book.add(order("u1", Side::Bid, 5000, 5));
        book.add(order("u1", Side::Bid, 5000, 5));
        let incoming = order("u1", Side::Ask, 5000, 3);
        let ranks = book.contrary_ranks(&incoming);
        assert_eq!(ranks, vec![Rank(1), Rank(0)]);
    }

    #[test]
    fn snapshot_round_trip_preserves_best_and_ranks() {
        let mut book = InstrumentBook::new();
        book.add(order("u1", Side::Bid, 3000, 10));
        book.add(order("u2", Side::Ask, 3100, 5));
        let snap = book.snapshot();
        let restored = InstrumentBook::from_snapshot(snap);
        assert_eq!(restored.best_bid().unwrap().price, Price(3000));
        assert_eq!(restored.best_ask().unwrap().price, Price(3100));
        assert_eq!(restored.next_rank, book.next_rank);
    }
}
