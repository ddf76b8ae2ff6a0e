//! OrderBook (C3): the full set of instruments, plus a per-account risk
//! index used for locked-cash/affordability computations.

use rustc_hash::FxHashMap;

use crate::error::{CoreError, CoreResult};
use crate::instrument_book::{InstrumentBook, InstrumentBookSnapshot};
use crate::order::Order;
use crate::side::Side;
use crate::types::{AccountId, Amount, InstrumentId, Rank};

/// Worst-case cash an account has locked in open orders on one instrument,
/// split by side (a bid locks `price * shares`, an ask locks
/// `(100 - price) * shares`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RiskEntry {
    pub bid: Amount,
    pub ask: Amount,
}

impl RiskEntry {
    fn add(&mut self, side: Side, cost: Amount) {
        match side {
            Side::Bid => self.bid += cost,
            Side::Ask => self.ask += cost,
        }
    }

    fn remove(&mut self, side: Side, cost: Amount) -> CoreResult<()> {
        let slot = match side {
            Side::Bid => &mut self.bid,
            Side::Ask => &mut self.ask,
        };
        if *slot < cost {
            return Err(CoreError::Inconsistent(format!(
                "removing {cost} of risk but only {slot} recorded"
            )));
        }
        *slot -= cost;
        Ok(())
    }
}

pub type Risk = FxHashMap<InstrumentId, RiskEntry>;

#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    instruments: FxHashMap<InstrumentId, InstrumentBook>,
    risk: FxHashMap<AccountId, Risk>,
}

#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct OrderBookSnapshot {
    pub instruments: Vec<(InstrumentId, InstrumentBookSnapshot)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn instrument_mut(&mut self, instrument_id: &str) -> &mut InstrumentBook {
        self.instruments.entry(instrument_id.to_string()).or_default()
    }

    pub fn instrument(&self, instrument_id: &str) -> Option<&InstrumentBook> {
        self.instruments.get(instrument_id)
    }

    /// Inserts `order`, assigning it a rank and crediting its cost to the
    /// poster's risk index. Returns the assigned rank.
    pub fn add_order(&mut self, order: Order) -> Rank {
        let cost = order.cost();
        let account_id = order.account_id.clone();
        let instrument_id = order.instrument_id.clone();
        let side = order.side;
        let rank = self.instrument_mut(&instrument_id).add(order);
        self.risk
            .entry(account_id)
            .or_default()
            .entry(instrument_id)
            .or_default()
            .add(side, cost);
        rank
    }

    /// Removes the order at `rank` on `instrument_id`, debiting its cost from
    /// the poster's risk index.
    pub fn remove_order(&mut self, instrument_id: &str, rank: Rank) -> CoreResult<Order> {
        let book = self
            .instruments
            .get_mut(instrument_id)
            .ok_or_else(|| CoreError::NotFound(format!("no such instrument {instrument_id}")))?;
        let order = book.remove(rank)?;
        self.debit_risk(&order.account_id, instrument_id, order.side, order.cost())?;
        Ok(order)
    }

    /// Shrinks the order at `rank` on `instrument_id` by `by` shares,
    /// debiting the corresponding cost from the poster's risk index.
    pub fn remove_shares(&mut self, instrument_id: &str, rank: Rank, by: i64) -> CoreResult<()> {
        let book = self
            .instruments
            .get_mut(instrument_id)
            .ok_or_else(|| CoreError::NotFound(format!("no such instrument {instrument_id}")))?;
        let order = book.get(rank).cloned().ok_or_else(|| {
            CoreError::NotFound(format!("no order at rank {rank} on {instrument_id}"))
        })?;
        let per_share = order.cost() / order.num_shares;
        book.remove_shares(rank, by)?;
        self.debit_risk(&order.account_id, instrument_id, order.side, per_share * by)
    }

    fn debit_risk(
        &mut self,
        account_id: &str,
        instrument_id: &str,
        side: Side,
        cost: Amount,
    ) -> CoreResult<()> {
        let entry = self
            .risk
            .get_mut(account_id)
            .and_then(|by_instrument| by_instrument.get_mut(instrument_id))
            .ok_or_else(|| {
                CoreError::Inconsistent(format!("no risk recorded for {account_id} on {instrument_id}"))
            })?;
        entry.remove(side, cost)
    }

    pub fn risk_for(&self, account_id: &str) -> Option<&Risk> {
        self.risk.get(account_id)
    }

    /// All open orders belonging to `account_id`, across every instrument.
    pub fn orders_for_account(&self, account_id: &str) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .instruments
            .values()
            .flat_map(|book| book.orders_iter())
            .filter(|o| o.account_id == account_id)
            .collect();
        orders.sort_by_key(|o| (o.instrument_id.clone(), o.rank.map(|r| r.0)));
        orders
    }

    /// All open orders on `instrument_id` on `side`, in descending rank
    /// order (newest first) — used by claim resolution to cancel a side.
    pub fn ranks_on_side(&self, instrument_id: &str, side: Side) -> Vec<Rank> {
        let Some(book) = self.instruments.get(instrument_id) else {
            return Vec::new();
        };
        let mut ranks: Vec<Rank> = book
            .orders_iter()
            .filter(|o| o.side == side)
            .map(|o| o.rank.expect("resting order has rank"))
            .collect();
        ranks.sort_by_key(|r| std::cmp::Reverse(*r));
        ranks
    }

    pub fn priority_cross(&self, instrument_id: &str) -> CoreResult<Option<(Rank, Rank)>> {
        match self.instruments.get(instrument_id) {
            Some(book) => book.priority_cross(),
            None => Ok(None),
        }
    }

    pub fn quantity_at_best(&self, instrument_id: &str, side: Side) -> i64 {
        self.instruments
            .get(instrument_id)
            .map(|book| book.quantity_at_best(side))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> OrderBookSnapshot {
        let mut instruments: Vec<_> = self
            .instruments
            .iter()
            .map(|(id, book)| (id.clone(), book.snapshot()))
            .collect();
        instruments.sort_by(|a, b| a.0.cmp(&b.0));
        OrderBookSnapshot { instruments }
    }

    /// Rebuilds an `OrderBook` from a snapshot, recomputing the risk index
    /// from the restored orders rather than persisting it separately.
    pub fn from_snapshot(snapshot: OrderBookSnapshot) -> Self {
        let mut order_book = Self::default();
        for (instrument_id, book_snapshot) in snapshot.instruments {
            let book = InstrumentBook::from_snapshot(book_snapshot);
            for order in book.orders_iter() {
                order_book
                    .risk
                    .entry(order.account_id.clone())
                    .or_default()
                    .entry(instrument_id.clone())
                    .or_default()
                    .add(order.side, order.cost());
            }
            order_book.instruments.insert(instrument_id, book);
        }
        order_book
    }
}
