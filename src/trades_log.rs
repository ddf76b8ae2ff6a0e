//! Trades (C6): the append-only trade tape, indexed by instrument.

use rustc_hash::FxHashMap;

use crate::trade::Trade;
use crate::types::InstrumentId;

#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Trades {
    all: Vec<Trade>,
    #[serde(skip)]
    by_instrument: FxHashMap<InstrumentId, Vec<usize>>,
}

impl Trades {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trade(&mut self, trade: Trade) {
        let idx = self.all.len();
        self.by_instrument.entry(trade.instrument_id.clone()).or_default().push(idx);
        self.all.push(trade);
    }

    pub fn for_instrument(&self, instrument_id: &str) -> Vec<&Trade> {
        self.by_instrument
            .get(instrument_id)
            .map(|idxs| idxs.iter().map(|&i| &self.all[i]).collect())
            .unwrap_or_default()
    }

    /// The last `n` trades, optionally restricted to one instrument.
    /// `n == 0` returns every matching trade, mirroring the original's
    /// list-slice `[-n:]` (Python's `[-0:]` is the whole list).
    pub fn get_most_recent(&self, n: usize, instrument_id: Option<&str>) -> Vec<&Trade> {
        let trades = self.matching(instrument_id);
        if n == 0 {
            trades
        } else {
            let start = trades.len().saturating_sub(n);
            trades[start..].to_vec()
        }
    }

    /// Trades with `from <= timestamp < to`, optionally restricted to one
    /// instrument.
    pub fn get_in_timerange(&self, from: u64, to: u64, instrument_id: Option<&str>) -> Vec<&Trade> {
        self.matching(instrument_id)
            .into_iter()
            .filter(|t| t.timestamp >= from && t.timestamp < to)
            .collect()
    }

    fn matching(&self, instrument_id: Option<&str>) -> Vec<&Trade> {
        match instrument_id {
            Some(id) => self.for_instrument(id),
            None => self.all.iter().collect(),
        }
    }

    /// Rebuilds the instrument index after a snapshot load deserializes
    /// `all` but skips `by_instrument`.
    pub fn reindex(&mut self) {
        self.by_instrument.clear();
        for (idx, trade) in self.all.iter().enumerate() {
            self.by_instrument.entry(trade.instrument_id.clone()).or_default().push(idx);
        }
    }
}
