//! Persistence (C10): full-state JSON snapshot/restore, split across two
//! files the way the original bot splits its pickle bundle — one document
//! for users/positions/order book/trades, one for claims.

use std::path::Path;

use crate::claim::Claims;
use crate::error::{CoreError, CoreResult};
use crate::order_book::{OrderBook, OrderBookSnapshot};
use crate::portfolio::Positions;
use crate::trades_log::Trades;
use crate::user::Users;

#[derive(serde::Serialize, serde::Deserialize)]
struct StateBundle {
    users: Users,
    order_book: OrderBookSnapshot,
    positions: Positions,
    trades: Trades,
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> CoreError {
    CoreError::NotFound(format!("{}: {e}", path.display()))
}

/// Saves `users`, `order_book`, `positions`, and `trades` to `path` as one
/// JSON document. Called after every mutating command.
pub fn save_state(
    path: &Path,
    users: &Users,
    order_book: &OrderBook,
    positions: &Positions,
    trades: &Trades,
) -> CoreResult<()> {
    let bundle = StateBundle {
        users: users.clone(),
        order_book: order_book.snapshot(),
        positions: positions.clone(),
        trades: trades.clone(),
    };
    let json = serde_json::to_string_pretty(&bundle)
        .map_err(|e| CoreError::Inconsistent(format!("cannot serialize state: {e}")))?;
    std::fs::write(path, json).map_err(|e| io_err(path, e))
}

/// Loads the bundle at `path`, or empty state if the file does not exist.
pub fn load_state(path: &Path) -> CoreResult<(Users, OrderBook, Positions, Trades)> {
    if !path.exists() {
        return Ok((Users::new(), OrderBook::new(), Positions::new(), Trades::new()));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let bundle: StateBundle = serde_json::from_str(&contents)
        .map_err(|e| CoreError::Inconsistent(format!("malformed state at {}: {e}", path.display())))?;
    let order_book = OrderBook::from_snapshot(bundle.order_book);
    let mut trades = bundle.trades;
    trades.reindex();
    Ok((bundle.users, order_book, bundle.positions, trades))
}

/// Saves `claims` to `path` as a JSON array.
pub fn save_claims(path: &Path, claims: &Claims) -> CoreResult<()> {
    let json = serde_json::to_string_pretty(claims)
        .map_err(|e| CoreError::Inconsistent(format!("cannot serialize claims: {e}")))?;
    std::fs::write(path, json).map_err(|e| io_err(path, e))
}

/// Loads the claims registry at `path`, or an empty one if it doesn't exist.
pub fn load_claims(path: &Path) -> CoreResult<Claims> {
    if !path.exists() {
        return Ok(Claims::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents)
        .map_err(|e| CoreError::Inconsistent(format!("malformed claims at {}: {e}", path.display())))
}
