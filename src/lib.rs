// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # claimbook
//!
//! A deterministic binary prediction-market order book and matching engine:
//! coupons pay out 100 on the winning side of a yes/no claim and 0 on the
//! other, every order is quoted as the price of "yes" exposure, and every
//! fill nets into a single per-account, per-claim coupon position.
//!
//! ## Quick Start
//!
//! ```
//! use claimbook::{CouponSide, Order, Positions, Side, Price, TradingEngine};
//!
//! let mut engine = TradingEngine::new();
//! engine.positions.register("alice".into()).unwrap();
//! engine.positions.register("bob".into()).unwrap();
//!
//! engine.place(Order::new("alice".into(), Side::Bid, "will-it-rain".into(), Price(3000), 4, 0).unwrap()).unwrap();
//! let result = engine.place(Order::new("bob".into(), Side::Ask, "will-it-rain".into(), Price(2900), 4, 1).unwrap()).unwrap();
//!
//! assert_eq!(result.shares_exchanged, 4);
//! assert_eq!(result.trades[0].price, Price(3000));
//! assert_eq!(engine.positions.get("bob").unwrap().coupons["will-it-rain"].side, CouponSide::No);
//! ```
//!
//! ## Price Representation
//!
//! Prices are stored as an [`i64`] in hundredths of a unit, valid in the open
//! interval `(0, 100)`:
//!
//! ```
//! use claimbook::Price;
//!
//! let price = Price(30_00);
//! assert_eq!(format!("{}", price), "30.00");
//! assert_eq!(price.complement(), Price(70_00));
//! ```
//!
//! ## Claim Lifecycle
//!
//! A claim is created unapproved, approved by an owner before it can trade,
//! and judged once to settle every outstanding coupon on it:
//!
//! ```
//! use chrono::NaiveDate;
//! use claimbook::{Claim, Claims, CouponSide};
//!
//! let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//! let expires = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
//! let mut claims = Claims::new();
//! let mut claim = Claim::new("will-it-rain".into(), expires, "rain tomorrow?".into(), "alice".into(), today).unwrap();
//! claim.approve().unwrap();
//! claims.add(claim).unwrap();
//! assert_eq!(claims.open(today).len(), 1);
//! ```

mod claim;
pub mod command;
mod config;
mod coupon;
mod engine;
mod error;
mod instrument_book;
mod order;
mod order_book;
mod persistence;
mod portfolio;
mod side;
mod trade;
mod trades_log;
mod types;
mod user;

pub use claim::{Claim, Claims};
pub use command::{dispatch, State};
pub use config::{BotConfig, Config, LoggingConfig};
pub use coupon::Coupon;
pub use engine::{PlacementResult, TradingEngine};
pub use error::{CoreError, CoreResult};
pub use instrument_book::InstrumentBook;
pub use order::Order;
pub use order_book::{OrderBook, Risk, RiskEntry};
pub use persistence::{load_claims, load_state, save_claims, save_state};
pub use portfolio::{Portfolio, Positions};
pub use side::{CouponSide, Side};
pub use trade::Trade;
pub use trades_log::Trades;
pub use types::{AccountId, Amount, InstrumentId, Price, Rank, Shares, INITIAL_CASH, PAYOUT};
pub use user::{User, Users};
