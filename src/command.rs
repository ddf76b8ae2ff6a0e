//! Command dispatcher (C9): parses a command name, string args, and caller
//! identity into a call against the trading core, claims, and users,
//! enforcing owner/registration guards and producing a response string.

use chrono::NaiveDate;
use log::info;

use crate::claim::{Claim, Claims};
use crate::config::Config;
use crate::engine::TradingEngine;
use crate::error::{CoreError, CoreResult};
use crate::order::Order;
use crate::side::{CouponSide, Side};
use crate::types::{AccountId, Price};
use crate::user::Users;

pub struct State {
    pub engine: TradingEngine,
    pub users: Users,
    pub claims: Claims,
}

impl State {
    pub fn new() -> Self {
        Self { engine: TradingEngine::new(), users: Users::new(), claims: Claims::new() }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn require_owner(config: &Config, caller: &str) -> CoreResult<()> {
    if !config.is_owner(caller) {
        return Err(CoreError::Unauthorized(format!("{caller} is not an owner")));
    }
    Ok(())
}

fn require_registered_confirmed(users: &Users, caller: &str) -> CoreResult<()> {
    if !users.is_registered_and_confirmed(caller) {
        return Err(CoreError::Unauthorized(format!("{caller} is not a confirmed user")));
    }
    Ok(())
}

fn parse_price(s: &str) -> CoreResult<Price> {
    let value: f64 = s
        .parse()
        .map_err(|_| CoreError::InvalidOrder(format!("not a price: {s}")))?;
    Ok(Price((value * Price::SCALE as f64).round() as i64))
}

fn parse_shares(s: &str) -> CoreResult<i64> {
    s.parse().map_err(|_| CoreError::InvalidQuantity(format!("not a quantity: {s}")))
}

fn parse_date(s: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidOrder(format!("not a date (yyyy-mm-dd): {s}")))
}

fn parse_coupon_side(s: &str) -> CoreResult<CouponSide> {
    match s {
        "y" => Ok(CouponSide::Yes),
        "n" => Ok(CouponSide::No),
        other => Err(CoreError::InvalidOrder(format!("expected y or n, got {other}"))),
    }
}

/// Minimal shell-glob matcher (`*` and `?`) for `gcancel`, with no crate in
/// the surrounding pack grounding a glob/regex dependency for this.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn go(pattern: &[u8], text: &[u8]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some(b'*'), _) => go(&pattern[1..], text) || (!text.is_empty() && go(pattern, &text[1..])),
            (Some(b'?'), Some(_)) => go(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if p == t => go(&pattern[1..], &text[1..]),
            _ => false,
        }
    }
    go(pattern.as_bytes(), text.as_bytes())
}

pub fn dispatch(
    state: &mut State,
    config: &Config,
    command: &str,
    args: &[String],
    caller: &AccountId,
    today: NaiveDate,
) -> CoreResult<String> {
    match command {
        "register" => {
            state.users.register(caller.clone(), today)?;
            state.engine.positions.register(caller.clone()).ok();
            Ok(format!("{caller} registered"))
        }
        "confirm" => {
            require_owner(config, caller)?;
            let identity = args.first().ok_or_else(|| CoreError::InvalidOrder("confirm needs an identity".into()))?;
            state.users.confirm(identity, caller.clone())?;
            Ok(format!("{identity} confirmed by {caller}"))
        }
        "create" => {
            require_registered_confirmed(&state.users, caller)?;
            let name = args.first().ok_or_else(|| CoreError::InvalidOrder("create needs a name".into()))?;
            let expires = parse_date(args.get(1).ok_or_else(|| CoreError::InvalidOrder("create needs an expiration".into()))?)?;
            let desc = args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
            let claim = Claim::new(name.clone(), expires, desc, caller.clone(), today)?;
            state.claims.add(claim)?;
            Ok(format!("created claim {name}, unapproved, expires {expires}"))
        }
        "approve" => {
            require_owner(config, caller)?;
            let name = args.first().ok_or_else(|| CoreError::InvalidOrder("approve needs a claim name".into()))?;
            state.claims.get_mut(name)?.approve()?;
            Ok(format!("approved {name}"))
        }
        "judge" => {
            require_owner(config, caller)?;
            let name = args.first().ok_or_else(|| CoreError::InvalidOrder("judge needs a claim name".into()))?;
            let result = parse_coupon_side(args.get(1).ok_or_else(|| CoreError::InvalidOrder("judge needs y or n".into()))?)?;
            state.engine.resolve_claim(name, result)?;
            state.claims.get_mut(name)?.resolve(result, today);
            info!("claim {name} judged {result}");
            Ok(format!("{name} judged {result}"))
        }
        "buy" | "sell" => {
            require_registered_confirmed(&state.users, caller)?;
            dispatch_buy(state, caller, args, today, command == "sell")
        }
        "cancel" => {
            require_registered_confirmed(&state.users, caller)?;
            let label = args.first().ok_or_else(|| CoreError::InvalidOrder("cancel needs claim#rank".into()))?;
            let (instrument_id, rank) = split_order_label(label)?;
            let order = state
                .engine
                .order_book
                .instrument(&instrument_id)
                .and_then(|b| b.get(rank))
                .ok_or_else(|| CoreError::NotFound(format!("no order {label}")))?;
            if order.account_id != *caller {
                return Err(CoreError::Unauthorized(format!("{label} does not belong to {caller}")));
            }
            state.engine.order_book.remove_order(&instrument_id, rank)?;
            Ok(format!("cancelled {label}"))
        }
        "gcancel" => {
            require_registered_confirmed(&state.users, caller)?;
            let pattern = args.first().ok_or_else(|| CoreError::InvalidOrder("gcancel needs a glob pattern".into()))?;
            let labels: Vec<String> = state
                .engine
                .order_book
                .orders_for_account(caller)
                .iter()
                .map(|o| o.label())
                .filter(|label| glob_match(pattern, label))
                .collect();
            for label in &labels {
                let (instrument_id, rank) = split_order_label(label)?;
                state.engine.order_book.remove_order(&instrument_id, rank)?;
            }
            Ok(format!("cancelled {} orders", labels.len()))
        }
        "orders" => {
            require_registered_confirmed(&state.users, caller)?;
            let orders = state.engine.order_book.orders_for_account(caller);
            if orders.is_empty() {
                return Ok("no open orders".into());
            }
            Ok(orders
                .iter()
                .map(|o| format!("{} {} @{} x{}", o.label(), o.side, o.price, o.num_shares))
                .collect::<Vec<_>>()
                .join(", "))
        }
        "coupons" => {
            let target = args.first().cloned().unwrap_or_else(|| caller.clone());
            let portfolio = state.engine.positions.get(&target)?;
            if portfolio.coupons.is_empty() {
                return Ok(format!("{target}: no coupons"));
            }
            Ok(portfolio
                .coupons
                .iter()
                .map(|(instrument_id, c)| format!("{instrument_id}:{}x{}", c.side, c.shares))
                .collect::<Vec<_>>()
                .join(", "))
        }
        "cash" => {
            let target = args.first().cloned().unwrap_or_else(|| caller.clone());
            let portfolio = state.engine.positions.get(&target)?;
            let default_risk = crate::order_book::Risk::default();
            let risk = state.engine.order_book.risk_for(&target).unwrap_or(&default_risk);
            let locked = portfolio.locked_cash(risk);
            Ok(format!("{target}: {} ({} unlocked)", Price(portfolio.cash_balance), Price(portfolio.cash_balance - locked)))
        }
        "ticker" => {
            let name = args.first().ok_or_else(|| CoreError::InvalidOrder("ticker needs a claim".into()))?;
            ticker(state, name, today)
        }
        "claims" => match args.first() {
            None => {
                let open = state.claims.open(today);
                if open.is_empty() {
                    return Ok("no open claims".into());
                }
                Ok(open.iter().map(|c| format!("{} (expires {})", c.name, c.expires)).collect::<Vec<_>>().join(", "))
            }
            Some(name) => {
                let claim = state.claims.get(name)?;
                Ok(format!("{}: {} (expires {}, created {})", claim.name, claim.desc, claim.expires, claim.created))
            }
        },
        "depth" => {
            let name = args.first().ok_or_else(|| CoreError::InvalidOrder("depth needs a claim".into()))?;
            depth(state, name, today)
        }
        "top" => {
            let mut ranked: Vec<(&str, i64)> = state
                .engine
                .positions
                .portfolios
                .values()
                .map(|p| (p.account_id.as_str(), p.cash_balance))
                .collect();
            ranked.sort_by_key(|r| std::cmp::Reverse(r.1));
            Ok(ranked
                .into_iter()
                .take(5)
                .map(|(account_id, cash)| format!("{account_id}:{}", Price(cash)))
                .collect::<Vec<_>>()
                .join(", "))
        }
        other => Err(CoreError::NotFound(format!("no such command {other}"))),
    }
}

fn dispatch_buy(
    state: &mut State,
    caller: &AccountId,
    args: &[String],
    today: NaiveDate,
    is_sell: bool,
) -> CoreResult<String> {
    let name = args.first().ok_or_else(|| CoreError::InvalidOrder("buy needs a claim".into()))?.clone();
    let mut coupon_side = parse_coupon_side(args.get(1).ok_or_else(|| CoreError::InvalidOrder("buy needs y or n".into()))?)?;
    let mut price = parse_price(args.get(2).ok_or_else(|| CoreError::InvalidOrder("buy needs a price".into()))?)?;
    let shares = parse_shares(args.get(3).ok_or_else(|| CoreError::InvalidOrder("buy needs a quantity".into()))?)?;

    // `sell` is `buy` with the coupon side flipped and the price complemented.
    if is_sell {
        coupon_side = coupon_side.opposite();
        price = price.complement();
    }

    let claim = state.claims.get(&name)?;
    if !claim.approved {
        return Err(CoreError::NotApproved(format!("{name} is not approved")));
    }
    if claim.expired(today) {
        return Err(CoreError::Expired(format!("{name} has expired")));
    }

    let side = match coupon_side {
        CouponSide::Yes => Side::Bid,
        CouponSide::No => Side::Ask,
    };
    let order_price = match coupon_side {
        CouponSide::Yes => price,
        CouponSide::No => price.complement(),
    };
    let order = Order::new(caller.clone(), side, name.clone(), order_price, shares, 0)?;
    let result = state.engine.place(order)?;
    if result.shares_exchanged > 0 {
        info!("{caller} {side} {name} matched {} shares", result.shares_exchanged);
    }
    if result.cancelled_shares > 0 {
        info!("{caller} {name} self-cancelled {} shares", result.cancelled_shares);
    }
    Ok(format!(
        "cancelled {}, matched {}, resting {}",
        result.cancelled_shares, result.shares_exchanged, result.remaining_shares
    ))
}

fn ticker(state: &State, name: &str, today: NaiveDate) -> CoreResult<String> {
    let claim = state.claims.get(name)?;
    let trades = state.engine.trades.get_most_recent(0, Some(name));
    if claim.expired(today) {
        let last = trades.last().ok_or_else(|| CoreError::NotFound(format!("{name} never traded")))?;
        return Ok(format!("{name}: closed, last price {}", last.price));
    }
    let book = state.engine.order_book.instrument(name);
    let best_bid = book.and_then(|b| b.best_bid()).map(|o| o.price);
    let best_ask = book.and_then(|b| b.best_ask()).map(|o| o.price);
    let mut message = format!(
        "{name}: bid {} ask {}",
        best_bid.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
        best_ask.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
    );
    if !trades.is_empty() {
        let total_volume: i64 = trades.iter().map(|t| t.num_shares).sum();
        let unweighted_mean = trades.iter().map(|t| t.price.0).sum::<i64>() / trades.len() as i64;
        let vwap = trades.iter().map(|t| t.price.0 * t.num_shares).sum::<i64>() / total_volume;
        let outstanding_yes: i64 = state
            .engine
            .positions
            .portfolios
            .values()
            .filter_map(|p| p.coupons.get(name))
            .filter(|c| c.side == CouponSide::Yes)
            .map(|c| c.shares)
            .sum();
        message.push_str(&format!(
            ", last {}, volume {total_volume}, mean {}, vwap {}, outstanding yes {outstanding_yes}",
            trades.last().unwrap().price,
            Price(unweighted_mean),
            Price(vwap),
        ));
    }
    Ok(message)
}

fn depth(state: &State, name: &str, today: NaiveDate) -> CoreResult<String> {
    let claim = state.claims.get(name)?;
    if !claim.approved {
        return Err(CoreError::NotApproved(format!("{name} is not approved")));
    }
    if claim.expired(today) {
        return Err(CoreError::Expired(format!("{name} has expired")));
    }
    let book = state
        .engine
        .order_book
        .instrument(name)
        .filter(|b| b.best_bid().is_some() || b.best_ask().is_some())
        .ok_or_else(|| CoreError::NotFound(format!("{name} has no outstanding orders")))?;
    let bid_price = book.best_bid().map(|o| o.price.0).unwrap_or(0);
    let ask_price = book.best_ask().map(|o| o.price.0).unwrap_or(0);
    let bid_depth = bid_price * state.engine.order_book.quantity_at_best(name, Side::Bid);
    let ask_depth = ask_price * state.engine.order_book.quantity_at_best(name, Side::Ask);
    Ok(format!("{name}: Bid depth: {}. Ask depth: {}.", Price(bid_depth), Price(ask_depth)))
}

fn split_order_label(label: &str) -> CoreResult<(String, crate::types::Rank)> {
    let (instrument_id, rank) = label
        .rsplit_once('#')
        .ok_or_else(|| CoreError::InvalidOrder(format!("expected claim#rank, got {label}")))?;
    let rank: u64 = rank
        .parse()
        .map_err(|_| CoreError::InvalidOrder(format!("expected claim#rank, got {label}")))?;
    Ok((instrument_id.to_string(), crate::types::Rank(rank)))
}
