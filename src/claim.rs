//! Claims (C7): the yes/no questions traded as instruments, their
//! approval/expiry lifecycle, and resolution marker.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::error::{CoreError, CoreResult};
use crate::side::CouponSide;
use crate::types::{AccountId, InstrumentId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Claim {
    pub name: InstrumentId,
    pub expires: NaiveDate,
    pub desc: String,
    pub creator: AccountId,
    pub approved: bool,
    pub result: Option<CouponSide>,
    pub created: NaiveDate,
}

impl Claim {
    /// Rejects an expiration that is not strictly after `today`.
    pub fn new(
        name: InstrumentId,
        expires: NaiveDate,
        desc: String,
        creator: AccountId,
        today: NaiveDate,
    ) -> CoreResult<Self> {
        if expires <= today {
            return Err(CoreError::Expired(format!(
                "expiration {expires} must be strictly after {today}"
            )));
        }
        Ok(Self { name, expires, desc, creator, approved: false, result: None, created: today })
    }

    pub fn approve(&mut self) -> CoreResult<()> {
        if self.approved {
            return Err(CoreError::AlreadyExists(format!("claim {} already approved", self.name)));
        }
        self.approved = true;
        Ok(())
    }

    pub fn expired(&self, today: NaiveDate) -> bool {
        self.expires <= today
    }

    /// Resolves the claim. Per the original source this also pins
    /// `expires` to `today`, so subsequent `expired` checks stay stable
    /// once a claim is judged — preserved deliberately.
    pub fn resolve(&mut self, result: CouponSide, today: NaiveDate) {
        self.result = Some(result);
        self.expires = today;
    }
}

#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Claims {
    by_name: FxHashMap<InstrumentId, Claim>,
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, claim: Claim) -> CoreResult<()> {
        if self.by_name.contains_key(&claim.name) {
            return Err(CoreError::AlreadyExists(format!("claim {} already exists", claim.name)));
        }
        self.by_name.insert(claim.name.clone(), claim);
        Ok(())
    }

    pub fn get(&self, name: &str) -> CoreResult<&Claim> {
        self.by_name.get(name).ok_or_else(|| CoreError::NotFound(format!("no claim named {name}")))
    }

    pub fn get_mut(&mut self, name: &str) -> CoreResult<&mut Claim> {
        self.by_name
            .get_mut(name)
            .ok_or_else(|| CoreError::NotFound(format!("no claim named {name}")))
    }

    /// Approved, unexpired claims sorted by expiration (soonest first).
    pub fn open(&self, today: NaiveDate) -> Vec<&Claim> {
        let mut claims: Vec<&Claim> =
            self.by_name.values().filter(|c| c.approved && !c.expired(today)).collect();
        claims.sort_by_key(|c| c.expires);
        claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_non_future_expiration() {
        let today = date(2026, 1, 1);
        assert!(Claim::new("c".into(), today, "d".into(), "u".into(), today).is_err());
        assert!(Claim::new("c".into(), date(2025, 12, 31), "d".into(), "u".into(), today).is_err());
    }

    #[test]
    fn double_approve_rejected() {
        let today = date(2026, 1, 1);
        let mut c = Claim::new("c".into(), date(2026, 2, 1), "d".into(), "u".into(), today).unwrap();
        c.approve().unwrap();
        assert!(c.approve().is_err());
    }

    #[test]
    fn resolve_pins_expiry_to_today() {
        let today = date(2026, 1, 1);
        let mut c = Claim::new("c".into(), date(2026, 6, 1), "d".into(), "u".into(), today).unwrap();
        c.resolve(CouponSide::Yes, today);
        assert_eq!(c.expires, today);
        assert!(c.expired(today));
        assert_eq!(c.result, Some(CouponSide::Yes));
    }

    #[test]
    fn claims_add_rejects_duplicate_name() {
        let today = date(2026, 1, 1);
        let mut claims = Claims::new();
        claims.add(Claim::new("c".into(), date(2026, 2, 1), "d".into(), "u".into(), today).unwrap()).unwrap();
        let dup = Claim::new("c".into(), date(2026, 3, 1), "d2".into(), "u".into(), today).unwrap();
        assert!(claims.add(dup).is_err());
    }

    #[test]
    fn open_claims_sorted_by_expiry() {
        let today = date(2026, 1, 1);
        let mut claims = Claims::new();
        let mut a = Claim::new("a".into(), date(2026, 5, 1), "d".into(), "u".into(), today).unwrap();
        a.approve().unwrap();
        let mut b = Claim::new("b".into(), date(2026, 2, 1), "d".into(), "u".into(), today).unwrap();
        b.approve().unwrap();
        claims.add(a).unwrap();
        claims.add(b).unwrap();
        let open = claims.open(today);
        assert_eq!(open.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
