//! Users (C8): opaque-identity registration and confirmation.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::AccountId;

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct User {
    pub account_id: AccountId,
    pub confirmed: bool,
    pub registered: NaiveDate,
    pub confirmed_by: Option<AccountId>,
}

impl User {
    pub fn new(account_id: AccountId, registered: NaiveDate) -> Self {
        Self { account_id, confirmed: false, registered, confirmed_by: None }
    }

    /// Records `by` as having confirmed this user. Idempotent double
    /// confirmation is rejected; the caller is responsible for checking
    /// that `by` is actually an owner before calling this.
    pub fn confirm(&mut self, by: AccountId) -> CoreResult<()> {
        if self.confirmed {
            return Err(CoreError::AlreadyExists(format!(
                "{} is already confirmed",
                self.account_id
            )));
        }
        self.confirmed = true;
        self.confirmed_by = Some(by);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Users {
    by_id: FxHashMap<AccountId, User>,
}

impl Users {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, account_id: AccountId, today: NaiveDate) -> CoreResult<&User> {
        if self.by_id.contains_key(&account_id) {
            return Err(CoreError::AlreadyExists(format!("{account_id} already registered")));
        }
        self.by_id.insert(account_id.clone(), User::new(account_id.clone(), today));
        Ok(self.by_id.get(&account_id).expect("just inserted"))
    }

    pub fn confirm(&mut self, account_id: &str, by: AccountId) -> CoreResult<()> {
        self.get_mut(account_id)?.confirm(by)
    }

    pub fn get(&self, account_id: &str) -> CoreResult<&User> {
        self.by_id
            .get(account_id)
            .ok_or_else(|| CoreError::NotFound(format!("no user {account_id}")))
    }

    pub fn get_mut(&mut self, account_id: &str) -> CoreResult<&mut User> {
        self.by_id
            .get_mut(account_id)
            .ok_or_else(|| CoreError::NotFound(format!("no user {account_id}")))
    }

    pub fn is_registered_and_confirmed(&self, account_id: &str) -> bool {
        self.by_id.get(account_id).is_some_and(|u| u.confirmed)
    }

    pub fn values(&self) -> impl Iterator<Item = &User> {
        self.by_id.values()
    }
}
