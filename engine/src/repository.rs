use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{self, StateError};
use crate::OrderState;

pub const ORDER_ID_LEN: usize = 16;

/// Opaque order id: 16 lowercase hex chars (8 random bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid order id `{0}`")]
pub struct InvalidOrderId(pub String);

impl OrderId {
    pub fn parse(raw: &str) -> Result<Self, InvalidOrderId> {
        let ok = raw.len() == ORDER_ID_LEN && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if ok { Ok(OrderId(raw.to_string())) } else { Err(InvalidOrderId(raw.to_string())) }
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        OrderId(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for OrderId {
    type Error = InvalidOrderId;
    fn try_from(v: String) -> Result<Self, Self::Error> { OrderId::parse(&v) }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self { id.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Corrupt(#[from] StateError),
    #[error("storage failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Where order records live. `save` is a full overwrite: last write wins.
pub trait OrderRepository: Send + Sync {
    fn load(&self, id: &OrderId) -> Result<Option<OrderState>, RepositoryError>;
    fn save(&self, id: &OrderId, state: &OrderState) -> Result<(), RepositoryError>;
}

/// Keeps the encoded record so every load goes through strict decoding.
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<HashMap<OrderId, String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self { Self::default() }

    fn records(&self) -> MutexGuard<'_, HashMap<OrderId, String>> {
        // recover from a poisoned mutex; entries are only ever replaced whole
        match self.records.lock() { Ok(g) => g, Err(e) => e.into_inner() }
    }

    /// Stores raw text as-is, bypassing encoding.
    pub fn insert_raw(&self, id: &OrderId, raw: impl Into<String>) {
        self.records().insert(id.clone(), raw.into());
    }
}

impl OrderRepository for InMemoryRepository {
    fn load(&self, id: &OrderId) -> Result<Option<OrderState>, RepositoryError> {
        let raw = self.records().get(id).cloned();
        match raw {
            Some(raw) => Ok(Some(state::decode(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, id: &OrderId, state: &OrderState) -> Result<(), RepositoryError> {
        let raw = state::encode(state)?;
        self.records().insert(id.clone(), raw);
        Ok(())
    }
}
