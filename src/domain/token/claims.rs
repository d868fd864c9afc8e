//! JWT claims set

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Issuer
pub const ISSUER: &str = "iss";
/// Unique token id
pub const JWT_ID: &str = "jti";
/// Issue time (seconds since the Unix epoch)
pub const ISSUED_AT: &str = "iat";
/// Expiry time (seconds since the Unix epoch)
pub const EXPIRATION: &str = "exp";

/// Claims every minted token carries and every accepted token must contain
pub const REGISTERED_CLAIMS: [&str; 4] = [ISSUER, JWT_ID, ISSUED_AT, EXPIRATION];

/// Unordered mapping from claim name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimsSet(Map<String, Value>);

impl ClaimsSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a claim, replacing any existing value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get_str(ISSUER)
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.get_str(JWT_ID)
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.get_i64(ISSUED_AT)
    }

    pub fn expiration(&self) -> Option<i64> {
        self.get_i64(EXPIRATION)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether every claim of `other` is present here with an equal value
    pub fn contains_all(&self, other: &ClaimsSet) -> bool {
        other.iter().all(|(k, v)| self.get(k) == Some(v))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ClaimsSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ClaimsSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
