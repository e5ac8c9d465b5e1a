//! Client interface to the key-value store holding causes.
//!
//! The request types mirror the three item operations the upsert needs:
//! an unconditional put, a point lookup and a partial update driven by a
//! `SET` expression with optional condition.

mod dynamodb;
mod expression;
mod memory;

pub use dynamodb::DynamoDbStore;
pub use expression::{Condition, parse_condition, parse_set_expression};
pub use memory::InMemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    /// String attribute
    S(String),
    /// Number attribute, kept as its decimal text
    N(String),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            AttributeValue::N(_) => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            AttributeValue::S(_) => None,
        }
    }
}

pub type Item = HashMap<String, AttributeValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct PutItemRequest {
    pub table_name: String,
    pub item: Item,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetItemRequest {
    pub table_name: String,
    pub key: Item,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateItemRequest {
    pub table_name: String,
    pub key: Item,
    /// e.g. `SET cause_desc = :desc, category = :cat`
    pub update_expression: String,
    /// e.g. `attribute_exists(cause_id)`
    pub condition_expression: Option<String>,
    pub expression_attribute_values: Item,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum StoreError {
    #[error("Requested resource not found: table {0}")]
    TableNotFound(String),

    #[error("The provided key element does not match the schema: {0}")]
    MissingKey(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Expression attribute value is not defined: {0}")]
    MissingValue(String),

    #[error("Unsupported attribute type: {0}")]
    UnsupportedAttribute(String),

    #[error("The conditional request failed")]
    ConditionalCheckFailed,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Operations on the key-value store.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Writes the whole item, replacing any item with the same key.
    async fn put_item(&self, request: PutItemRequest) -> Result<(), StoreError>;

    /// Returns the item stored under the key, if any.
    async fn get_item(&self, request: GetItemRequest) -> Result<Option<Item>, StoreError>;

    /// Applies a `SET` expression to the item stored under the key.
    ///
    /// Without a condition a missing item is created from the key and the
    /// assigned attributes. A condition that does not hold fails with
    /// [`StoreError::ConditionalCheckFailed`] and leaves the item untouched.
    async fn update_item(&self, request: UpdateItemRequest) -> Result<(), StoreError>;
}
