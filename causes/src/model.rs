use crate::errors::UpsertError;
use crate::store::{AttributeValue, Item};
use serde::{Deserialize, Serialize};

/// Primary key attribute of the causes table.
pub const CAUSE_ID: &str = "cause_id";
pub const CATEGORY: &str = "category";
pub const CAUSE_DESC: &str = "cause_desc";
pub const FOLLOWER_COUNT: &str = "follower_count";

/// Request body accepted by the upsert endpoint.
///
/// Example request (insert, no `cause_id`):
/// ```json
/// {
///   "cause_desc": "Environmental",
///   "category": "Environment",
///   "follower_count": 0
/// }
/// ```
///
/// Every field is optional at the wire level so that validation, not
/// deserialization, decides what a bad request is.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CauseRequest {
    #[serde(default)]
    pub cause_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cause_desc: Option<String>,
    #[serde(default)]
    pub follower_count: Option<i64>,
}

/// The mutable part of a cause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CauseFields {
    pub category: String,
    pub cause_desc: String,
    pub follower_count: u64,
}

impl CauseFields {
    pub fn with_id(self, cause_id: String) -> Cause {
        Cause {
            cause_id,
            category: self.category,
            cause_desc: self.cause_desc,
            follower_count: self.follower_count,
        }
    }
}

/// A validated cause, as stored and as returned to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub cause_id: String,
    pub category: String,
    pub cause_desc: String,
    pub follower_count: u64,
}

impl Cause {
    /// Full attribute map written on insert.
    pub fn to_item(&self) -> Item {
        Item::from([
            (CAUSE_ID.to_string(), AttributeValue::S(self.cause_id.clone())),
            (CATEGORY.to_string(), AttributeValue::S(self.category.clone())),
            (
                CAUSE_DESC.to_string(),
                AttributeValue::S(self.cause_desc.clone()),
            ),
            (
                FOLLOWER_COUNT.to_string(),
                AttributeValue::N(self.follower_count.to_string()),
            ),
        ])
    }

    pub fn key(&self) -> Item {
        key_for(&self.cause_id)
    }
}

pub fn key_for(cause_id: &str) -> Item {
    Item::from([(CAUSE_ID.to_string(), AttributeValue::S(cause_id.to_string()))])
}

/// What a valid request asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Upsert {
    Insert(CauseFields),
    Update(Cause),
}

impl CauseRequest {
    /// A request is valid iff `cause_desc` is non-empty and `follower_count`
    /// is not negative. The presence of `cause_id` selects insert or update.
    pub fn validate(self) -> Result<Upsert, UpsertError> {
        let cause_desc = match self.cause_desc {
            Some(desc) if !desc.is_empty() => desc,
            _ => return Err(UpsertError::InvalidInput),
        };
        let follower_count =
            u64::try_from(self.follower_count.unwrap_or(0)).map_err(|_| UpsertError::InvalidInput)?;

        let fields = CauseFields {
            category: self.category.unwrap_or_default(),
            cause_desc,
            follower_count,
        };

        Ok(match self.cause_id {
            None => Upsert::Insert(fields),
            Some(cause_id) => Upsert::Update(fields.with_id(cause_id)),
        })
    }
}
