use crate::errors::UpsertError;
use crate::metrics_defs::{UPSERT_DURATION, UPSERT_OUTCOME};
use crate::model::{CAUSE_ID, Cause, CauseFields, CauseRequest, Upsert};
use crate::store::{
    AttributeValue, GetItemRequest, Item, KvStore, PutItemRequest, StoreError, UpdateItemRequest,
};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use shared::http::make_json_response;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

const UPDATE_EXPRESSION: &str = "SET cause_desc = :desc, category = :cat, follower_count = :fol";

/// How the update path makes sure the cause exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// Look the cause up, then write. Not atomic: a concurrent write between
    /// the two calls is not detected.
    #[default]
    CheckThenWrite,
    /// Single update guarded by `attribute_exists(cause_id)`.
    Conditional,
}

/// Result of a successful upsert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Upserted {
    Inserted(Cause),
    Updated(Cause),
}

impl Upserted {
    pub fn cause(&self) -> &Cause {
        match self {
            Upserted::Inserted(cause) | Upserted::Updated(cause) => cause,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Upserted::Inserted(_) => "inserted",
            Upserted::Updated(_) => "updated",
        }
    }
}

/// Creates a cause when the request has no `cause_id`, otherwise updates the
/// existing cause with that id.
pub struct CauseUpsertHandler {
    store: Arc<dyn KvStore>,
    table_name: String,
    update_mode: UpdateMode,
}

impl CauseUpsertHandler {
    pub fn new(store: Arc<dyn KvStore>, table_name: impl Into<String>) -> Self {
        CauseUpsertHandler {
            store,
            table_name: table_name.into(),
            update_mode: UpdateMode::default(),
        }
    }

    pub fn with_update_mode(mut self, update_mode: UpdateMode) -> Self {
        self.update_mode = update_mode;
        self
    }

    /// Runs one upsert and renders the outcome as a response.
    ///
    /// Never fails: every error becomes a JSON `{"error": ...}` body with the
    /// matching status code.
    pub async fn handle(&self, request_body: &str) -> Response<Bytes> {
        let start = Instant::now();
        let result = self.upsert(request_body).await;

        let outcome = match &result {
            Ok(upserted) => upserted.outcome(),
            Err(err) => err.outcome(),
        };
        counter!(UPSERT_OUTCOME, "outcome" => outcome).increment(1);
        histogram!(UPSERT_DURATION, "outcome" => outcome).record(start.elapsed().as_secs_f64());

        let response = result.and_then(|upserted| {
            let body = serde_json::to_vec(upserted.cause()).map_err(UpsertError::Serialization)?;
            tracing::info!(
                cause_id = %upserted.cause().cause_id,
                outcome,
                "cause upserted"
            );
            Ok(make_json_response(StatusCode::OK, body))
        });

        response.unwrap_or_else(|err| error_response(&err))
    }

    /// Parses, validates and applies one upsert request.
    pub async fn upsert(&self, request_body: &str) -> Result<Upserted, UpsertError> {
        let request: CauseRequest =
            serde_json::from_str(request_body).map_err(UpsertError::MalformedInput)?;

        match request.validate()? {
            Upsert::Insert(fields) => self.insert_cause(fields).await.map(Upserted::Inserted),
            Upsert::Update(cause) => self.update_cause(cause).await.map(Upserted::Updated),
        }
    }

    /// Writes a new cause under a freshly generated id and returns it.
    async fn insert_cause(&self, fields: CauseFields) -> Result<Cause, UpsertError> {
        let cause = fields.with_id(uuid::Uuid::new_v4().to_string());

        self.store
            .put_item(PutItemRequest {
                table_name: self.table_name.clone(),
                item: cause.to_item(),
            })
            .await?;

        Ok(cause)
    }

    async fn update_cause(&self, cause: Cause) -> Result<Cause, UpsertError> {
        let condition_expression = match self.update_mode {
            UpdateMode::CheckThenWrite => {
                let existing = self
                    .store
                    .get_item(GetItemRequest {
                        table_name: self.table_name.clone(),
                        key: cause.key(),
                    })
                    .await?;
                if existing.is_none() {
                    return Err(UpsertError::NotFound {
                        cause_id: cause.cause_id,
                    });
                }
                None
            }
            UpdateMode::Conditional => Some(format!("attribute_exists({CAUSE_ID})")),
        };

        let request = UpdateItemRequest {
            table_name: self.table_name.clone(),
            key: cause.key(),
            update_expression: UPDATE_EXPRESSION.to_string(),
            condition_expression,
            expression_attribute_values: update_values(&cause),
        };

        match self.store.update_item(request).await {
            Ok(()) => Ok(cause),
            Err(StoreError::ConditionalCheckFailed) => Err(UpsertError::NotFound {
                cause_id: cause.cause_id,
            }),
            Err(err) => Err(err.into()),
        }
    }
}

fn update_values(cause: &Cause) -> Item {
    Item::from([
        (":desc".to_string(), AttributeValue::S(cause.cause_desc.clone())),
        (":cat".to_string(), AttributeValue::S(cause.category.clone())),
        (
            ":fol".to_string(),
            AttributeValue::N(cause.follower_count.to_string()),
        ),
    ])
}

/// Renders an upsert error as `{"error": "<message>"}`.
pub(crate) fn error_response(err: &UpsertError) -> Response<Bytes> {
    match err {
        UpsertError::InvalidInput => tracing::debug!("rejected invalid cause"),
        UpsertError::NotFound { cause_id } => {
            tracing::warn!(cause_id = %cause_id, "cause to update does not exist")
        }
        _ => tracing::error!(error = %err, "unexpected error while upserting cause"),
    }

    let body = serde_json::json!({ "error": err.message() }).to_string();
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = err.status();
    response
}
