use crate::model::{CAUSE_ID, key_for};
use crate::store::{
    GetItemRequest, Item, KvStore, PutItemRequest, StoreError, UpdateItemRequest, parse_condition,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Store double that records every request it receives.
///
/// Lookups answer from the primed ids only; writes are recorded but never
/// change what lookups return.
#[derive(Default)]
pub struct RecordingStore {
    existing: HashMap<String, Item>,
    failure: Option<StoreError>,
    puts: Mutex<Vec<PutItemRequest>>,
    gets: Mutex<Vec<GetItemRequest>>,
    updates: Mutex<Vec<UpdateItemRequest>>,
}

impl RecordingStore {
    pub fn with_existing(mut self, cause_id: &str) -> Self {
        self.existing.insert(cause_id.to_string(), key_for(cause_id));
        self
    }

    /// Every operation fails with `error` after being recorded.
    pub fn failing_with(mut self, error: StoreError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn puts(&self) -> Vec<PutItemRequest> {
        self.puts.lock().clone()
    }

    pub fn gets(&self) -> Vec<GetItemRequest> {
        self.gets.lock().clone()
    }

    pub fn updates(&self) -> Vec<UpdateItemRequest> {
        self.updates.lock().clone()
    }

    fn lookup(&self, key: &Item) -> Option<&Item> {
        key.get(CAUSE_ID)
            .and_then(|id| id.as_s())
            .and_then(|id| self.existing.get(id))
    }

    fn fail(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KvStore for RecordingStore {
    async fn put_item(&self, request: PutItemRequest) -> Result<(), StoreError> {
        self.puts.lock().push(request);
        self.fail()
    }

    async fn get_item(&self, request: GetItemRequest) -> Result<Option<Item>, StoreError> {
        let found = self.lookup(&request.key).cloned();
        self.gets.lock().push(request);
        self.fail()?;
        Ok(found)
    }

    async fn update_item(&self, request: UpdateItemRequest) -> Result<(), StoreError> {
        let condition = request
            .condition_expression
            .as_deref()
            .map(parse_condition)
            .transpose()?;
        let holds = condition.is_none_or(|c| c.holds(self.lookup(&request.key)));
        self.updates.lock().push(request);
        self.fail()?;

        match holds {
            true => Ok(()),
            false => Err(StoreError::ConditionalCheckFailed),
        }
    }
}
