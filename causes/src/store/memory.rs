use super::expression::{parse_condition, parse_set_expression};
use super::{
    AttributeValue, GetItemRequest, Item, KvStore, PutItemRequest, StoreError, UpdateItemRequest,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

struct Table {
    key_attribute: String,
    items: HashMap<AttributeValue, Item>,
}

impl Table {
    fn key_of(&self, key: &Item) -> Result<AttributeValue, StoreError> {
        if key.len() != 1 {
            return Err(StoreError::MissingKey(format!(
                "expected only `{}`",
                self.key_attribute
            )));
        }
        self.key_value(key)
    }

    fn key_value(&self, item: &Item) -> Result<AttributeValue, StoreError> {
        match item.get(&self.key_attribute) {
            Some(value @ AttributeValue::S(s)) if !s.is_empty() => Ok(value.clone()),
            Some(value @ AttributeValue::N(_)) => Ok(value.clone()),
            _ => Err(StoreError::MissingKey(format!(
                "missing or empty `{}`",
                self.key_attribute
            ))),
        }
    }
}

/// Key-value store kept in process memory.
///
/// Tables have to be declared up front; operations on an unknown table fail
/// the same way a remote store reports a missing resource.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_table(self, table_name: &str, key_attribute: &str) -> Self {
        self.tables.write().insert(
            table_name.to_string(),
            Table {
                key_attribute: key_attribute.to_string(),
                items: HashMap::new(),
            },
        );
        self
    }

    /// Number of items in a table, `None` if the table does not exist.
    pub fn item_count(&self, table_name: &str) -> Option<usize> {
        self.tables.read().get(table_name).map(|t| t.items.len())
    }

    fn with_table_mut<T>(
        &self,
        table_name: &str,
        f: impl FnOnce(&mut Table) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        f(table)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn put_item(&self, request: PutItemRequest) -> Result<(), StoreError> {
        self.with_table_mut(&request.table_name, |table| {
            let key = table.key_value(&request.item)?;
            table.items.insert(key, request.item);
            Ok(())
        })
    }

    async fn get_item(&self, request: GetItemRequest) -> Result<Option<Item>, StoreError> {
        let tables = self.tables.read();
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| StoreError::TableNotFound(request.table_name.clone()))?;
        let key = table.key_of(&request.key)?;
        Ok(table.items.get(&key).cloned())
    }

    async fn update_item(&self, request: UpdateItemRequest) -> Result<(), StoreError> {
        let assignments = parse_set_expression(&request.update_expression)?;
        let condition = request
            .condition_expression
            .as_deref()
            .map(parse_condition)
            .transpose()?;

        self.with_table_mut(&request.table_name, |table| {
            let key = table.key_of(&request.key)?;

            // Resolve every assignment before touching the item
            let mut updates = Vec::with_capacity(assignments.len());
            for (name, placeholder) in assignments {
                if name == table.key_attribute {
                    return Err(StoreError::InvalidExpression(format!(
                        "cannot update key attribute `{name}`"
                    )));
                }
                let value = request
                    .expression_attribute_values
                    .get(&placeholder)
                    .cloned()
                    .ok_or(StoreError::MissingValue(placeholder))?;
                updates.push((name, value));
            }

            if let Some(condition) = &condition
                && !condition.holds(table.items.get(&key))
            {
                return Err(StoreError::ConditionalCheckFailed);
            }

            let item = table
                .items
                .entry(key)
                .or_insert_with(|| request.key.clone());
            item.extend(updates);
            Ok(())
        })
    }
}
