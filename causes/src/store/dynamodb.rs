use super::{
    AttributeValue, GetItemRequest, Item, KvStore, PutItemRequest, StoreError, UpdateItemRequest,
};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use std::collections::HashMap;
use std::fmt::Debug;

/// Key-value store backed by a DynamoDB table.
///
/// Credentials and, unless overridden, the region come from the standard AWS
/// environment (env vars, profile, instance metadata).
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    pub fn new(client: Client) -> Self {
        DynamoDbStore { client }
    }

    /// Builds a client from the AWS environment. `endpoint_url` points the
    /// client at a local DynamoDB.
    pub async fn from_env(region: Option<String>, endpoint_url: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        tracing::info!(region = ?sdk_config.region(), "using dynamodb store");
        DynamoDbStore::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl KvStore for DynamoDbStore {
    async fn put_item(&self, request: PutItemRequest) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&request.table_name)
            .set_item(Some(to_dynamo_item(request.item)))
            .send()
            .await
            .map_err(|err| put_error(err, &request.table_name))?;
        Ok(())
    }

    async fn get_item(&self, request: GetItemRequest) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&request.table_name)
            .set_key(Some(to_dynamo_item(request.key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| get_error(err, &request.table_name))?;

        output.item.map(from_dynamo_item).transpose()
    }

    async fn update_item(&self, request: UpdateItemRequest) -> Result<(), StoreError> {
        self.client
            .update_item()
            .table_name(&request.table_name)
            .set_key(Some(to_dynamo_item(request.key)))
            .update_expression(request.update_expression)
            .set_condition_expression(request.condition_expression)
            .set_expression_attribute_values(Some(to_dynamo_item(
                request.expression_attribute_values,
            )))
            .send()
            .await
            .map_err(|err| update_error(err, &request.table_name))?;
        Ok(())
    }
}

fn to_dynamo_item(item: Item) -> HashMap<String, DynamoValue> {
    item.into_iter()
        .map(|(name, value)| {
            let value = match value {
                AttributeValue::S(s) => DynamoValue::S(s),
                AttributeValue::N(n) => DynamoValue::N(n),
            };
            (name, value)
        })
        .collect()
}

fn from_dynamo_item(item: HashMap<String, DynamoValue>) -> Result<Item, StoreError> {
    item.into_iter()
        .map(|(name, value)| match value {
            DynamoValue::S(s) => Ok((name, AttributeValue::S(s))),
            DynamoValue::N(n) => Ok((name, AttributeValue::N(n))),
            other => Err(StoreError::UnsupportedAttribute(format!("{name}: {other:?}"))),
        })
        .collect()
}

fn put_error<R: Debug>(err: SdkError<PutItemError, R>, table_name: &str) -> StoreError {
    let not_found = err
        .as_service_error()
        .is_some_and(PutItemError::is_resource_not_found_exception);
    classify(err, table_name, not_found, false)
}

fn get_error<R: Debug>(err: SdkError<GetItemError, R>, table_name: &str) -> StoreError {
    let not_found = err
        .as_service_error()
        .is_some_and(GetItemError::is_resource_not_found_exception);
    classify(err, table_name, not_found, false)
}

fn update_error<R: Debug>(err: SdkError<UpdateItemError, R>, table_name: &str) -> StoreError {
    let service_error = err.as_service_error();
    let not_found = service_error.is_some_and(UpdateItemError::is_resource_not_found_exception);
    let condition_failed =
        service_error.is_some_and(UpdateItemError::is_conditional_check_failed_exception);
    classify(err, table_name, not_found, condition_failed)
}

fn classify<E, R>(
    err: SdkError<E, R>,
    table_name: &str,
    not_found: bool,
    condition_failed: bool,
) -> StoreError
where
    E: std::error::Error + 'static,
    R: Debug,
{
    if condition_failed {
        StoreError::ConditionalCheckFailed
    } else if not_found {
        StoreError::TableNotFound(table_name.to_string())
    } else {
        StoreError::Unavailable(DisplayErrorContext(&err).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::error::{
        ConditionalCheckFailedException, ProvisionedThroughputExceededException,
        ResourceNotFoundException,
    };

    fn service_error<E>(err: E) -> SdkError<E, ()> {
        SdkError::service_error(err, ())
    }

    #[test]
    fn test_item_conversion() {
        let item = Item::from([
            ("cause_id".to_string(), AttributeValue::S("c1".into())),
            ("follower_count".to_string(), AttributeValue::N("7".into())),
        ]);

        let dynamo = to_dynamo_item(item.clone());
        assert_eq!(dynamo["cause_id"], DynamoValue::S("c1".into()));
        assert_eq!(dynamo["follower_count"], DynamoValue::N("7".into()));

        assert_eq!(from_dynamo_item(dynamo).unwrap(), item);
    }

    #[test]
    fn test_unsupported_attribute() {
        let dynamo = HashMap::from([
            ("cause_id".to_string(), DynamoValue::S("c1".into())),
            ("archived".to_string(), DynamoValue::Bool(true)),
        ]);

        let err = from_dynamo_item(dynamo).unwrap_err();
        assert!(
            matches!(&err, StoreError::UnsupportedAttribute(msg) if msg.starts_with("archived")),
            "{err:?}"
        );
    }

    #[test]
    fn test_conditional_check_failed() {
        let err = service_error(UpdateItemError::ConditionalCheckFailedException(
            ConditionalCheckFailedException::builder()
                .message("The conditional request failed")
                .build(),
        ));
        assert_eq!(
            update_error(err, "causes"),
            StoreError::ConditionalCheckFailed
        );
    }

    #[test]
    fn test_missing_table() {
        let missing = || {
            ResourceNotFoundException::builder()
                .message("Requested resource not found")
                .build()
        };
        let expected = StoreError::TableNotFound("causes".into());

        let err = service_error(PutItemError::ResourceNotFoundException(missing()));
        assert_eq!(put_error(err, "causes"), expected);

        let err = service_error(GetItemError::ResourceNotFoundException(missing()));
        assert_eq!(get_error(err, "causes"), expected);

        let err = service_error(UpdateItemError::ResourceNotFoundException(missing()));
        assert_eq!(update_error(err, "causes"), expected);
    }

    #[test]
    fn test_other_failures_are_unavailable() {
        let err = service_error(PutItemError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder()
                .message("rate exceeded")
                .build(),
        ));
        let StoreError::Unavailable(msg) = put_error(err, "causes") else {
            panic!("expected unavailable");
        };
        assert!(msg.contains("rate exceeded"), "{msg}");

        let err: SdkError<GetItemError, ()> = SdkError::timeout_error("connect timed out");
        assert!(matches!(
            get_error(err, "causes"),
            StoreError::Unavailable(_)
        ));
    }
}
