use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use event_sources_core::contract::Payload;

use super::SinkError;

pub trait ItemTable {
    fn put_item(&self, item: &Payload) -> Result<(), SinkError>;
}

impl<F> ItemTable for F
where
    F: Fn(&Payload) -> Result<(), SinkError>,
{
    fn put_item(&self, item: &Payload) -> Result<(), SinkError> {
        self(item)
    }
}

/// Maps a JSON payload onto DynamoDB attribute values: numbers become `N`,
/// objects `M`, arrays `L` and nulls `NULL`.
pub fn to_item(payload: &Payload) -> Result<HashMap<String, AttributeValue>, SinkError> {
    serde_dynamo::to_item(payload)
        .map_err(|error| SinkError::new("dynamodb", format!("item conversion: {error}")))
}
