pub mod api;
pub mod async_event;
pub mod dynamo_stream;
pub mod kinesis_stream;
pub mod sqs;
