use super::SinkError;

pub trait RecordStream {
    fn put_record(&self, data: &[u8], partition_key: &str) -> Result<(), SinkError>;
}

impl<F> RecordStream for F
where
    F: Fn(&[u8], &str) -> Result<(), SinkError>,
{
    fn put_record(&self, data: &[u8], partition_key: &str) -> Result<(), SinkError> {
        self(data, partition_key)
    }
}
