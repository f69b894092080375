use super::SinkError;

pub trait MessageQueue {
    fn send_message(&self, body: &str) -> Result<(), SinkError>;
}

impl<F> MessageQueue for F
where
    F: Fn(&str) -> Result<(), SinkError>,
{
    fn send_message(&self, body: &str) -> Result<(), SinkError> {
        self(body)
    }
}
