use event_sources_core::contract::{EVENTS_DETAIL_TYPE, EVENTS_SOURCE};

use super::SinkError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub source: String,
    pub detail_type: String,
    pub detail: String,
}

impl EventEntry {
    /// Entry published for a newly submitted API item.
    pub fn new_item(detail: String) -> Self {
        Self {
            source: EVENTS_SOURCE.to_string(),
            detail_type: EVENTS_DETAIL_TYPE.to_string(),
            detail,
        }
    }
}

pub trait EventBus {
    fn put_event(&self, entry: &EventEntry) -> Result<(), SinkError>;
}

impl<F> EventBus for F
where
    F: Fn(&EventEntry) -> Result<(), SinkError>,
{
    fn put_event(&self, entry: &EventEntry) -> Result<(), SinkError> {
        self(entry)
    }
}
