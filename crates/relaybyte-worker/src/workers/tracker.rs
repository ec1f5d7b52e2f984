//! Running totals for a sync.

use relaybyte_types::input::State;
use relaybyte_types::protocol::ConnectorMessage;

/// Counts records and record bytes, and remembers the last state seen.
#[derive(Debug, Default)]
pub struct MessageTracker {
    records: u64,
    bytes: u64,
    last_state: Option<State>,
}

impl MessageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, message: &ConnectorMessage) {
        match message {
            ConnectorMessage::Record(record) => {
                self.records += 1;
                // Size of the record payload as serialized JSON.
                self.bytes += serde_json::to_vec(&record.data).map_or(0, |bytes| bytes.len() as u64);
            }
            ConnectorMessage::State(state) => {
                self.last_state = Some(State::new(state.data.clone()));
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn record_count(&self) -> u64 {
        self.records
    }

    #[must_use]
    pub fn bytes_count(&self) -> u64 {
        self.bytes
    }

    #[must_use]
    pub fn last_state(&self) -> Option<&State> {
        self.last_state.as_ref()
    }
}
