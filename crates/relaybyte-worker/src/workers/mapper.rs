//! Prefixes destination stream names.

use relaybyte_types::catalog::ConfiguredCatalog;
use relaybyte_types::protocol::ConnectorMessage;

/// Maps source stream names into the destination's namespace by prepending
/// a fixed prefix. An empty prefix leaves names unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespacingMapper {
    prefix: String,
}

impl NamespacingMapper {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn stream_name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Catalog as the destination should see it.
    #[must_use]
    pub fn map_catalog(&self, catalog: &ConfiguredCatalog) -> ConfiguredCatalog {
        let mut mapped = catalog.clone();
        for configured in &mut mapped.streams {
            configured.stream.name = self.stream_name(&configured.stream.name);
        }
        mapped
    }

    /// Records are renamed; every other message passes through.
    #[must_use]
    pub fn map_message(&self, message: ConnectorMessage) -> ConnectorMessage {
        match message {
            ConnectorMessage::Record(mut record) => {
                record.stream = self.stream_name(&record.stream);
                ConnectorMessage::Record(record)
            }
            other => other,
        }
    }
}
