//! Multi-valued resource filter, serialized into the coordinator query
//! string.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left bare in query values: ASCII alphanumerics plus the
/// RFC 3986 unreserved marks. Everything else is percent-encoded.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Selector keys understood by the coordinator. Closed set: growing it means
/// the coordinator grew first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Binary,
    Config,
    Host,
    Ip,
    Uuid,
    State,
    Count,
    AvailabilityZone,
}

impl FilterKey {
    /// Wire name of the key. Emitted without encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Config => "config",
            Self::Host => "host",
            Self::Ip => "ip",
            Self::Uuid => "uuid",
            Self::State => "state",
            Self::Count => "count",
            Self::AvailabilityZone => "availability-zone",
        }
    }
}

/// Ordered multi-valued selector. Keys keep first-insertion order, values
/// keep append order, and a key is only ever present with at least one
/// value.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    entries: Vec<(FilterKey, Vec<String>)>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the sequence held under `key`.
    pub fn add(&mut self, key: FilterKey, value: impl Into<String>) {
        let value = value.into();
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            values.push(value);
        } else {
            self.entries.push((key, vec![value]));
        }
    }

    /// True when no key holds any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order, each with its value sequence.
    pub fn entries(&self) -> impl Iterator<Item = (FilterKey, &[String])> {
        self.entries.iter().map(|(key, values)| (*key, values.as_slice()))
    }

    /// `key=value` pairs joined with `&`, one pair per value, values
    /// percent-encoded. Empty string for an empty filter.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut pairs = Vec::new();
        for (key, values) in &self.entries {
            for value in values {
                pairs.push(format!(
                    "{}={}",
                    key.as_str(),
                    utf8_percent_encode(value, QUERY_VALUE)
                ));
            }
        }
        pairs.join("&")
    }
}
