//! Queue entities decoded from the listing tool's JSON records.

use core::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// One delivery target within a queued message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub address: String,
    /// Why delivery has not happened yet; empty when the MTA gave no reason
    #[serde(default)]
    pub delay_reason: String,
}

/// Sub-queue a message currently sits in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueueName {
    Active,
    Deferred,
    Hold,
    Other(String),
}

impl QueueName {
    /// Single character shown next to the queue id in the message menu.
    ///
    /// Unknown queue names are shown verbatim.
    #[must_use]
    pub fn glyph(&self) -> &str {
        match self {
            Self::Active => "*",
            Self::Deferred => " ",
            Self::Hold => "!",
            Self::Other(name) => name.as_str(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Deferred => "deferred",
            Self::Hold => "hold",
            Self::Other(name) => name.as_str(),
        }
    }
}

// A record without a queue name shows no glyph at all
impl Default for QueueName {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<&str> for QueueName {
    fn from(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "deferred" => Self::Deferred,
            "hold" => Self::Hold,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for QueueName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QueueName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QueueName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

/// Point in time a message entered the queue.
///
/// The listing tool encodes this as a quoted string holding either `null` or
/// whole seconds since the Unix epoch. `None` is the unset sentinel and is
/// never confused with the epoch itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArrivalTime(Option<DateTime<Utc>>);

impl ArrivalTime {
    pub const UNSET: Self = Self(None);

    /// Arrival time from whole seconds since the epoch, `None` when the
    /// value is outside the representable range
    #[must_use]
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(|dt| Self(Some(dt)))
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub const fn get(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Seconds since the epoch, `None` for the unset sentinel
    #[must_use]
    pub fn unix(&self) -> Option<i64> {
        self.0.map(|dt| dt.timestamp())
    }

    fn parse<E: de::Error>(token: &str) -> Result<Self, E> {
        if token == "null" {
            return Ok(Self::UNSET);
        }

        let secs = token.parse::<i64>().map_err(|_| {
            E::invalid_value(de::Unexpected::Str(token), &"`null` or seconds since the epoch")
        })?;

        Self::from_unix(secs).ok_or_else(|| {
            E::invalid_value(de::Unexpected::Signed(secs), &"a representable timestamp")
        })
    }
}

impl From<DateTime<Utc>> for ArrivalTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self(Some(value))
    }
}

impl Display for ArrivalTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => f.write_str("unknown"),
        }
    }
}

impl Serialize for ArrivalTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.unix() {
            Some(secs) => serializer.serialize_str(&secs.to_string()),
            None => serializer.serialize_none(),
        }
    }
}

struct ArrivalTimeVisitor;

impl de::Visitor<'_> for ArrivalTimeVisitor {
    type Value = ArrivalTime;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a quoted `null` or a quoted number of seconds since the epoch")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        ArrivalTime::parse(v)
    }

    // Current Postfix releases emit a bare integer
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        ArrivalTime::from_unix(v)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &"a representable timestamp"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .ok()
            .and_then(ArrivalTime::from_unix)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &"a representable timestamp"))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ArrivalTime::UNSET)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ArrivalTime::UNSET)
    }
}

impl<'de> Deserialize<'de> for ArrivalTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ArrivalTimeVisitor)
    }
}

/// One entry in a queue snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub queue_name: QueueName,
    #[serde(default)]
    pub queue_id: String,
    #[serde(default)]
    pub arrival_time: ArrivalTime,
    /// Size in bytes
    #[serde(default)]
    pub message_size: u64,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

impl Message {
    /// The recipient shown in the message menu.
    ///
    /// Messages produced by [`crate::snapshot::decode`] always carry at least
    /// one recipient.
    #[must_use]
    pub fn primary_recipient(&self) -> Option<&Recipient> {
        self.recipients.first()
    }

    /// Menu row without the ordinal
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}{}  {}  {}",
            self.queue_id,
            self.queue_name.glyph(),
            self.primary_recipient().map_or("", |r| r.address.as_str()),
            self.arrival_time
        )
    }
}

/// Messages in the order the listing tool produced them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSet(Vec<Message>);

impl MessageSet {
    pub(crate) const fn new(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    /// Take ownership of the message at `index`, discarding the rest of the set
    #[must_use]
    pub fn take(mut self, index: usize) -> Option<Message> {
        (index < self.0.len()).then(|| self.0.swap_remove(index))
    }
}

impl<'a> IntoIterator for &'a MessageSet {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for MessageSet {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
