use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::logger::LoggerError;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const FUNC_KEY: &str = "func";
pub const MSG_KEY: &str = "msg";

/// Keys written by the formatter itself; user fields with these names are prefixed.
pub const RESERVED_KEYS: [&str; 4] = [TIME_KEY, LEVEL_KEY, FUNC_KEY, MSG_KEY];

/// Precedence rule for the fields of a rendered record.
///
/// Both rules put `time`, `level`, `func` first (in that order) and sort the
/// remaining keys alphabetically.
/// - `MessageLast`: `msg` is pinned after every other field.
/// - `Alphabetical`: `msg` sorts among the remaining keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// `msg` always last (default).
    MessageLast,
    /// `msg` is an ordinary key.
    Alphabetical,
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self::MessageLast
    }
}

impl FieldOrder {
    fn rank(self, key: &str) -> u8 {
        match key {
            TIME_KEY => 0,
            LEVEL_KEY => 1,
            FUNC_KEY => 2,
            MSG_KEY if self == FieldOrder::MessageLast => 4,
            _ => 3,
        }
    }

    /// Total order over field keys.
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b))
    }

    /// Sorts `(key, value)` pairs in place by key.
    ///
    /// # Examples
    /// ```
    /// use debuglog::FieldOrder;
    ///
    /// let mut fields = vec![("msg", 1), ("zone", 2), ("time", 3), ("func", 4), ("level", 5)];
    /// FieldOrder::MessageLast.sort(&mut fields);
    ///
    /// let keys: Vec<_> = fields.iter().map(|(k, _)| *k).collect();
    /// assert_eq!(keys, ["time", "level", "func", "zone", "msg"]);
    /// ```
    pub fn sort<K: AsRef<str>, V>(self, fields: &mut [(K, V)]) {
        fields.sort_by(|(a, _), (b, _)| self.compare(a.as_ref(), b.as_ref()));
    }
}

impl FromStr for FieldOrder {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "msg_last" | "message_last" => Ok(Self::MessageLast),
            "alphabetical" | "alpha" => Ok(Self::Alphabetical),
            _ => Err(LoggerError::InvalidFieldOrder(s.to_string())),
        }
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldOrder::MessageLast => "msg_last",
            FieldOrder::Alphabetical => "alphabetical",
        };
        f.write_str(s)
    }
}

impl Serialize for FieldOrder {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
