//! KV v2 secrets engine types.
//!
//! Shapes of the payloads the engine returns, decoded from the envelope's
//! `data` map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

use vaultkv_logical::SecretData;

/// Configurable settings of the engine or of a single secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Maximum number of versions to keep; 0 means the engine default.
    pub max_versions: u32,
    /// Whether writes must carry a check-and-set version.
    pub cas_required: bool,
    /// Age after which versions are soft-deleted; zero disables it.
    #[serde(with = "duration_secs")]
    pub delete_version_after: Duration,
}

/// Metadata about a specific version of a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretVersion {
    /// When the version was written.
    pub created_time: DateTime<Utc>,
    /// When the version was soft-deleted, if it was.
    #[serde(default, with = "optional_time")]
    pub deletion_time: Option<DateTime<Utc>>,
    /// Whether the version was permanently destroyed.
    #[serde(default)]
    pub destroyed: bool,
    /// Version number. Entries of [`SecretMetadata::versions`] omit it.
    #[serde(default)]
    pub version: u64,
}

impl SecretVersion {
    /// Check if this version can still be read.
    pub fn is_accessible(&self) -> bool {
        !self.destroyed && self.deletion_time.is_none()
    }

    /// Check if this version is soft-deleted (can be undeleted).
    pub fn is_soft_deleted(&self) -> bool {
        self.deletion_time.is_some() && !self.destroyed
    }
}

/// A secret's metadata across all of its versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub created_time: DateTime<Utc>,
    pub current_version: u64,
    pub max_versions: u32,
    pub oldest_version: u64,
    pub updated_time: DateTime<Utc>,
    /// Per-version metadata keyed by the version number as a string.
    pub versions: BTreeMap<String, SecretVersion>,
}

impl SecretMetadata {
    /// Metadata of version `version`, if the backend still tracks it.
    pub fn version(&self, version: u64) -> Option<&SecretVersion> {
        self.versions.get(&version.to_string())
    }
}

/// A secret's data together with the metadata of the version read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvSecret {
    /// Stored key/value pairs; empty for deleted or destroyed versions.
    #[serde(deserialize_with = "null_as_empty")]
    pub data: SecretData,
    pub metadata: SecretVersion,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<SecretData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SecretData>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps the backend sends as an empty string when unset.
mod optional_time {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => time.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(&s)
                .map(|time| Some(time.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Durations written as `"<seconds>s"` (or `"<nanoseconds>ns"` when there is
/// a sub-second part) and read as Go duration strings or integer seconds.
mod duration_secs {
    use super::*;
    use serde::de::{self, Visitor};
    use std::fmt;

    const NANOS_PER_SEC: u128 = 1_000_000_000;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", value.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ns", value.as_nanos()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a duration string such as \"1h30m\" or a number of seconds")
        }

        fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(secs))
        }

        fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Duration, E> {
            u64::try_from(secs)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("negative duration"))
        }

        fn visit_str<E: de::Error>(self, s: &str) -> Result<Duration, E> {
            parse_duration(s).ok_or_else(|| E::custom(format!("invalid duration {:?}", s)))
        }
    }

    /// Parse a Go-style duration (`"0s"`, `"1h2m3s"`, `"1.5h"`, `"300ms"`).
    ///
    /// A bare integer is taken as seconds. Arithmetic is done in integer
    /// nanoseconds; fractions finer than a nanosecond are truncated.
    pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        if s.is_empty() {
            return None;
        }

        let mut total: u128 = 0;
        let mut rest = s;
        while !rest.is_empty() {
            let num_end = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
            if num_end == 0 {
                return None;
            }
            let (whole, fraction) = match rest[..num_end].split_once('.') {
                Some((whole, fraction)) => (whole, fraction),
                None => (&rest[..num_end], ""),
            };
            if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
                return None;
            }
            rest = &rest[num_end..];

            let unit_end = rest
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(rest.len());
            let unit: u128 = match &rest[..unit_end] {
                "ns" => 1,
                "us" | "µs" => 1_000,
                "ms" => 1_000_000,
                "s" => NANOS_PER_SEC,
                "m" => 60 * NANOS_PER_SEC,
                "h" => 3600 * NANOS_PER_SEC,
                _ => return None,
            };
            rest = &rest[unit_end..];

            let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
            total = total.checked_add(whole.checked_mul(unit)?)?;

            // digits past the 20th cannot contribute a whole nanosecond
            let fraction = &fraction[..fraction.len().min(20)];
            if !fraction.is_empty() {
                let numerator: u128 = fraction.parse().ok()?;
                let scale = 10u128.pow(fraction.len() as u32);
                total = total.checked_add(numerator.checked_mul(unit)? / scale)?;
            }
        }

        let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
        Some(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
    }
}
