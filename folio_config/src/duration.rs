use std::ops::Deref;

use serde::Deserialize;

/// Human readable duration, e.g. `"10m"`, `"1d 2h"` or `"250ms"`.
///
/// The string consists of whitespace separated parts, each a non-negative
/// integer followed by one of the units `ms`, `s`, `m`, `h` or `d`. The parts
/// are summed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::str::FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .try_fold(std::time::Duration::ZERO, |total, part| {
                let split = part
                    .find(|c: char| !c.is_ascii_digit())
                    .ok_or(InvalidDuration)?;
                let (value, unit) = part.split_at(split);
                let value = value.parse::<u64>().map_err(|_| InvalidDuration)?;
                let part = match unit {
                    "ms" => std::time::Duration::from_millis(value),
                    "s" => std::time::Duration::from_secs(value),
                    "m" => std::time::Duration::from_secs(value * 60),
                    "h" => std::time::Duration::from_secs(value * 60 * 60),
                    "d" => std::time::Duration::from_secs(value * 24 * 60 * 60),
                    _ => return Err(InvalidDuration),
                };
                Ok(total + part)
            })
            .map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDuration;

impl std::fmt::Display for InvalidDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Invalid duration")
    }
}

impl std::error::Error for InvalidDuration {}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
