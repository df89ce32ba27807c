use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;

/// Accepted email syntax: dot separated local atoms, at least one domain label
/// followed by an alphabetic top level domain of two or more characters.
pub static EMAIL_ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$",
    )
    .unwrap()
});

#[nutype(
    validate(regex = EMAIL_ADDRESS_REGEX),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Display,
        Deref,
        TryFrom,
        FromStr,
        Serialize,
        Deserialize
    )
)]
pub struct EmailAddress(String);
