//! Identifier normalization.
//!
//! Registries populated by different sources spell the same player UUID in
//! different ways: dashed or undashed, upper or lower case. Everything inside
//! the resolver compares the canonical form (32 lower-case hex characters, no
//! separators); the dashed display form is only produced for key probes and
//! human-facing output.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a canonical identifier.
pub const CANONICAL_LEN: usize = 32;

static IDENTIFIER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[0-9a-f]{32}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$")
        .expect("identifier shape regex is valid")
});

/// Canonical identifier: lower-cased, separator-free.
///
/// Produced by [`normalize`]. A value is only meaningful when
/// [`is_valid`](Self::is_valid); malformed input normalizes to something that
/// simply fails every lookup.
///
/// # Examples
///
/// ```
/// use follow_resolver::CanonicalId;
///
/// let id = CanonicalId::parse("01234567-89AB-cdef-0123-456789abcdef");
/// assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
/// assert_eq!(id.to_display(), "01234567-89ab-cdef-0123-456789abcdef");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Normalizes raw input into a canonical identifier.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        normalize(raw)
    }

    /// Creates a canonical identifier from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.simple().to_string())
    }

    /// Returns the UUID this identifier encodes, if it is valid.
    #[must_use]
    pub fn to_uuid(&self) -> Option<Uuid> {
        if !self.is_valid() {
            return None;
        }
        Uuid::try_parse(&self.0).ok()
    }

    /// The canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty (invalid) identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when this is exactly 32 hex characters.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.len() == CANONICAL_LEN && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Dashed 8-4-4-4-12 display form.
    #[must_use]
    pub fn to_display(&self) -> String {
        to_display(&self.0)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for CanonicalId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strips separators and lower-cases. Empty input yields the empty identifier.
#[must_use]
pub fn normalize(raw: &str) -> CanonicalId {
    CanonicalId(
        raw.trim()
            .chars()
            .filter(|c| *c != '-')
            .flat_map(char::to_lowercase)
            .collect(),
    )
}

/// Inserts separators at the 8-4-4-4-12 offsets.
///
/// Input that is not 32 characters long comes back lower-cased and otherwise
/// unchanged.
#[must_use]
pub fn to_display(canonical: &str) -> String {
    let lower = canonical.to_lowercase();
    if lower.len() != CANONICAL_LEN || !lower.is_ascii() {
        return lower;
    }
    format!(
        "{}-{}-{}-{}-{}",
        &lower[0..8],
        &lower[8..12],
        &lower[12..16],
        &lower[16..20],
        &lower[20..32]
    )
}

/// True iff `s` is a 32-hex identifier, dashed (8-4-4-4-12) or undashed.
/// Case-insensitive; no surrounding whitespace allowed.
#[must_use]
pub fn looks_like_identifier(s: &str) -> bool {
    IDENTIFIER_SHAPE.is_match(s)
}
