use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Usernames are URL path segments: lowercase letters, digits, dot, dash and underscore.
pub const USERNAME_REGEX: &str = r"^[a-z0-9_.-]+$";

// Slugs are lowercase words joined with single dashes, e.g. "my-first-project".
pub const SLUG_REGEX: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";

pub const EMAIL_REGEX: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

pub const SLUG_MAX_LEN: usize = 96;

static USERNAME_REGEX_COMPILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(USERNAME_REGEX).expect("USERNAME_REGEX must be a valid regex")
});

static SLUG_REGEX_COMPILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_REGEX).expect("SLUG_REGEX must be a valid regex"));

static EMAIL_REGEX_COMPILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_REGEX).expect("EMAIL_REGEX must be a valid regex"));

pub fn is_eligible_username(value: &str) -> bool {
    USERNAME_REGEX_COMPILED.is_match(value)
}

pub fn is_eligible_slug(value: &str) -> bool {
    SLUG_REGEX_COMPILED.is_match(value)
}

pub fn is_eligible_email(value: &str) -> bool {
    EMAIL_REGEX_COMPILED.is_match(value)
}

#[nutype(
    sanitize(trim, lowercase),
    validate(len_char_min = 3, len_char_max = 32, predicate = is_eligible_username),
    derive(
        Clone,
        Debug,
        Display,
        AsRef,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Username(String);

#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 254, predicate = is_eligible_email),
    derive(
        Clone,
        Debug,
        Display,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Email(String);

#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 96, predicate = is_eligible_slug),
    derive(
        Clone,
        Debug,
        Display,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from free text: every run of non alphanumeric characters
    /// becomes a single dash. Returns `None` when nothing usable is left.
    pub fn derive_from(text: &str) -> Option<Slug> {
        let mut slug = String::with_capacity(text.len());
        let mut pending_dash = false;

        for c in text.trim().chars().flat_map(char::to_lowercase) {
            if !c.is_ascii_alphanumeric() {
                pending_dash = true;
                continue;
            }
            let dash = pending_dash && !slug.is_empty();
            if slug.len() + usize::from(dash) + 1 > SLUG_MAX_LEN {
                break;
            }
            if dash {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }

        Slug::try_new(slug).ok()
    }
}

/// Wrapper to prevent ID confusion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub Uuid);

/// Wrapper to prevent ID confusion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProjectId(pub Uuid);

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct EventId(pub Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = anyhow::Error;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                let uuid = Uuid::parse_str(value)?;
                Ok(Self(uuid))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(ProjectId);
uuid_id!(EventId);
