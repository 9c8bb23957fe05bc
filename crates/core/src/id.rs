// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types.
//!
//! Two kinds of identifiers cross process boundaries:
//! - tenant entities (organizations, teams, agents, repositories, webhooks)
//!   carry opaque prefixed random ids, generated with [`define_id!`];
//! - record entities (tasks, messages, events, sessions, reviews, comments,
//!   human requests, merge jobs) carry `u64` sequence ids assigned at insert,
//!   generated with [`define_seq_id!`].

/// Capacity of an inline id: the type prefix plus its random suffix never
/// exceed this many bytes.
pub const ID_MAX_LEN: usize = 24;

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Inline storage for a tenant id.
///
/// Ids are short ASCII strings, so they fit on the stack and the wrapper
/// types stay `Copy`. Anything longer than [`ID_MAX_LEN`] bytes trips a
/// debug assertion and is clamped.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdBuf {
    bytes: [u8; ID_MAX_LEN],
    len: u8,
}

impl IdBuf {
    pub fn new(s: &str) -> Self {
        debug_assert!(s.len() <= ID_MAX_LEN, "id too long ({} bytes): {s:?}", s.len());
        let len = s.len().min(ID_MAX_LEN);
        let mut bytes = [0u8; ID_MAX_LEN];
        bytes[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self { bytes, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        // Every constructor starts from &str, so the active bytes decode.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Must agree with str's Hash, or the Borrow<str> map lookups
        // the engine relies on would miss.
        self.as_str().hash(state);
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.len() > ID_MAX_LEN {
            return Err(serde::de::Error::custom(format!(
                "id longer than {ID_MAX_LEN} bytes: {s:?}"
            )));
        }
        Ok(IdBuf::new(&s))
    }
}

/// Define a newtype ID wrapper around [`IdBuf`] with a type prefix.
///
/// Generates `new()` for random ID generation, `from_string()` for parsing,
/// `as_str()`, `short()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `Borrow<str>`, and `Deref` implementations.
///
/// The ID format is `{prefix}{suffix}` where the random suffix fills the
/// remaining [`ID_MAX_LEN`] bytes.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct AgentId("agt-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $crate::id::IdBuf);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix
            pub fn new() -> Self {
                Self($crate::id::IdBuf::new(&format!(
                    "{}{}",
                    Self::PREFIX,
                    nanoid::nanoid!(($crate::id::ID_MAX_LEN - Self::PREFIX.len()))
                )))
            }

            /// Create ID from existing string (for parsing/deserialization)
            pub fn from_string(id: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Returns a string slice truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(self.0.as_str(), n)
            }

            /// Returns true if the ID is an empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

/// Define a newtype ID wrapper around a `u64` sequence value.
///
/// Sequence ids are monotonically increasing integers assigned by the store
/// at insert time; `0` is never a valid assigned id.
///
/// ```ignore
/// define_seq_id! {
///     /// Doc comment for the ID type.
///     pub struct TaskId;
/// }
/// ```
#[macro_export]
macro_rules! define_seq_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize, Default,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

define_id! {
    /// Organization identifier.
    pub struct OrgId("org-");
}

define_id! {
    /// Team identifier.
    pub struct TeamId("team-");
}

define_id! {
    /// Agent identifier.
    pub struct AgentId("agt-");
}

define_id! {
    /// Repository identifier.
    pub struct RepoId("repo-");
}

define_id! {
    /// Webhook delivery identifier.
    pub struct WebhookId("hook-");
}

define_seq_id! {
    /// Task identifier, assigned at insert.
    pub struct TaskId;
}

define_seq_id! {
    /// Message identifier, assigned at insert.
    pub struct MessageId;
}

define_seq_id! {
    /// Event identifier. Strictly increasing across the whole log.
    pub struct EventId;
}

define_seq_id! {
    /// Session identifier, assigned at insert.
    pub struct SessionId;
}

define_seq_id! {
    /// Review identifier, assigned at insert.
    pub struct ReviewId;
}

define_seq_id! {
    /// Review comment identifier, assigned at insert.
    pub struct CommentId;
}

define_seq_id! {
    /// Human request identifier, assigned at insert.
    pub struct RequestId;
}

define_seq_id! {
    /// Merge job identifier, assigned at insert.
    pub struct MergeJobId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
