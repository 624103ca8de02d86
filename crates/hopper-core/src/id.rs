// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lode and backlog item identifiers.
//!
//! Lode ids are 8 characters drawn from a 32-symbol alphabet, not UUIDs:
//! short enough to type as a CLI argument, long enough that collisions
//! across the lifetime of a single user's data directory are noise-level.
//! Collision checking against on-disk state lives in `hopper-store`; this
//! module only knows how to draw one candidate and define the id types.

use rand::Rng;

/// Trait for truncating identifiers to a short prefix.
pub trait ShortId {
    fn short(&self, n: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, n: usize) -> &str {
        if self.len() <= n {
            self
        } else {
            &self[..n]
        }
    }
}

/// Define a newtype ID wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `short()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>` implementations.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns a string slice truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                if self.0.len() <= n {
                    &self.0
                } else {
                    &self.0[..n]
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// A lode's identifier: 8 characters from [`ID_ALPHABET`].
    pub struct LodeId;
}

define_id! {
    /// A backlog item's identifier, drawn from the same alphabet/generator as [`LodeId`].
    pub struct BacklogId;
}

/// The id alphabet: lowercase letters minus `01` plus `234567`, avoiding
/// characters easily confused with digits when read off a terminal.
pub const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
pub const ID_LEN: usize = 8;

/// Matches `^[a-z2-7]{8}$`.
pub fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == ID_LEN && candidate.bytes().all(|b| ID_ALPHABET.contains(&b))
}

/// Draws id candidates. Implementations do not retry on collision; the
/// caller (`hopper-store`) owns the retry-and-check loop because only it
/// knows the universe of existing ids.
pub trait IdGen: Send + Sync {
    fn next_candidate(&self) -> String;
}

/// Production generator: draws `ID_LEN` characters uniformly from
/// `ID_ALPHABET` using the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGen;

impl IdGen for RandomIdGen {
    fn next_candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..ID_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ID_ALPHABET.len());
                ID_ALPHABET[idx] as char
            })
            .collect()
    }
}

/// Deterministic generator for tests: cycles through a fixed sequence of
/// well-formed candidates so assertions can pin exact ids.
#[derive(Debug, Clone)]
pub struct SequentialIdGen {
    counter: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self {
            counter: std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGen for SequentialIdGen {
    fn next_candidate(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut out = String::with_capacity(ID_LEN);
        let mut n = n;
        for _ in 0..ID_LEN {
            let symbol = ID_ALPHABET[(n % ID_ALPHABET.len() as u64) as usize];
            out.push(symbol as char);
            n /= ID_ALPHABET.len() as u64;
        }
        out
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
