//! Ordered API credentials and the rotation cursor shared by every call on a
//! client.
//!
//! The cursor is read when an attempt fires and written when a credential is
//! rotated away from. Reads and writes are individually atomic but a
//! read-advance pair is not, so two calls in flight on the same client may
//! interleave their rotations. Callers that need strict ordering enable
//! `serialize_rotation` on the client instead.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use lyft_core::ChatError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail: String = {
            let chars: Vec<char> = self.0.chars().collect();
            let start = chars.len().saturating_sub(4);
            chars[start..].iter().collect()
        };
        write!(f, "…{}", tail)
    }
}

pub struct CredentialSet {
    keys: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialSet {
    pub fn new<I, S>(keys: I) -> Result<Self, ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<Credential> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Credential)
            .collect();
        if keys.is_empty() {
            return Err(ChatError::InvalidArgument(
                "credential set must contain at least one key".into(),
            ));
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Credential under the cursor right now.
    pub fn current(&self) -> (usize, &Credential) {
        let i = self.cursor() % self.keys.len();
        (i, &self.keys[i])
    }

    /// Moves the cursor one step, wrapping at the end. Returns the new index.
    pub fn advance(&self) -> usize {
        let next = (self.cursor() + 1) % self.keys.len();
        self.cursor.store(next, Ordering::SeqCst);
        next
    }

    #[cfg(test)]
    pub(crate) fn set_cursor(&self, i: usize) {
        self.cursor.store(i % self.keys.len(), Ordering::SeqCst);
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("len", &self.keys.len())
            .field("cursor", &self.cursor())
            .finish()
    }
}
