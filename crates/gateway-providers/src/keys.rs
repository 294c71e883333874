//! Credential pools.

use rand::seq::SliceRandom;
use rand::Rng;
use secrecy::SecretString;

/// An ordered set of interchangeable API keys.
///
/// Selection is random per call and spreads quota usage across keys. It is
/// not a failover mechanism: a failed call is never repeated with another key.
#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    keys: Vec<SecretString>,
}

impl KeyPool {
    /// Create a pool from the configured keys
    #[must_use]
    pub fn new(keys: Vec<SecretString>) -> Self {
        Self { keys }
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the pool has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pick a key uniformly at random
    #[must_use]
    pub fn choose(&self) -> Option<&SecretString> {
        self.choose_with(&mut rand::thread_rng())
    }

    /// Pick a key uniformly at random from `rng`
    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SecretString> {
        self.keys.choose(rng)
    }
}

impl FromIterator<SecretString> for KeyPool {
    fn from_iter<I: IntoIterator<Item = SecretString>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
