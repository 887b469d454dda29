use std::collections::HashSet;
use std::collections::hash_set::Iter;
use std::hash::BuildHasherDefault;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use seahash::SeaHasher;
use uuid::{Builder, Uuid};

// ------------- Identifier -------------
pub type IdHasher = BuildHasherDefault<SeaHasher>;

/// Identifiers are write-once: once retained they stay taken for the
/// lifetime of the owning document, there is no release.
#[derive(Debug)]
pub struct IdRegistry {
    retained: HashSet<String, IdHasher>,
    // present only in replicable mode
    rng: Option<StdRng>,
}

impl IdRegistry {
    /// Registry minting random v4 UUIDs.
    pub fn new() -> Self {
        Self {
            retained: HashSet::default(),
            rng: None,
        }
    }
    /// Registry minting the same sequence of UUIDs for the same seed and the
    /// same sequence of calls.
    pub fn seeded(seed: u64) -> Self {
        Self {
            retained: HashSet::default(),
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }
    pub fn is_replicable(&self) -> bool {
        self.rng.is_some()
    }
    // Identifiers read from an existing document are retained as-is, while
    // freshly minted ones are retained by generate.
    pub fn retain(&mut self, id: &str) {
        if !self.retained.contains(id) {
            self.retained.insert(id.to_owned());
        }
    }
    pub fn check(&self, id: &str) -> bool {
        self.retained.contains(id)
    }
    pub fn generate(&mut self) -> String {
        loop {
            let id = self.mint().to_string();
            if self.retained.insert(id.clone()) {
                return id;
            }
        }
    }
    fn mint(&mut self) -> Uuid {
        match self.rng.as_mut() {
            Some(rng) => {
                let mut bytes = [0u8; 16];
                rng.fill_bytes(&mut bytes);
                Builder::from_random_bytes(bytes).into_uuid()
            }
            None => Uuid::new_v4(),
        }
    }
    pub fn iter(&self) -> Iter<'_, String> {
        self.retained.iter()
    }
    pub fn len(&self) -> usize {
        self.retained.len()
    }
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}
