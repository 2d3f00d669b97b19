use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::svg::Artifact;

const XXH3_SEED: u64 = 0x6b61_6b69_6a75_6e01;

/// Content key of one operation invocation: xxh3-128 over the operation tag, its parameters
/// and the full text of every input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Operation tags; part of every key so equal parameters of different operations never meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpTag {
    Base = 0,
    Range = 1,
    Transform = 2,
    Composite = 3,
    CompositeAlpha = 4,
}

pub struct StableHasher {
    inner: Xxh3,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StableHasher {
    pub fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub fn tagged(tag: OpTag) -> Self {
        let mut h = Self::new();
        h.write_u8(tag as u8);
        h
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Length-prefixed so consecutive inputs cannot shift bytes between each other.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    pub fn write_artifact(&mut self, a: &Artifact) {
        self.write_str(a.as_str());
    }

    pub fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

/// Fingerprint of a bare input document, used to detect a changed range base.
pub fn fingerprint_base(input: &Artifact) -> Fingerprint {
    let mut h = StableHasher::tagged(OpTag::Base);
    h.write_artifact(input);
    h.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/cache/fingerprint.rs"]
mod tests;
