//! Deterministic fingerprints for loaded artefacts.
//!
//! Logged at startup so operators can tell which exported model a process
//! is serving without diffing files.

/// Tiny FNV-1a hash over artefact bytes. Not cryptographic.
#[derive(Copy, Clone, Debug)]
pub struct ArtefactDigest(u32);

impl ArtefactDigest {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(2_166_136_261)
    }

    /// Convenience for hashing a whole buffer in one go.
    pub fn of(bytes: &[u8]) -> Self {
        let mut digest = Self::new();
        digest.update(bytes);
        digest
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ (*b as u32)).wrapping_mul(16_777_619);
        }
    }

    pub fn finish32(&self) -> u32 {
        self.0
    }

    /// 8-character lowercase hex form used in log lines.
    pub fn finish_hex(&self) -> String {
        format!("{:08x}", self.0)
    }
}

impl Default for ArtefactDigest {
    fn default() -> Self {
        Self::new()
    }
}
