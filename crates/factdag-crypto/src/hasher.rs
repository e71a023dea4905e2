use std::io;

use factdag_types::Hash;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is fed to BLAKE3 ahead of the payload, followed by a `:`
/// separator, so identical bytes hashed under different domains never
/// collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for serialized DAG nodes.
    pub const NODE: Self = Self {
        domain: "factdag-node-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Hash {
        let mut hasher = self.streaming();
        hasher.update(data);
        hasher.finalize()
    }

    /// Start an incremental hash under this domain.
    pub fn streaming(&self) -> StreamingHasher {
        let mut inner = blake3::Hasher::new();
        inner.update(self.domain.as_bytes());
        inner.update(b":");
        StreamingHasher { inner }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Incremental, domain-separated hasher.
///
/// Implements [`io::Write`] so serializers can write straight into it.
pub struct StreamingHasher {
    inner: blake3::Hasher,
}

impl StreamingHasher {
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    pub fn finalize(&self) -> Hash {
        Hash::from_digest(*self.inner.finalize().as_bytes())
    }
}

impl io::Write for StreamingHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
