//! Fixed-width big-endian integer encoding.
//!
//! Every integer in a cache file (header fields and message spans) is stored
//! most-significant byte first, so a file written on one architecture reads
//! back identically on any other.

/// An unsigned integer with a fixed on-disk width.
pub trait FixedWidth: Copy + Sized {
    /// Number of bytes the encoded value occupies.
    const STORAGE_LENGTH: usize;

    /// Writes the big-endian encoding into the first
    /// [`Self::STORAGE_LENGTH`](FixedWidth::STORAGE_LENGTH) bytes of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than `STORAGE_LENGTH`.
    fn encode_into(self, buf: &mut [u8]);

    /// Decodes a value from the first `STORAGE_LENGTH` bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `STORAGE_LENGTH`. Callers read
    /// exactly that many bytes before decoding.
    fn decode(bytes: &[u8]) -> Self;

    /// Returns the big-endian encoding as an owned buffer.
    fn encode(self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::STORAGE_LENGTH];
        self.encode_into(&mut buf);
        buf
    }
}

macro_rules! impl_fixed_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedWidth for $ty {
                const STORAGE_LENGTH: usize = std::mem::size_of::<$ty>();

                fn encode_into(self, buf: &mut [u8]) {
                    buf[..Self::STORAGE_LENGTH].copy_from_slice(&self.to_be_bytes());
                }

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::STORAGE_LENGTH]);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64);
