mod buffer;

pub use buffer::BitsBuffer;

/// Alias used throughout the codec modules: a mutable, bit-addressable
/// cursor over a byte buffer used both for reading and writing dns
/// wire-format messages.
pub type BitsBuf = BitsBuffer;
