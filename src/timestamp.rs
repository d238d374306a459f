use std::fmt;

/// Represents a BSON timestamp value.
///
/// The `time` field holds seconds since the Unix epoch and `increment` disambiguates values
/// within the same second. On the wire the increment is written first.
#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing value to order timestamps with the same number of seconds in the `time`
    /// field.
    pub increment: u32,
}

impl Timestamp {
    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        let mut out = [0; 8];
        out[0..4].copy_from_slice(&self.increment.to_le_bytes());
        out[4..8].copy_from_slice(&self.time.to_le_bytes());
        out
    }

    pub(crate) fn from_le_bytes(bytes: [u8; 8]) -> Self {
        let mut increment = [0; 4];
        increment.copy_from_slice(&bytes[0..4]);
        let mut time = [0; 4];
        time.copy_from_slice(&bytes[4..8]);
        Self {
            time: u32::from_le_bytes(time),
            increment: u32::from_le_bytes(increment),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.time, self.increment)
    }
}
