use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de,
};
use std::{
    fmt,
    str::FromStr,
};

/// A 20-byte account address. The zero address marks freshly minted tokens
/// in transfer logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_hex(raw: &str) -> Result<Self, hex::FromHexError> {
        let cleaned = raw.trim().trim_start_matches("0x");
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(cleaned, &mut bytes)?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Address::from_hex(raw)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::from_hex(&raw).map_err(de::Error::custom)
    }
}

/// A 32-byte event-log topic word.
///
/// Indexed integers occupy the low bytes; indexed addresses are left-padded
/// to the full word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic(pub [u8; 32]);

impl Topic {
    pub fn from_hex(raw: &str) -> Result<Self, hex::FromHexError> {
        let cleaned = raw.trim().trim_start_matches("0x");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(cleaned, &mut bytes)?;
        Ok(Topic(bytes))
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Topic(bytes)
    }

    pub fn from_address(address: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(&address.0);
        Topic(bytes)
    }

    /// Decodes the word as an unsigned integer, or `None` when the value
    /// does not fit in 64 bits.
    pub fn as_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|byte| *byte != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(low))
    }

    /// Decodes the word as a left-padded address, or `None` when the
    /// padding bytes are not zero.
    pub fn as_address(&self) -> Option<Address> {
        if self.0[..12].iter().any(|byte| *byte != 0) {
            return None;
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&self.0[12..]);
        Some(Address(bytes))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({self})")
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Topic::from_hex(&raw).map_err(de::Error::custom)
    }
}

/// Opaque transaction identifier handed back by the chain client.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.0)
    }
}

impl From<&str> for TxHash {
    fn from(raw: &str) -> Self {
        TxHash(raw.to_string())
    }
}

/// One event-log entry from a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub topics: Vec<Topic>,
    #[serde(with = "hex_data", default)]
    pub data: Vec<u8>,
}

impl LogEntry {
    pub fn new(topics: Vec<Topic>) -> Self {
        LogEntry {
            topics,
            data: Vec::new(),
        }
    }
}

/// The mined outcome of a purchase transaction, read-only to the reconciler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub purchaser: Address,
    pub succeeded: bool,
    pub logs: Vec<LogEntry>,
}

mod hex_data {
    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
        de,
    };

    pub fn serialize<S: Serializer>(
        data: &[u8],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format!("0x{}", hex::encode(data)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        hex::decode(raw.trim().trim_start_matches("0x")).map_err(de::Error::custom)
    }
}
