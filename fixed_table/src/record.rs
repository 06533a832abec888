//! Records stored in a [FixedTable](crate::FixedTable).
use std::fmt;

/// A value that can be stored in a [FixedTable](crate::FixedTable).
///
/// Each record carries its own key. The remaining contents of a record are a payload owned by the
/// caller, which the table never inspects.
pub trait Record {
    /// The key type used to look up records.
    type Key: ?Sized;

    /// Returns a fresh record for `key` with an all-default payload.
    ///
    /// This is called whenever an insertion claims a new slot.
    fn with_key(key: &Self::Key) -> Self;

    /// Returns the key this record was created with.
    fn key(&self) -> &Self::Key;
}

/// A record of `RECORD` raw bytes, whose leading `KEY` bytes are its key.
///
/// The remaining `RECORD - KEY` bytes are a payload, zeroed when the record is inserted. Using a
/// layout with `RECORD == 0` or `KEY > RECORD` fails to compile.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteRecord<const RECORD: usize, const KEY: usize> {
    bytes: [u8; RECORD],
}

impl<const RECORD: usize, const KEY: usize> ByteRecord<RECORD, KEY> {
    const LAYOUT: () = {
        assert!(RECORD > 0, "record size must be non-zero");
        assert!(KEY <= RECORD, "key size must not exceed the record size");
    };

    /// Size of the whole record in bytes.
    pub const RECORD_SIZE: usize = RECORD;
    /// Size of the key in bytes.
    pub const KEY_SIZE: usize = KEY;

    /// Returns all bytes of the record, starting with the key.
    pub fn as_bytes(&self) -> &[u8; RECORD] {
        &self.bytes
    }

    /// Returns the payload bytes following the key.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[KEY..]
    }

    /// Returns the payload bytes following the key for modification.
    ///
    /// The key itself cannot be modified, as that would break the table's lookup invariant.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[KEY..]
    }
}

impl<const RECORD: usize, const KEY: usize> Record for ByteRecord<RECORD, KEY> {
    type Key = [u8];

    /// Panics if `key` is not exactly `KEY` bytes long.
    fn with_key(key: &[u8]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::LAYOUT;
        assert_eq!(key.len(), KEY, "key must be exactly {KEY} bytes");
        let mut bytes = [0; RECORD];
        bytes[..KEY].copy_from_slice(key);
        ByteRecord { bytes }
    }

    fn key(&self) -> &[u8] {
        &self.bytes[..KEY]
    }
}

impl<const RECORD: usize, const KEY: usize> fmt::Debug for ByteRecord<RECORD, KEY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRecord")
            .field("key", &self.key())
            .field("payload", &self.payload())
            .finish()
    }
}
