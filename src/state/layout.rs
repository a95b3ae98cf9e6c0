use crate::{EncodingError, StateId};
use serde::{Deserialize, Serialize};

/// Slice width used when none is configured: the bit width of [`StateId`].
pub const DEFAULT_SLICE_WIDTH: u8 = StateId::BITS as u8;

/// Marker bits reserved at the start of each slice when none are configured.
pub const DEFAULT_RESERVED_BITS: u8 = 1;

/// How a [`StateBuffer`](crate::StateBuffer) divides into fixed-width slices.
///
/// Each slice occupies `width` bits. The first `reserved` bits of every slice are a marker that
/// is not part of the value; the remaining `payload_bits()` hold it. Payloads are at most 32 bits
/// wide so that every slice fits a `u32`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "RawLayout")]
pub struct SliceLayout {
    width: u8,
    reserved: u8,
}

/// Unvalidated fields of a deserialized [`SliceLayout`].
#[derive(Deserialize)]
struct RawLayout {
    width: u8,
    reserved: u8,
}

impl TryFrom<RawLayout> for SliceLayout {
    type Error = EncodingError;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        SliceLayout::new(raw.width, raw.reserved)
    }
}

impl SliceLayout {
    pub fn new(width: u8, reserved: u8) -> Result<Self, EncodingError> {
        let payload = width.checked_sub(reserved).unwrap_or(0);
        if width > 64 || payload == 0 || payload > 32 {
            return Err(EncodingError::InvalidLayout { width, reserved });
        }
        Ok(SliceLayout { width, reserved })
    }

    /// A layout without marker bits.
    pub fn packed(width: u8) -> Result<Self, EncodingError> {
        Self::new(width, 0)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn reserved(&self) -> u8 {
        self.reserved
    }

    pub fn payload_bits(&self) -> u8 {
        self.width - self.reserved
    }

    /// Largest value a slice can hold.
    pub fn max_value(&self) -> u32 {
        (u32::MAX as u64 >> (32 - self.payload_bits() as u32)) as u32
    }

    pub fn fits(&self, value: u32) -> bool {
        value <= self.max_value()
    }

    /// Number of whole slices in `bit_len` bits. A remainder indicates the layout does not
    /// describe the buffer.
    pub fn slice_count(&self, bit_len: usize) -> Result<usize, EncodingError> {
        let width = self.width as usize;
        if bit_len % width != 0 {
            return Err(EncodingError::Misaligned {
                bits: bit_len,
                width: self.width,
            });
        }
        Ok(bit_len / width)
    }
}

impl Default for SliceLayout {
    fn default() -> Self {
        SliceLayout {
            width: DEFAULT_SLICE_WIDTH,
            reserved: DEFAULT_RESERVED_BITS,
        }
    }
}
