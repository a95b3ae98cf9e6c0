use crate::{EncodingError, SliceLayout};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};

const WORD_BITS: usize = 64;

/// A fixed-length bit sequence holding one encoded state.
///
/// Bit `0` is the most significant bit of the first word, so fields read left to right in the
/// same order they are written. Bits past [`StateBuffer::bit_len`] are always zero, which keeps
/// derived equality and hashing a pure function of the encoded bits.
///
/// Buffers are created by a [`Generator`](crate::Generator) and are not mutated once handed to
/// the explorer.
#[derive(Clone, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "RawBuffer")]
pub struct StateBuffer {
    bit_len: usize,
    words: Box<[u64]>,
}

/// Unvalidated fields of a deserialized [`StateBuffer`].
#[derive(Deserialize)]
struct RawBuffer {
    bit_len: usize,
    words: Box<[u64]>,
}

impl TryFrom<RawBuffer> for StateBuffer {
    type Error = EncodingError;

    /// Requires exactly enough words for `bit_len` and clears any bits past the end.
    fn try_from(raw: RawBuffer) -> Result<Self, Self::Error> {
        let RawBuffer { bit_len, mut words } = raw;
        let expected = word_count(bit_len);
        if words.len() != expected {
            return Err(EncodingError::WordCount {
                bit_len,
                expected,
                words: words.len(),
            });
        }
        let used = bit_len % WORD_BITS;
        if used != 0 {
            if let Some(last) = words.last_mut() {
                *last &= !(u64::MAX >> used);
            }
        }
        Ok(StateBuffer { bit_len, words })
    }
}

fn word_count(bit_len: usize) -> usize {
    (bit_len + WORD_BITS - 1) / WORD_BITS
}

impl StateBuffer {
    /// Constructs a zeroed buffer of `bit_len` bits.
    pub fn new(bit_len: usize) -> Self {
        StateBuffer {
            bit_len,
            words: vec![0; word_count(bit_len)].into_boxed_slice(),
        }
    }

    /// Packs one slice per value. Reserved marker bits are left at zero.
    ///
    /// ```rust
    /// # use statetrie::{SliceLayout, StateBuffer, StateView};
    /// let layout = SliceLayout::new(8, 1).unwrap();
    /// let buffer = StateBuffer::from_slices(&[3, 127], &layout).unwrap();
    /// assert_eq!(buffer.bit_len(), 16);
    /// assert_eq!(StateView::new(&buffer, layout).unwrap().to_vec(), vec![3, 127]);
    /// ```
    pub fn from_slices(values: &[u32], layout: &SliceLayout) -> Result<Self, EncodingError> {
        let width = layout.width() as usize;
        let mut buffer = StateBuffer::new(values.len() * width);
        for (i, &value) in values.iter().enumerate() {
            if !layout.fits(value) {
                return Err(EncodingError::Overflow {
                    value,
                    payload_bits: layout.payload_bits(),
                });
            }
            buffer.set_from_int(
                i * width + layout.reserved() as usize,
                layout.payload_bits(),
                value as u64,
            );
        }
        Ok(buffer)
    }

    /// Number of bits in the buffer.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Reads `width` bits starting at `offset` as an unsigned integer. Panics if the range
    /// extends past the end of the buffer or `width > 64`.
    pub fn get_as_int(&self, offset: usize, width: u8) -> u64 {
        self.check_range(offset, width);
        if width == 0 {
            return 0;
        }
        let width = width as usize;
        let word = offset / WORD_BITS;
        let shift = offset % WORD_BITS;
        let mut value = self.words[word] << shift;
        if shift + width > WORD_BITS {
            value |= self.words[word + 1] >> (WORD_BITS - shift);
        }
        value >> (WORD_BITS - width)
    }

    /// Writes the low `width` bits of `value` starting at `offset`. Higher bits of `value` are
    /// ignored. Panics under the same conditions as [`StateBuffer::get_as_int`].
    pub fn set_from_int(&mut self, offset: usize, width: u8, value: u64) {
        self.check_range(offset, width);
        if width == 0 {
            return;
        }
        let width = width as usize;
        let value = value & mask(width);
        let word = offset / WORD_BITS;
        let shift = offset % WORD_BITS;
        if shift + width <= WORD_BITS {
            let lsb = WORD_BITS - shift - width;
            let field = mask(width) << lsb;
            self.words[word] = (self.words[word] & !field) | (value << lsb);
        } else {
            let high_width = WORD_BITS - shift;
            let low_width = width - high_width;
            self.words[word] = (self.words[word] & !mask(high_width)) | (value >> low_width);
            let lsb = WORD_BITS - low_width;
            let field = mask(low_width) << lsb;
            self.words[word + 1] = (self.words[word + 1] & !field) | (value << lsb);
        }
    }

    fn check_range(&self, offset: usize, width: u8) {
        if width as usize > WORD_BITS || offset + width as usize > self.bit_len {
            panic!(
                "Bit range out of bounds. offset={}, width={}, len={}",
                offset, width, self.bit_len
            );
        }
    }
}

fn mask(width: usize) -> u64 {
    if width >= WORD_BITS {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

impl Debug for StateBuffer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "StateBuffer(")?;
        for i in 0..self.bit_len {
            write!(f, "{}", self.get_as_int(i, 1))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_back_fields_spanning_words() {
        let mut buffer = StateBuffer::new(130);
        buffer.set_from_int(0, 3, 0b101);
        buffer.set_from_int(60, 10, 0b11_0000_0011);
        buffer.set_from_int(66, 64, u64::MAX - 1);
        assert_eq!(buffer.get_as_int(0, 3), 0b101);
        assert_eq!(buffer.get_as_int(60, 6), 0b11_0000);
        assert_eq!(buffer.get_as_int(66, 64), u64::MAX - 1);
        assert_eq!(buffer.get_as_int(129, 1), 0);
        assert_eq!(buffer.get_as_int(128, 1), 1);
    }

    #[test]
    fn overwrites_only_the_addressed_bits() {
        let mut buffer = StateBuffer::new(96);
        buffer.set_from_int(0, 64, u64::MAX);
        buffer.set_from_int(62, 4, 0);
        assert_eq!(buffer.get_as_int(0, 62), (1 << 62) - 1);
        assert_eq!(buffer.get_as_int(62, 4), 0);
        assert_eq!(buffer.get_as_int(66, 30), 0);
    }

    #[test]
    fn from_slices_rejects_values_wider_than_the_payload() {
        let layout = SliceLayout::new(4, 1).unwrap();
        assert_eq!(
            StateBuffer::from_slices(&[7, 8], &layout),
            Err(EncodingError::Overflow { value: 8, payload_bits: 3 })
        );
    }

    #[test]
    fn from_slices_leaves_marker_bits_clear() {
        let layout = SliceLayout::new(4, 1).unwrap();
        let buffer = StateBuffer::from_slices(&[7, 7], &layout).unwrap();
        assert_eq!(buffer.get_as_int(0, 8), 0b0111_0111);
    }

    #[test]
    fn separately_built_buffers_compare_equal() {
        let layout = SliceLayout::default();
        let a = StateBuffer::from_slices(&[1, 2, 3], &layout).unwrap();
        let mut b = StateBuffer::new(96);
        b.set_from_int(1, 31, 1);
        b.set_from_int(33, 31, 2);
        b.set_from_int(65, 31, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn deserializing_clears_bits_past_the_end() {
        let raw: StateBuffer = serde_json::from_str(r#"{"bit_len":4,"words":[1]}"#).unwrap();
        assert_eq!(raw, StateBuffer::new(4));

        let mut expected = StateBuffer::new(68);
        expected.set_from_int(0, 64, u64::MAX);
        expected.set_from_int(64, 4, 0b1010);
        // the second word carries 0b1010 followed by stray low bits
        let json = format!(
            r#"{{"bit_len":68,"words":[{},{}]}}"#,
            u64::MAX,
            0xA000_0000_0000_0005u64
        );
        let raw: StateBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(raw, expected);
        let round_trip: StateBuffer =
            serde_json::from_str(&serde_json::to_string(&expected).unwrap()).unwrap();
        assert_eq!(round_trip, expected);
    }

    #[test]
    fn deserializing_rejects_mismatched_word_counts() {
        let error = serde_json::from_str::<StateBuffer>(r#"{"bit_len":65,"words":[0]}"#)
            .unwrap_err()
            .to_string();
        assert!(error.contains("needs 2 words but has 1"), "{}", error);
        assert!(serde_json::from_str::<StateBuffer>(r#"{"bit_len":0,"words":[7]}"#).is_err());
    }

    #[test]
    #[should_panic(expected = "Bit range out of bounds. offset=60, width=8, len=64")]
    fn panics_past_the_end() {
        StateBuffer::new(64).get_as_int(60, 8);
    }
}
