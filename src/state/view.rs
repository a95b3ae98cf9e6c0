use crate::{EncodingError, FieldOrder, SliceLayout, StateBuffer};
use std::fmt::{self, Display, Formatter};
use std::iter::FusedIterator;

/// A read-only interpretation of a [`StateBuffer`] as a sequence of `u32` slices.
///
/// The view borrows its buffer, so copying a view never copies state bits. Two views are equal
/// when their buffers are equal, regardless of where each buffer lives.
///
/// ```rust
/// # use statetrie::{SliceLayout, StateBuffer, StateView};
/// let layout = SliceLayout::new(8, 1).unwrap();
/// let buffer = StateBuffer::from_slices(&[5, 7, 9], &layout).unwrap();
/// let view = StateView::new(&buffer, layout).unwrap();
/// assert_eq!(view.len(), 3);
/// assert_eq!(view.get(1), 7);
/// assert_eq!(view.iter().collect::<Vec<_>>(), vec![5, 7, 9]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct StateView<'a> {
    buffer: &'a StateBuffer,
    layout: SliceLayout,
    order: Option<&'a FieldOrder>,
    len: usize,
}

impl<'a> StateView<'a> {
    /// Fails if the buffer length is not a whole multiple of the layout's slice width.
    pub fn new(buffer: &'a StateBuffer, layout: SliceLayout) -> Result<Self, EncodingError> {
        let len = layout.slice_count(buffer.bit_len())?;
        Ok(StateView {
            buffer,
            layout,
            order: None,
            len,
        })
    }

    /// Reads slices through `order`, which must cover exactly [`StateView::len`] slices.
    pub fn with_order(self, order: &'a FieldOrder) -> Result<Self, EncodingError> {
        if order.len() != self.len {
            return Err(EncodingError::OrderLength {
                order_len: order.len(),
                len: self.len,
            });
        }
        Ok(StateView {
            order: Some(order),
            ..self
        })
    }

    pub fn buffer(&self) -> &'a StateBuffer {
        self.buffer
    }

    pub fn layout(&self) -> SliceLayout {
        self.layout
    }

    /// Number of whole slices in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns slice `index`. Panics if `index >= self.len()`.
    pub fn get(&self, index: usize) -> u32 {
        match self.checked_get(index) {
            Some(value) => value,
            None => panic!("{}", EncodingError::OutOfBounds { index, len: self.len }),
        }
    }

    pub fn checked_get(&self, index: usize) -> Option<u32> {
        if index >= self.len {
            return None;
        }
        let physical = match self.order {
            Some(order) => order.physical(index),
            None => index,
        };
        let offset = physical * self.layout.width() as usize + self.layout.reserved() as usize;
        Some(self.buffer.get_as_int(offset, self.layout.payload_bits()) as u32)
    }

    /// Iterates slices from `0` to `len() - 1`. Call again to restart.
    pub fn iter(&self) -> Slices<'a> {
        self.slices_from(0)
    }

    /// Iterates slices from `pos` to the end. Panics if `pos > self.len()`.
    pub fn slices_from(&self, pos: usize) -> Slices<'a> {
        if pos > self.len {
            panic!("{}", EncodingError::OutOfBounds { index: pos, len: self.len });
        }
        Slices {
            view: *self,
            front: pos,
            back: self.len,
        }
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl PartialEq for StateView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer
    }
}

impl Eq for StateView<'_> {}

impl Display for StateView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

impl<'a> IntoIterator for StateView<'a> {
    type Item = u32;
    type IntoIter = Slices<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &StateView<'a> {
    type Item = u32;
    type IntoIter = Slices<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazily reads the slices of a [`StateView`].
#[derive(Clone, Debug)]
pub struct Slices<'a> {
    view: StateView<'a>,
    front: usize,
    back: usize,
}

impl Iterator for Slices<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.front == self.back {
            return None;
        }
        let value = self.view.checked_get(self.front);
        self.front += 1;
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Slices<'_> {
    fn next_back(&mut self) -> Option<u32> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.view.checked_get(self.back)
    }
}

impl ExactSizeIterator for Slices<'_> {}

impl FusedIterator for Slices<'_> {}
