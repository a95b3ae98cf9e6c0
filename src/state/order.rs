use crate::{ConfigError, EncodingError};

/// A permutation that maps each logical slice position to the physical slice read from the
/// buffer. Ordering changes which fields a prefix tree branches on first, and which fields
/// count as the free prefix of a [`TransitionFilter`](crate::TransitionFilter).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FieldOrder {
    positions: Vec<usize>,
}

impl FieldOrder {
    /// The natural order over `len` slices.
    pub fn identity(len: usize) -> Self {
        FieldOrder {
            positions: (0..len).collect(),
        }
    }

    /// Accepts `positions[logical] = physical`, which must be a permutation of `0..len`.
    pub fn from_positions(positions: Vec<usize>) -> Result<Self, EncodingError> {
        let len = positions.len();
        let mut seen = vec![false; len];
        let is_permutation = positions
            .iter()
            .all(|&p| p < len && !std::mem::replace(&mut seen[p], true));
        if !is_permutation {
            return Err(EncodingError::InvalidOrder { len, positions });
        }
        Ok(FieldOrder { positions })
    }

    /// Resolves an ordering given by field name. Fields listed in `preferred` come first, in the
    /// given order, followed by the remaining `fields` in their natural order.
    ///
    /// ```rust
    /// # use statetrie::FieldOrder;
    /// let order = FieldOrder::from_names(&["c", "a"], &["a", "b", "c"]).unwrap();
    /// assert_eq!(order.positions(), &[2, 0, 1]);
    /// ```
    pub fn from_names<P, F>(preferred: &[P], fields: &[F]) -> Result<Self, ConfigError>
    where
        P: AsRef<str>,
        F: AsRef<str>,
    {
        let mut positions = Vec::with_capacity(fields.len());
        for name in preferred {
            let name = name.as_ref();
            let position = fields
                .iter()
                .position(|f| f.as_ref() == name)
                .ok_or_else(|| ConfigError::UnknownField {
                    name: name.to_owned(),
                    available: fields.iter().map(|f| f.as_ref().to_owned()).collect(),
                })?;
            if positions.contains(&position) {
                return Err(ConfigError::DuplicateField(name.to_owned()));
            }
            positions.push(position);
        }
        for position in 0..fields.len() {
            if !positions.contains(&position) {
                positions.push(position);
            }
        }
        Ok(FieldOrder { positions })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The physical slice read at logical position `index`.
    pub fn physical(&self, index: usize) -> usize {
        self.positions[index]
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}
