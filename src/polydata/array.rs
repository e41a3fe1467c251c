/// Marker for an id that does not exist, e.g. a contact point that does not
/// coincide with any input point.
pub const NOT_SET: i64 = -1;

/// A named array of integer tuples attached to cells or points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdArray {
    pub name: String,
    /// Number of values per tuple.
    pub components: usize,
    pub values: Vec<i64>,
}

impl IdArray {
    pub fn new(name: impl Into<String>, components: usize) -> Self {
        Self {
            name: name.into(),
            components: components.max(1),
            values: Vec::new(),
        }
    }

    pub fn from_values(name: impl Into<String>, components: usize, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            components: components.max(1),
            values,
        }
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: i64) {
        self.values.push(value);
    }

    /// Append one tuple; missing components are filled with [`NOT_SET`].
    pub fn push_tuple(&mut self, tuple: &[i64]) {
        for c in 0..self.components {
            self.values.push(tuple.get(c).copied().unwrap_or(NOT_SET));
        }
    }

    pub fn tuple(&self, index: usize) -> Option<&[i64]> {
        let start = index * self.components;
        self.values.get(start..start + self.components)
    }

    /// First component of tuple `index`.
    pub fn value(&self, index: usize) -> Option<i64> {
        self.values.get(index * self.components).copied()
    }

    /// Keep the tuples whose `keep` flag is set.
    pub(crate) fn retain_tuples(&mut self, keep: &[bool]) {
        let components = self.components;
        let mut values = Vec::with_capacity(self.values.len());
        for (tuple, _) in self
            .values
            .chunks_exact(components)
            .zip(keep.iter())
            .filter(|(_, k)| **k)
        {
            values.extend_from_slice(tuple);
        }
        self.values = values;
    }

    /// Tuples reordered by `order` (new position -> old position).
    pub(crate) fn reordered(&self, order: &[usize]) -> Self {
        let mut out = IdArray::new(self.name.clone(), self.components);
        for &old in order {
            if let Some(t) = self.tuple(old) {
                out.values.extend_from_slice(t);
            }
        }
        out
    }
}
