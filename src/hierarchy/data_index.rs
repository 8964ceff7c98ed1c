use crate::{node::VarId, CdsError};

#[cfg(feature = "ndarray")]
use crate::data_type::Element;

use super::Hierarchy;

/// A multi-dimensional index over the flat data of a variable.
///
/// The index maps nested subscripts `[sample][j][k]...` to element offsets in the variable data.
/// Its lengths are `[sample_count - sample_start, dims[1].length, dims[2].length, ...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataIndex {
    sample_start: usize,
    offset: usize,
    lengths: Vec<usize>,
    strides: Vec<usize>,
}

impl DataIndex {
    fn new(sample_start: usize, lengths: Vec<usize>) -> Self {
        let mut strides = vec![1; lengths.len()];
        for i in (0..lengths.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * lengths[i + 1];
        }
        let offset = sample_start * strides.first().copied().unwrap_or(0);
        Self {
            sample_start,
            offset,
            lengths,
            strides,
        }
    }

    /// Returns the first sample covered by the index.
    #[must_use]
    pub const fn sample_start(&self) -> usize {
        self.sample_start
    }

    /// Returns the length of each index dimension.
    #[must_use]
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Returns the element stride of each index dimension.
    #[must_use]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the element offset in the variable data of the element at `subscripts`.
    ///
    /// Returns [`None`] if the number of subscripts is wrong or a subscript is out of bounds.
    #[must_use]
    pub fn offset_of(&self, subscripts: &[usize]) -> Option<usize> {
        if subscripts.len() != self.lengths.len() {
            return None;
        }
        std::iter::zip(subscripts, std::iter::zip(&self.lengths, &self.strides)).try_fold(
            self.offset,
            |offset, (&subscript, (&length, &stride))| {
                (subscript < length).then_some(offset + subscript * stride)
            },
        )
    }
}

impl Hierarchy {
    /// Build the data index of a variable starting at sample `sample_start`, replacing any existing one.
    ///
    /// The index is discarded when the data is reallocated, deleted, or converted to a type of a different size.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the variable holds no data, or `sample_start` is past the last sample.
    pub fn create_var_data_index(&mut self, id: VarId, sample_start: usize) -> Result<&DataIndex, CdsError> {
        let var = self.var_ref(id)?;
        if var.data.is_none() || sample_start >= var.sample_count {
            return Err(CdsError::invalid(format!(
                "could not index {}: no data at sample {sample_start}",
                self.describe(id)
            )));
        }
        let lengths = if var.dims.is_empty() {
            Vec::new()
        } else {
            std::iter::once(var.sample_count - sample_start)
                .chain(
                    var.dims
                        .iter()
                        .skip(1)
                        .map(|&dim| self.dim(dim).map_or(0, |dim| dim.length)),
                )
                .collect()
        };
        let var = self.var_mut(id)?;
        Ok(var.data_index.insert(DataIndex::new(sample_start, lengths)))
    }

    /// Returns a shaped view of the data of a variable from sample `sample_start`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, `T` does not match the variable type, or there is no data at `sample_start`.
    #[cfg(feature = "ndarray")]
    pub fn var_ndarray<T: Element>(
        &self,
        id: VarId,
        sample_start: usize,
    ) -> Result<ndarray::ArrayViewD<'_, T>, CdsError> {
        let var = self.var_ref(id)?;
        let shape: Vec<usize> = if var.dims.is_empty() {
            Vec::new()
        } else {
            std::iter::once(var.sample_count.saturating_sub(sample_start))
                .chain(
                    var.dims
                        .iter()
                        .skip(1)
                        .map(|&dim| self.dim(dim).map_or(0, |dim| dim.length)),
                )
                .collect()
        };
        let samples = self.var_samples::<T>(id, sample_start.min(var.sample_count), None)?;
        ndarray::ArrayViewD::from_shape(shape, samples)
            .map_err(|err| CdsError::invalid(format!("{}: {err}", self.describe(id))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataArray, DataType};

    #[test]
    fn data_index_offsets() {
        let index = DataIndex::new(1, vec![2, 3, 4]);
        assert_eq!(index.strides(), [12, 4, 1]);
        assert_eq!(index.offset_of(&[0, 0, 0]), Some(12));
        assert_eq!(index.offset_of(&[1, 2, 3]), Some(12 + 12 + 8 + 3));
        assert_eq!(index.offset_of(&[2, 0, 0]), None);
        assert_eq!(index.offset_of(&[0, 0]), None);

        let scalar = DataIndex::new(0, Vec::new());
        assert_eq!(scalar.offset_of(&[]), Some(0));
    }

    #[test]
    fn data_index_invalidated_by_reallocation() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        hierarchy.define_dim(root, "range", 2, false).unwrap();
        let var = hierarchy
            .define_var(root, "v", DataType::Int, &["time", "range"])
            .unwrap();
        assert!(hierarchy.create_var_data_index(var, 0).is_err());

        hierarchy
            .set_var_data(var, &DataArray::from(vec![0i32, 1, 10, 11]), 0, None)
            .unwrap();
        let index = hierarchy.create_var_data_index(var, 1).unwrap();
        assert_eq!(index.lengths(), [1, 2]);
        let offset = index.offset_of(&[0, 1]).unwrap();
        assert_eq!(hierarchy.var_data(var).unwrap().get(offset), Some(crate::Value::Int(11)));
        assert!(hierarchy.var(var).unwrap().data_index().is_some());

        hierarchy
            .set_var_data(var, &DataArray::from(vec![20i32, 21]), 2, None)
            .unwrap();
        assert!(hierarchy.var(var).unwrap().data_index().is_none());
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn var_ndarray_view() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        hierarchy.define_dim(root, "range", 3, false).unwrap();
        let var = hierarchy
            .define_var(root, "v", DataType::Float, &["time", "range"])
            .unwrap();
        hierarchy
            .set_var_data(
                var,
                &DataArray::from(vec![0.0f32, 1.0, 2.0, 10.0, 11.0, 12.0]),
                0,
                None,
            )
            .unwrap();
        let view = hierarchy.var_ndarray::<f32>(var, 0).unwrap();
        assert_eq!(view.shape(), [2, 3]);
        assert_eq!(view[[1, 2]], 12.0);
        let tail = hierarchy.var_ndarray::<f32>(var, 1).unwrap();
        assert_eq!(tail.shape(), [1, 3]);
        assert!(hierarchy.var_ndarray::<i32>(var, 0).is_err());
    }
}
