//! Strided views over engine-owned storage.
//!
//! A [`Layout`] maps a canonical flat index (row-major over `shape`) to an
//! element offset in a backing buffer. It covers C-ordered arrays,
//! Fortran-ordered arrays viewed through [`Layout::reversed`], and slices
//! such as one column of a two-column state array via [`Layout::select`].

use smallvec::{smallvec, SmallVec};

use crate::error::LayoutError;

type Dims = SmallVec<[usize; 4]>;
type Strides = SmallVec<[isize; 4]>;

/// Offset, shape and per-axis strides (in elements) of a native array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    offset: usize,
    shape: Dims,
    strides: Strides,
}

impl Layout {
    /// C-ordered layout: the last axis varies fastest.
    pub fn row_major(shape: &[usize]) -> Self {
        let mut strides: Strides = smallvec![0; shape.len()];
        let mut acc = 1isize;
        for (stride, &extent) in strides.iter_mut().zip(shape).rev() {
            *stride = acc;
            acc *= extent as isize;
        }
        Self {
            offset: 0,
            shape: shape.into(),
            strides,
        }
    }

    /// Fortran-ordered layout: the first axis varies fastest.
    ///
    /// The canonical order of the result still walks `shape` row-major, so
    /// a Fortran array `A(nx, ny)` is usually exposed as
    /// `Layout::column_major(&[nx, ny]).reversed()`, i.e. shape `[ny, nx]`.
    pub fn column_major(shape: &[usize]) -> Self {
        let mut strides: Strides = smallvec![0; shape.len()];
        let mut acc = 1isize;
        for (stride, &extent) in strides.iter_mut().zip(shape) {
            *stride = acc;
            acc *= extent as isize;
        }
        Self {
            offset: 0,
            shape: shape.into(),
            strides,
        }
    }

    /// A flat, contiguous run of `len` elements.
    pub fn contiguous(len: usize) -> Self {
        Self::row_major(&[len])
    }

    /// Arbitrary strided layout.
    ///
    /// # Errors
    ///
    /// [`LayoutError::RankMismatch`] if `shape` and `strides` differ in length.
    pub fn strided(offset: usize, shape: &[usize], strides: &[isize]) -> Result<Self, LayoutError> {
        if shape.len() != strides.len() {
            return Err(LayoutError::RankMismatch {
                shape: shape.len(),
                strides: strides.len(),
            });
        }
        Ok(Self {
            offset,
            shape: shape.into(),
            strides: strides.into(),
        })
    }

    /// Fix `axis` at `index`, dropping that axis.
    pub fn select(&self, axis: usize, index: usize) -> Result<Self, LayoutError> {
        let rank = self.rank();
        if axis >= rank {
            return Err(LayoutError::AxisOutOfRange { axis, rank });
        }
        let extent = self.shape[axis];
        if index >= extent {
            return Err(LayoutError::IndexOutOfRange {
                axis,
                index,
                extent,
            });
        }
        let offset = self.offset as isize + index as isize * self.strides[axis];
        if offset < 0 {
            return Err(LayoutError::NegativeOffset);
        }
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.remove(axis);
        strides.remove(axis);
        Ok(Self {
            offset: offset as usize,
            shape,
            strides,
        })
    }

    /// Reverse the axis order (Fortran view ↔ C view).
    pub fn reversed(&self) -> Self {
        Self {
            offset: self.offset,
            shape: self.shape.iter().rev().copied().collect(),
            strides: self.strides.iter().rev().copied().collect(),
        }
    }

    /// Offset of the first canonical element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Extents in canonical order.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Strides in elements, one per axis.
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of addressable elements. A rank-0 layout holds one.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the layout addresses no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether canonical order is a single contiguous run.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1isize;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if extent > 1 && stride != expected {
                return false;
            }
            expected *= extent as isize;
        }
        true
    }

    /// Verify every element lies inside a buffer of `available` elements.
    pub fn check_bounds(&self, available: usize) -> Result<(), LayoutError> {
        if self.is_empty() {
            return Ok(());
        }
        let mut lo = self.offset as isize;
        let mut hi = self.offset as isize;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides) {
            let reach = (extent as isize - 1) * stride;
            if reach >= 0 {
                hi += reach;
            } else {
                lo += reach;
            }
        }
        if lo < 0 {
            return Err(LayoutError::NegativeOffset);
        }
        let required = hi as usize + 1;
        if required > available {
            return Err(LayoutError::OutOfBounds {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Buffer offset of canonical element `flat`. `flat` must be `< len()`.
    pub fn offset_of(&self, flat: usize) -> usize {
        let mut rem = flat;
        let mut off = self.offset as isize;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides).rev() {
            off += (rem % extent) as isize * stride;
            rem /= extent;
        }
        off as usize
    }

    /// Buffer offsets of every element in canonical order.
    pub fn offsets(&self) -> Offsets<'_> {
        Offsets {
            layout: self,
            index: smallvec![0; self.rank()],
            next: self.offset as isize,
            remaining: self.len(),
        }
    }
}

/// Iterator returned by [`Layout::offsets`].
#[derive(Debug)]
pub struct Offsets<'a> {
    layout: &'a Layout,
    index: Dims,
    next: isize,
    remaining: usize,
}

impl Iterator for Offsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;
        if self.remaining > 0 {
            for axis in (0..self.layout.rank()).rev() {
                let stride = self.layout.strides[axis];
                self.index[axis] += 1;
                self.next += stride;
                if self.index[axis] < self.layout.shape[axis] {
                    break;
                }
                self.next -= stride * self.layout.shape[axis] as isize;
                self.index[axis] = 0;
            }
        }
        Some(current as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Offsets<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn row_major_is_identity() {
        let layout = Layout::row_major(&[2, 3]);
        assert_eq!(layout.strides(), &[3, 1]);
        assert!(layout.is_contiguous());
        assert_eq!(layout.offsets().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn fortran_array_flattens_row_major() {
        // A(nx=3, ny=2) in Fortran order, exposed as [ny, nx].
        let layout = Layout::column_major(&[3, 2]).reversed();
        assert_eq!(layout.shape(), &[2, 3]);
        // Column-major storage already walks x fastest.
        assert_eq!(layout.offsets().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);

        // A(ny=2, nx=3) in Fortran order needs a real transpose.
        let transposed = Layout::column_major(&[2, 3]);
        assert!(!transposed.is_contiguous());
        assert_eq!(
            transposed.offsets().collect::<Vec<_>>(),
            vec![0, 2, 4, 1, 3, 5]
        );
    }

    #[test]
    fn select_second_column_of_two_column_array() {
        // QLINK(nlinks, 2): column 2 holds the current values.
        let nlinks = 5;
        let layout = Layout::column_major(&[nlinks, 2]).select(1, 1).unwrap();
        assert_eq!(layout.offset(), nlinks);
        assert_eq!(layout.shape(), &[nlinks]);
        assert!(layout.is_contiguous());
        assert!(layout.check_bounds(2 * nlinks).is_ok());
        assert_eq!(layout.offsets().next(), Some(5));
    }

    #[test]
    fn select_middle_axis_of_soil_array() {
        // SOIL_M(nx=4, nsoil=3, ny=2), top layer as [ny, nx].
        let layout = Layout::column_major(&[4, 3, 2])
            .select(1, 0)
            .unwrap()
            .reversed();
        assert_eq!(layout.shape(), &[2, 4]);
        assert_eq!(layout.strides(), &[12, 1]);
        assert_eq!(
            layout.offsets().collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 12, 13, 14, 15]
        );
        assert!(layout.check_bounds(24).is_ok());
    }

    #[test]
    fn select_rejects_bad_axis_and_index() {
        let layout = Layout::row_major(&[2, 2]);
        assert_eq!(
            layout.select(2, 0),
            Err(LayoutError::AxisOutOfRange { axis: 2, rank: 2 })
        );
        assert_eq!(
            layout.select(0, 2),
            Err(LayoutError::IndexOutOfRange {
                axis: 0,
                index: 2,
                extent: 2
            })
        );
    }

    #[test]
    fn bounds_checks() {
        let layout = Layout::row_major(&[3, 3]);
        assert!(layout.check_bounds(9).is_ok());
        assert_eq!(
            layout.check_bounds(8),
            Err(LayoutError::OutOfBounds {
                required: 9,
                available: 8
            })
        );
        let backwards = Layout::strided(0, &[3], &[-1]).unwrap();
        assert_eq!(backwards.check_bounds(3), Err(LayoutError::NegativeOffset));
        let reversed_run = Layout::strided(2, &[3], &[-1]).unwrap();
        assert!(reversed_run.check_bounds(3).is_ok());
        assert_eq!(reversed_run.offsets().collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn rank_zero_holds_one_element() {
        let layout = Layout::row_major(&[]);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.offsets().collect::<Vec<_>>(), vec![0]);
        assert_eq!(layout.offset_of(0), 0);
    }

    #[test]
    fn strided_rejects_rank_mismatch() {
        assert_eq!(
            Layout::strided(0, &[2, 2], &[1]),
            Err(LayoutError::RankMismatch {
                shape: 2,
                strides: 1
            })
        );
    }

    fn shapes() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..5, 1..4)
    }

    proptest! {
        #[test]
        fn offsets_agree_with_offset_of(shape in shapes(), fortran in any::<bool>()) {
            let layout = if fortran {
                Layout::column_major(&shape)
            } else {
                Layout::row_major(&shape)
            };
            let offsets: Vec<usize> = layout.offsets().collect();
            prop_assert_eq!(offsets.len(), layout.len());
            for (flat, &off) in offsets.iter().enumerate() {
                prop_assert_eq!(layout.offset_of(flat), off);
            }
        }

        #[test]
        fn offsets_are_a_permutation(shape in shapes()) {
            let layout = Layout::column_major(&shape);
            let mut offsets: Vec<usize> = layout.offsets().collect();
            offsets.sort_unstable();
            prop_assert_eq!(offsets, (0..layout.len()).collect::<Vec<_>>());
            prop_assert!(layout.check_bounds(layout.len()).is_ok());
        }

        #[test]
        fn reversed_column_major_is_row_major(shape in shapes()) {
            let mut rev = shape.clone();
            rev.reverse();
            prop_assert_eq!(Layout::column_major(&shape).reversed(), Layout::row_major(&rev));
        }
    }
}
