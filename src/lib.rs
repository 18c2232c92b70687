//! Volumetric replication padding for `ndarray`.
//!
//! Pads (or crops) the three trailing spatial axes of a `(C, D, H, W)` or
//! `(N, C, D, H, W)` array by replicating its border samples, and propagates
//! gradients back through the same mapping.
//!
//! ```
//! use ndarray::prelude::*;
//! use ndarray_replication_pad::{Padding3d, ReplicationPad3dExt};
//!
//! let x = Array::<f32, _>::ones((1, 2, 2, 2));
//! let y = x.replication_pad3d(Padding3d::uniform(1)).unwrap();
//! assert_eq!(y.shape(), &[1, 4, 4, 4]);
//!
//! let g = x.replication_pad3d_backward(&Array::ones(y.raw_dim()), Padding3d::uniform(1)).unwrap();
//! assert!(g.iter().all(|&v| v == 8.0));
//! ```

mod padding;
mod shape;

pub use padding::{map_source_index, ReplicationPad3dExt};
pub use shape::{ShapeAxis, VolumeShape};

use thiserror::Error;

/// Padding amounts for the width, height and depth axes.
///
/// Negative amounts crop instead of pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Padding3d {
    pub left: isize,
    pub right: isize,
    pub top: isize,
    pub bottom: isize,
    pub front: isize,
    pub back: isize,
}

impl Padding3d {
    /// Amounts in torch `F.pad` order: width, then height, then depth.
    pub fn new(left: isize, right: isize, top: isize, bottom: isize, front: isize, back: isize) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            front,
            back,
        }
    }

    /// Same amount on all six sides.
    pub fn uniform(pad: isize) -> Self {
        Self::new(pad, pad, pad, pad, pad, pad)
    }

    /// `(before, after)` pairs shared by each axis.
    pub fn symmetric(width: isize, height: isize, depth: isize) -> Self {
        Self::new(width, width, height, height, depth, depth)
    }

    /// True when nothing is cropped.
    pub fn is_non_negative(&self) -> bool {
        [self.left, self.right, self.top, self.bottom, self.front, self.back]
            .iter()
            .all(|&p| p >= 0)
    }

    /// `[before, after]` for the depth, height and width axes, in that order.
    pub(crate) fn per_axis(&self) -> [[isize; 2]; 3] {
        [
            [self.front, self.back],
            [self.top, self.bottom],
            [self.left, self.right],
        ]
    }

    /// Shape that padding an array of `input_shape` would produce.
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, PadError> {
        let input = VolumeShape::from_shape(input_shape)?;
        Ok(input.padded(self)?.to_vec())
    }
}

// torch `F.pad` order: (left, right, top, bottom, front, back)
impl From<[isize; 6]> for Padding3d {
    fn from(p: [isize; 6]) -> Self {
        Self::new(p[0], p[1], p[2], p[3], p[4], p[5])
    }
}

#[derive(Debug, Error)]
pub enum PadError {
    #[error("non-empty 4D or 5D (batch mode) tensor expected, but got a {0}D tensor")]
    InvalidRank(usize),

    #[error("non-empty 4D or 5D (batch mode) tensor expected, but got an empty tensor of shape {0:?}")]
    EmptyTensor(Vec<usize>),

    #[error(
        "input (D: {} H: {} W: {}) is too small. Calculated output D: {} H: {} W: {}",
        .input[0], .input[1], .input[2], .output[0], .output[1], .output[2]
    )]
    InvalidOutputShape {
        input: [usize; 3],
        output: [isize; 3],
    },

    #[error("padding {padding:?} of input (D: {} H: {} W: {}) overflows the output shape", .input[0], .input[1], .input[2])]
    ShapeOverflow {
        input: [usize; 3],
        padding: Padding3d,
    },

    #[error("{axis} unexpected. Expected: {expected}, Got: {got}")]
    ShapeMismatch {
        axis: ShapeAxis,
        expected: usize,
        got: usize,
    },

    #[error("{0} must be in standard (contiguous) layout")]
    NonContiguous(&'static str),

    /// Internal only: reshaping a validated, standard-layout buffer into
    /// channel slices cannot fail.
    #[error(transparent)]
    Layout(#[from] ndarray::ShapeError),
}
