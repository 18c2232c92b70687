use std::fmt;

use crate::{PadError, Padding3d};

/// Axis named in a [`PadError::ShapeMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeAxis {
    Rank,
    Batch,
    Channels,
    Depth,
    Height,
    Width,
}

impl fmt::Display for ShapeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeAxis::Rank => "rank",
            ShapeAxis::Batch => "batch size",
            ShapeAxis::Channels => "channels",
            ShapeAxis::Depth => "depth",
            ShapeAxis::Height => "height",
            ShapeAxis::Width => "width",
        };
        f.write_str(name)
    }
}

/// Extents of a `(C, D, H, W)` or `(N, C, D, H, W)` volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeShape {
    pub batch: Option<usize>,
    pub channels: usize,
    pub depth: usize,
    pub height: usize,
    pub width: usize,
}

impl VolumeShape {
    /// Decodes a raw shape, rejecting unsupported ranks and empty tensors.
    pub fn from_shape(shape: &[usize]) -> Result<Self, PadError> {
        let rank = shape.len();
        if rank != 4 && rank != 5 {
            return Err(PadError::InvalidRank(rank));
        }
        if shape.iter().product::<usize>() == 0 {
            return Err(PadError::EmptyTensor(shape.to_vec()));
        }

        // batch mode shifts every axis by one
        let offset = rank - 4;
        let dim_slices = offset;
        let dim_d = 1 + offset;
        let dim_h = 2 + offset;
        let dim_w = 3 + offset;

        Ok(Self {
            batch: (offset == 1).then(|| shape[0]),
            channels: shape[dim_slices],
            depth: shape[dim_d],
            height: shape[dim_h],
            width: shape[dim_w],
        })
    }

    /// 5 in batch mode, 4 otherwise.
    pub fn rank(&self) -> usize {
        if self.batch.is_some() {
            5
        } else {
            4
        }
    }

    /// Number of independent `(D, H, W)` channel slices.
    pub fn frames(&self) -> usize {
        self.batch.unwrap_or(1) * self.channels
    }

    /// `[depth, height, width]`.
    pub fn spatial(&self) -> [usize; 3] {
        [self.depth, self.height, self.width]
    }

    /// `(frames, D, H, W)`, the view the batch driver works on.
    pub(crate) fn frame_dim(&self) -> (usize, usize, usize, usize) {
        (self.frames(), self.depth, self.height, self.width)
    }

    /// Raw shape, batch axis first when present.
    pub fn to_vec(&self) -> Vec<usize> {
        self.batch
            .into_iter()
            .chain([self.channels, self.depth, self.height, self.width])
            .collect()
    }

    /// Extents after applying `padding`; every spatial extent must stay positive.
    pub fn padded(&self, padding: &Padding3d) -> Result<Self, PadError> {
        let spatial = self.spatial();
        let per_axis = padding.per_axis();
        let overflow = || PadError::ShapeOverflow {
            input: spatial,
            padding: *padding,
        };

        let mut output = [0isize; 3];
        for (i, extent) in output.iter_mut().enumerate() {
            *extent = isize::try_from(spatial[i])
                .ok()
                .and_then(|e| e.checked_add(per_axis[i][0]))
                .and_then(|e| e.checked_add(per_axis[i][1]))
                .ok_or_else(overflow)?;
        }

        if output.iter().any(|&extent| extent < 1) {
            return Err(PadError::InvalidOutputShape {
                input: spatial,
                output,
            });
        }

        let padded = Self {
            depth: output[0] as usize,
            height: output[1] as usize,
            width: output[2] as usize,
            ..*self
        };

        // ndarray refuses arrays with more than isize::MAX elements
        padded
            .to_vec()
            .into_iter()
            .try_fold(1usize, usize::checked_mul)
            .filter(|&len| len <= isize::MAX as usize)
            .ok_or_else(overflow)?;

        Ok(padded)
    }

    /// Fails on the first axis where `actual` differs from `self`.
    pub fn ensure_matches(&self, actual: &VolumeShape) -> Result<(), PadError> {
        let checks = [
            (ShapeAxis::Rank, self.rank(), actual.rank()),
            (
                ShapeAxis::Batch,
                self.batch.unwrap_or(1),
                actual.batch.unwrap_or(1),
            ),
            (ShapeAxis::Channels, self.channels, actual.channels),
            (ShapeAxis::Width, self.width, actual.width),
            (ShapeAxis::Height, self.height, actual.height),
            (ShapeAxis::Depth, self.depth, actual.depth),
        ];

        match checks.into_iter().find(|(_, expected, got)| expected != got) {
            Some((axis, expected, got)) => Err(PadError::ShapeMismatch {
                axis,
                expected,
                got,
            }),
            None => Ok(()),
        }
    }
}

/// Validates an input shape against `padding` and returns `(input, output)`.
///
/// When `reference` is given (a gradient-output or a destination buffer) it
/// must match the computed output exactly.
pub(crate) fn check(
    input: &[usize],
    padding: &Padding3d,
    reference: Option<&[usize]>,
) -> Result<(VolumeShape, VolumeShape), PadError> {
    let input = VolumeShape::from_shape(input)?;
    let output = input.padded(padding)?;

    if let Some(reference) = reference {
        expect_shape(&output, reference)?;
    }

    Ok((input, output))
}

/// Checks a raw shape against already validated extents.
pub(crate) fn expect_shape(expected: &VolumeShape, actual: &[usize]) -> Result<(), PadError> {
    if actual.len() != expected.rank() {
        return Err(PadError::ShapeMismatch {
            axis: ShapeAxis::Rank,
            expected: expected.rank(),
            got: actual.len(),
        });
    }
    expected.ensure_matches(&VolumeShape::from_shape(actual)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_emptiness() {
        assert!(matches!(
            VolumeShape::from_shape(&[2, 3, 4]),
            Err(PadError::InvalidRank(3))
        ));
        assert!(matches!(
            VolumeShape::from_shape(&[1, 2, 3, 4, 5, 6]),
            Err(PadError::InvalidRank(6))
        ));
        assert!(matches!(
            VolumeShape::from_shape(&[1, 0, 3, 4]),
            Err(PadError::EmptyTensor(shape)) if shape == vec![1, 0, 3, 4]
        ));
        assert!(matches!(
            VolumeShape::from_shape(&[0, 1, 2, 3, 4]),
            Err(PadError::EmptyTensor(_))
        ));
    }

    #[test]
    fn batch_axis_shifts_channels_and_spatial() {
        let s = VolumeShape::from_shape(&[3, 4, 5, 6]).unwrap();
        assert_eq!(s.batch, None);
        assert_eq!((s.channels, s.depth, s.height, s.width), (3, 4, 5, 6));
        assert_eq!(s.frames(), 3);

        let s = VolumeShape::from_shape(&[2, 3, 4, 5, 6]).unwrap();
        assert_eq!(s.batch, Some(2));
        assert_eq!((s.channels, s.depth, s.height, s.width), (3, 4, 5, 6));
        assert_eq!(s.frames(), 6);
        assert_eq!(s.to_vec(), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn padded_extents() {
        let s = VolumeShape::from_shape(&[1, 2, 3, 4]).unwrap();
        let out = s.padded(&Padding3d::new(1, 2, 0, 3, -1, 0)).unwrap();
        assert_eq!(out.to_vec(), vec![1, 1, 6, 7]);
    }

    #[test]
    fn degenerate_output_on_any_axis_is_rejected() {
        let s = VolumeShape::from_shape(&[1, 4, 4, 4]).unwrap();

        // only width collapses; the other axes stay valid
        let err = s.padded(&Padding3d::new(-2, -2, 1, 1, 1, 1)).unwrap_err();
        match err {
            PadError::InvalidOutputShape { input, output } => {
                assert_eq!(input, [4, 4, 4]);
                assert_eq!(output, [6, 6, 0]);
            }
            e => panic!("unexpected error {e:?}"),
        }

        assert!(s.padded(&Padding3d::new(0, 0, 0, 0, -3, 0)).is_ok());
    }

    #[test]
    fn overflowing_padding_is_an_error() {
        let s = VolumeShape::from_shape(&[1, 2, 2, 2]).unwrap();

        let err = s
            .padded(&Padding3d::new(isize::MAX, 1, 0, 0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, PadError::ShapeOverflow { input: [2, 2, 2], .. }));

        assert!(matches!(
            s.padded(&Padding3d::new(isize::MIN, -1, 0, 0, 0, 0)),
            Err(PadError::ShapeOverflow { .. })
        ));

        // every extent fits, their product does not
        assert!(matches!(
            s.padded(&Padding3d::uniform(1 << 22)),
            Err(PadError::ShapeOverflow { .. })
        ));
    }

    #[test]
    fn reference_mismatch_reports_first_axis() {
        let pad = Padding3d::uniform(1);

        assert!(check(&[2, 3, 3, 3], &pad, Some(&[2, 5, 5, 5])).is_ok());

        let err = check(&[2, 3, 3, 3], &pad, Some(&[3, 5, 5, 5])).unwrap_err();
        assert!(matches!(
            err,
            PadError::ShapeMismatch {
                axis: ShapeAxis::Channels,
                expected: 2,
                got: 3
            }
        ));

        let err = check(&[2, 3, 3, 3], &pad, Some(&[2, 5, 5, 4])).unwrap_err();
        assert!(matches!(
            err,
            PadError::ShapeMismatch {
                axis: ShapeAxis::Width,
                expected: 5,
                got: 4
            }
        ));

        let err = check(&[2, 3, 3, 3], &pad, Some(&[2, 4, 5, 5])).unwrap_err();
        assert!(matches!(
            err,
            PadError::ShapeMismatch {
                axis: ShapeAxis::Depth,
                ..
            }
        ));

        let err = check(&[2, 3, 3, 3], &pad, Some(&[1, 2, 5, 5, 5])).unwrap_err();
        assert!(matches!(
            err,
            PadError::ShapeMismatch {
                axis: ShapeAxis::Rank,
                expected: 4,
                got: 5
            }
        ));

        let err = check(&[2, 2, 3, 3, 3], &pad, Some(&[3, 2, 5, 5, 5])).unwrap_err();
        assert!(matches!(
            err,
            PadError::ShapeMismatch {
                axis: ShapeAxis::Batch,
                ..
            }
        ));
    }

    #[test]
    fn error_messages() {
        let err = check(&[1, 2, 2, 2], &Padding3d::new(0, 0, 0, 0, -2, 0), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input (D: 2 H: 2 W: 2) is too small. Calculated output D: 0 H: 2 W: 2"
        );

        let err = check(&[1, 2, 2, 2], &Padding3d::uniform(1), Some(&[1, 4, 4, 3])).unwrap_err();
        assert_eq!(err.to_string(), "width unexpected. Expected: 4, Got: 3");
    }
}
