//! Output-to-source coordinate mapping shared by the forward and backward passes.

/// Maps output coordinate `c` on one axis to the input coordinate it reads.
///
/// Coordinates in front of the input clamp to its first sample, coordinates
/// past it clamp to the last one. A negative `before` crops: the first
/// `-before` input samples are skipped. The result lies in `[0, in_extent)`
/// whenever `in_extent > 0`.
#[inline]
pub fn map_source_index(c: usize, in_extent: usize, before: isize) -> usize {
    let c = c as isize;
    let in_extent = in_extent as isize;

    let inner_start = (-before).max(0);
    let outer_start = before.max(0);

    let clamped = if c < before {
        before
    } else if c < in_extent + before {
        c
    } else {
        in_extent + before - 1
    };

    (clamped - outer_start + inner_start) as usize
}

/// Source index for every coordinate of an output axis.
pub(crate) fn source_table(out_extent: usize, in_extent: usize, before: isize) -> Vec<usize> {
    (0..out_extent)
        .map(|c| map_source_index(c, in_extent, before))
        .collect()
}

/// Lookup tables for the depth, height and width axes of one call.
#[derive(Debug, Clone)]
pub(crate) struct VolumeMap {
    pub depth: Vec<usize>,
    pub height: Vec<usize>,
    pub width: Vec<usize>,
}

impl VolumeMap {
    pub fn new(input: [usize; 3], output: [usize; 3], per_axis: [[isize; 2]; 3]) -> Self {
        let [depth, height, width] =
            std::array::from_fn(|i| source_table(output[i], input[i], per_axis[i][0]));

        Self {
            depth,
            height,
            width,
        }
    }

    #[inline]
    pub fn source(&self, (z, i, j): (usize, usize, usize)) -> (usize, usize, usize) {
        (self.depth[z], self.height[i], self.width[j])
    }
}
