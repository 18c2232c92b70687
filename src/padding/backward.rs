use ndarray::{ArrayView3, ArrayViewMut3};
use num::traits::NumAssign;

use super::axis::VolumeMap;

/// Adds one `(D, H, W)` gradient-output slice into its gradient-input slice.
///
/// Several output samples share a source at replicated borders, so the
/// slice must be walked by a single thread; `grad_input` is expected to be
/// zeroed by the caller.
#[inline]
pub(crate) fn accumulate_frame<T: NumAssign + Copy>(
    grad_output: ArrayView3<'_, T>,
    mut grad_input: ArrayViewMut3<'_, T>,
    map: &VolumeMap,
) {
    grad_output.indexed_iter().for_each(|(index, &g)| {
        let (z, i, j) = map.source(index);
        grad_input[[z, i, j]] += g;
    });
}

#[cfg(test)]
mod tests {
    use ndarray::prelude::*;

    use super::*;

    #[test]
    fn border_contributions_are_summed() {
        // width 2 -> 4 with (1, 1)
        let grad_output = array![[[1, 2, 3, 4]]];
        let mut grad_input = Array3::zeros((1, 1, 2));
        let map = VolumeMap::new([1, 1, 2], [1, 1, 4], [[0, 0], [0, 0], [1, 1]]);

        accumulate_frame(grad_output.view(), grad_input.view_mut(), &map);

        assert_eq!(grad_input, array![[[3, 7]]]);
    }

    #[test]
    fn never_overwrites() {
        let grad_output = array![[[1., 1.]]];
        let mut grad_input = array![[[10., 20.]]];
        let map = VolumeMap::new([1, 1, 2], [1, 1, 2], [[0, 0], [0, 0], [0, 0]]);

        accumulate_frame(grad_output.view(), grad_input.view_mut(), &map);

        assert_eq!(grad_input, array![[[11., 21.]]]);
    }

    #[test]
    fn cropped_samples_receive_nothing() {
        let grad_output = array![[[5, 7]]];
        let mut grad_input = Array3::zeros((1, 1, 4));
        // drop one in front and one at the back
        let map = VolumeMap::new([1, 1, 4], [1, 1, 2], [[0, 0], [0, 0], [-1, -1]]);

        accumulate_frame(grad_output.view(), grad_input.view_mut(), &map);

        assert_eq!(grad_input, array![[[0, 5, 7, 0]]]);
    }
}
