use ndarray::{ArrayView3, ArrayViewMut3, Zip};

use super::axis::VolumeMap;

/// Fills one `(D, H, W)` output slice from its input slice.
///
/// Every output sample is written exactly once, so rerunning with the same
/// input gives the same output.
#[inline]
pub(crate) fn fill_frame<T: Copy>(
    input: ArrayView3<'_, T>,
    mut output: ArrayViewMut3<'_, T>,
    map: &VolumeMap,
) {
    Zip::indexed(&mut output).for_each(|index, out| {
        let (z, i, j) = map.source(index);
        *out = input[[z, i, j]];
    });
}

#[cfg(test)]
mod tests {
    use ndarray::prelude::*;

    use super::*;

    #[test]
    fn fills_borders_from_edges() {
        let input = array![[[1, 2], [3, 4]]];
        let mut output = Array3::zeros((1, 3, 4));
        let map = VolumeMap::new([1, 2, 2], [1, 3, 4], [[0, 0], [1, 0], [1, 1]]);

        fill_frame(input.view(), output.view_mut(), &map);

        assert_eq!(
            output,
            array![[[1, 1, 2, 2], [1, 1, 2, 2], [3, 3, 4, 4]]]
        );
    }

    #[test]
    fn rerun_is_idempotent() {
        let input = array![[[1., 2., 3.]], [[4., 5., 6.]]];
        let map = VolumeMap::new([2, 1, 3], [3, 2, 2], [[1, 0], [0, 1], [-1, 0]]);
        let mut output = Array3::from_elem((3, 2, 2), -1.);

        fill_frame(input.view(), output.view_mut(), &map);
        let first = output.clone();
        fill_frame(input.view(), output.view_mut(), &map);

        assert_eq!(output, first);
        assert_eq!(
            output,
            array![
                [[2., 3.], [2., 3.]],
                [[2., 3.], [2., 3.]],
                [[5., 6.], [5., 6.]]
            ]
        );
    }
}
