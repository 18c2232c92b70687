use ndarray::{ArrayView3, ArrayView4, ArrayViewMut3, ArrayViewMut4, Zip};
use num::traits::NumAssign;

use super::{axis::VolumeMap, backward, forward};

/// Runs `kernel` once per channel slice.
///
/// Slices of the two stacks are disjoint, which makes the fan-out over
/// `(batch * channel)` free of synchronisation.
fn for_each_frame<A, B, F>(source: ArrayView4<'_, A>, mut target: ArrayViewMut4<'_, B>, kernel: F)
where
    A: Sync,
    B: Send,
    F: Fn(ArrayView3<'_, A>, ArrayViewMut3<'_, B>) + Sync + Send,
{
    let zip = Zip::from(source.outer_iter()).and(target.outer_iter_mut());

    #[cfg(feature = "rayon")]
    zip.par_for_each(kernel);

    #[cfg(not(feature = "rayon"))]
    zip.for_each(kernel);
}

/// Forward pass over a `(frames, D, H, W)` stack.
pub(crate) fn pad_frames<T>(input: ArrayView4<'_, T>, output: ArrayViewMut4<'_, T>, map: &VolumeMap)
where
    T: Copy + Send + Sync,
{
    for_each_frame(input, output, |input, output| {
        forward::fill_frame(input, output, map)
    });
}

/// Backward pass over a `(frames, D, H, W)` stack; `grad_input` must be zeroed.
pub(crate) fn accumulate_frames<T>(
    grad_output: ArrayView4<'_, T>,
    grad_input: ArrayViewMut4<'_, T>,
    map: &VolumeMap,
) where
    T: NumAssign + Copy + Send + Sync,
{
    for_each_frame(grad_output, grad_input, |grad_output, grad_input| {
        backward::accumulate_frame(grad_output, grad_input, map)
    });
}
