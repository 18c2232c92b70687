use ndarray::{Array, ArrayBase, ArrayView, ArrayViewMut, Data, DataMut, Dimension};
use num::traits::NumAssign;

use crate::{
    shape::{self, VolumeShape},
    PadError, Padding3d,
};

use axis::VolumeMap;

mod axis;
mod backward;
mod batch;
mod forward;


pub use axis::map_source_index;

/// Replication padding over the trailing `(D, H, W)` axes of a
/// `(C, D, H, W)` or `(N, C, D, H, W)` array.
///
/// Every method validates all shapes before allocating or writing anything;
/// on error, caller-owned buffers are left untouched. Non-contiguous inputs
/// are copied into standard layout for the duration of the call.
pub trait ReplicationPad3dExt<T, D: Dimension> {
    /// Forward pass: returns the padded (or cropped) array.
    fn replication_pad3d(&self, padding: Padding3d) -> Result<Array<T, D>, PadError>;

    /// Forward pass into `output`, which must already have the padded shape
    /// and be in standard layout.
    fn replication_pad3d_into<SO>(
        &self,
        output: &mut ArrayBase<SO, D>,
        padding: Padding3d,
    ) -> Result<(), PadError>
    where
        SO: DataMut<Elem = T>;

    /// Backward pass: `self` is the forward input, `grad_output` the gradient
    /// of the padded array. Returns the gradient with respect to `self`.
    fn replication_pad3d_backward<SG>(
        &self,
        grad_output: &ArrayBase<SG, D>,
        padding: Padding3d,
    ) -> Result<Array<T, D>, PadError>
    where
        SG: Data<Elem = T>;

    /// Backward pass into `grad_input`, which is zeroed first and must have
    /// the shape of `self` and be in standard layout.
    fn replication_pad3d_backward_into<SG, SI>(
        &self,
        grad_output: &ArrayBase<SG, D>,
        grad_input: &mut ArrayBase<SI, D>,
        padding: Padding3d,
    ) -> Result<(), PadError>
    where
        SG: Data<Elem = T>,
        SI: DataMut<Elem = T>;
}

impl<T, S, D> ReplicationPad3dExt<T, D> for ArrayBase<S, D>
where
    T: NumAssign + Copy + Send + Sync,
    S: Data<Elem = T>,
    D: Dimension,
{
    fn replication_pad3d(&self, padding: Padding3d) -> Result<Array<T, D>, PadError> {
        let (input_shape, output_shape) = validate(self.shape(), &padding, None)?;

        let mut output_dim = self.raw_dim();
        output_dim
            .slice_mut()
            .copy_from_slice(&output_shape.to_vec());
        let mut output = Array::zeros(output_dim);

        pad(self.view(), output.view_mut(), input_shape, output_shape, &padding)?;

        Ok(output)
    }

    fn replication_pad3d_into<SO>(
        &self,
        output: &mut ArrayBase<SO, D>,
        padding: Padding3d,
    ) -> Result<(), PadError>
    where
        SO: DataMut<Elem = T>,
    {
        let (input_shape, output_shape) = validate(self.shape(), &padding, Some(output.shape()))?;
        if !output.is_standard_layout() {
            return Err(PadError::NonContiguous("output"));
        }

        pad(self.view(), output.view_mut(), input_shape, output_shape, &padding)
    }

    fn replication_pad3d_backward<SG>(
        &self,
        grad_output: &ArrayBase<SG, D>,
        padding: Padding3d,
    ) -> Result<Array<T, D>, PadError>
    where
        SG: Data<Elem = T>,
    {
        let (input_shape, output_shape) =
            validate(self.shape(), &padding, Some(grad_output.shape()))?;

        let mut grad_input = Array::zeros(self.raw_dim());

        unpad(
            grad_output.view(),
            grad_input.view_mut(),
            input_shape,
            output_shape,
            &padding,
        )?;

        Ok(grad_input)
    }

    fn replication_pad3d_backward_into<SG, SI>(
        &self,
        grad_output: &ArrayBase<SG, D>,
        grad_input: &mut ArrayBase<SI, D>,
        padding: Padding3d,
    ) -> Result<(), PadError>
    where
        SG: Data<Elem = T>,
        SI: DataMut<Elem = T>,
    {
        let (input_shape, output_shape) =
            validate(self.shape(), &padding, Some(grad_output.shape()))?;
        shape::expect_shape(&input_shape, grad_input.shape())
            .inspect_err(|e| log::debug!("replication_pad3d_backward: gradient input rejected: {e}"))?;
        if !grad_input.is_standard_layout() {
            return Err(PadError::NonContiguous("gradient input"));
        }

        grad_input.fill(T::zero());

        unpad(
            grad_output.view(),
            grad_input.view_mut(),
            input_shape,
            output_shape,
            &padding,
        )
    }
}

fn validate(
    input: &[usize],
    padding: &Padding3d,
    reference: Option<&[usize]>,
) -> Result<(VolumeShape, VolumeShape), PadError> {
    let (input_shape, output_shape) = shape::check(input, padding, reference).inspect_err(|e| {
        log::debug!("replication_pad3d: rejected input {input:?} with {padding:?}: {e}")
    })?;

    log::trace!(
        "replication_pad3d: {:?} -> {:?} ({:?})",
        input,
        output_shape.to_vec(),
        padding
    );

    Ok((input_shape, output_shape))
}

/// Forward pass on validated shapes. `output` must be in standard layout.
fn pad<T, D>(
    input: ArrayView<'_, T, D>,
    output: ArrayViewMut<'_, T, D>,
    input_shape: VolumeShape,
    output_shape: VolumeShape,
    padding: &Padding3d,
) -> Result<(), PadError>
where
    T: Copy + Send + Sync,
    D: Dimension,
{
    // scoped copy, dropped on every return path
    let input = input.as_standard_layout();

    let input_frames = input.view().into_shape_with_order(input_shape.frame_dim())?;
    let output_frames = output.into_shape_with_order(output_shape.frame_dim())?;
    let map = VolumeMap::new(
        input_shape.spatial(),
        output_shape.spatial(),
        padding.per_axis(),
    );

    batch::pad_frames(input_frames, output_frames, &map);

    Ok(())
}

/// Backward pass on validated shapes. `grad_input` must be zeroed and in
/// standard layout.
fn unpad<T, D>(
    grad_output: ArrayView<'_, T, D>,
    grad_input: ArrayViewMut<'_, T, D>,
    input_shape: VolumeShape,
    output_shape: VolumeShape,
    padding: &Padding3d,
) -> Result<(), PadError>
where
    T: NumAssign + Copy + Send + Sync,
    D: Dimension,
{
    let grad_output = grad_output.as_standard_layout();

    let grad_output_frames = grad_output
        .view()
        .into_shape_with_order(output_shape.frame_dim())?;
    let grad_input_frames = grad_input.into_shape_with_order(input_shape.frame_dim())?;
    let map = VolumeMap::new(
        input_shape.spatial(),
        output_shape.spatial(),
        padding.per_axis(),
    );

    batch::accumulate_frames(grad_output_frames, grad_input_frames, &map);

    Ok(())
}
