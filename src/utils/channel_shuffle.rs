use burn::prelude::*;

/// Interleaves the channels of `x` across `groups`, so that the output channel `i`
/// comes from the input channel `(i % groups) * (channels / groups) + i / groups`.
///
/// After a grouped (or split-branch) convolution each group only ever sees its own
/// channels; the shuffle lets the next grouped convolution mix information between them.
///
/// # Shapes
///   - Input [batch, channels, height, width]
///   - Output [batch, channels, height, width]
///
/// # Panics
/// If `channels` is not divisible by `groups`.
pub fn channel_shuffle<B: Backend>(x: Tensor<B, 4>, groups: usize) -> Tensor<B, 4> {
    let [batch, channels, height, width] = x.dims();
    assert_ne!(groups, 0, "channel shuffle needs at least one group");
    assert_eq!(
        channels % groups,
        0,
        "{channels} channels cannot be split into {groups} groups"
    );
    let channels_per_group = channels / groups;

    let x = x.reshape([batch, groups, channels_per_group, height, width]);
    let x = x.swap_dims(1, 2);
    debug_assert_eq!(
        [batch, channels_per_group, groups, height, width],
        x.dims()
    );

    x.reshape([batch, channels, height, width])
}
