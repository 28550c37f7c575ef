#![cfg(feature = "shufflenet")]

use burn::backend::NdArray;
use burn::prelude::*;
use burn_shufflenet::utils::channel_shuffle;

type TestBackend = NdArray<f32>;

fn channels(n: usize, height: usize, width: usize) -> Tensor<TestBackend, 4> {
    let device = Default::default();
    Tensor::<TestBackend, 1, Int>::arange(0..(n * height * width) as i64, &device)
        .float()
        .reshape([1, n, height, width])
}

fn values(x: Tensor<TestBackend, 4>) -> Vec<f32> {
    x.into_data().to_vec::<f32>().unwrap()
}

#[test]
fn interleaves_two_groups() {
    let out = channel_shuffle(channels(6, 1, 1), 2);
    assert_eq!(out.dims(), [1, 6, 1, 1]);
    assert_eq!(values(out), vec![0., 3., 1., 4., 2., 5.]);
}

#[test]
fn interleaves_three_groups() {
    let out = channel_shuffle(channels(6, 1, 1), 3);
    assert_eq!(values(out), vec![0., 2., 4., 1., 3., 5.]);
}

#[test]
fn moves_whole_feature_maps() {
    // 4 channels of 2x2
    let out = channel_shuffle(channels(4, 2, 2), 2);
    assert_eq!(
        values(out),
        vec![
            0., 1., 2., 3., // channel 0
            8., 9., 10., 11., // channel 2
            4., 5., 6., 7., // channel 1
            12., 13., 14., 15., // channel 3
        ]
    );
}

#[test]
fn single_group_is_identity() {
    let x = channels(5, 2, 3);
    let out = channel_shuffle(x.clone(), 1);
    assert_eq!(values(out), values(x));
}

#[test]
fn shuffling_twice_with_two_groups_of_two_restores_order() {
    // with 4 channels and 2 groups the permutation is its own inverse
    let x = channels(4, 3, 3);
    let out = channel_shuffle(channel_shuffle(x.clone(), 2), 2);
    assert_eq!(values(out), values(x));
}

#[test]
#[should_panic(expected = "cannot be split")]
fn rejects_indivisible_channels() {
    channel_shuffle(channels(5, 1, 1), 2);
}

#[test]
#[should_panic(expected = "at least one group")]
fn rejects_zero_groups() {
    channel_shuffle(channels(4, 1, 1), 0);
}
