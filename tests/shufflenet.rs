#![cfg(feature = "shufflenet")]

use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::prelude::*;
use burn::tensor::Distribution;
use burn_shufflenet::prelude::*;

type TestBackend = NdArray<f32>;
type TestAutodiffBackend = Autodiff<TestBackend>;

fn random_input(shape: [usize; 4]) -> Tensor<TestBackend, 4> {
    let device = Default::default();
    Tensor::random(shape, Distribution::Default, &device)
}

#[test]
fn downsampling_block_halves_resolution() {
    let device = Default::default();
    let block = ShuffleBlockConfig::new(24, 48)
        .with_stride(2)
        .init::<TestBackend>(&device);
    assert!(block.branch1.is_some());

    let out = block.forward(random_input([2, 24, 16, 16]));
    assert_eq!(out.dims(), [2, 48, 8, 8]);

    // odd sizes round up
    let out = block.forward(random_input([1, 24, 15, 9]));
    assert_eq!(out.dims(), [1, 48, 8, 5]);
}

#[test]
fn basic_block_preserves_shape() {
    let device = Default::default();
    let block = ShuffleBlockConfig::new(48, 48).init::<TestBackend>(&device);
    assert!(block.branch1.is_none());

    let out = block.forward(random_input([2, 48, 7, 7]));
    assert_eq!(out.dims(), [2, 48, 7, 7]);
}

#[test]
fn basic_block_passes_first_half_through_on_even_channels() {
    let device = Default::default();
    let block = ShuffleBlockConfig::new(8, 8).init::<TestBackend>(&device);

    let x = random_input([1, 8, 4, 4]);
    let out = block.forward(x.clone());

    // after the shuffle, output channel 2k is the untouched input channel k
    let passed = out.reshape([1, 4, 2, 4, 4]).narrow(2, 0, 1).reshape([1, 4, 4, 4]);
    let first_half = x.narrow(1, 0, 4);
    assert_eq!(
        passed.into_data().to_vec::<f32>().unwrap(),
        first_half.into_data().to_vec::<f32>().unwrap()
    );
}

#[test]
#[should_panic(expected = "must be even")]
fn block_rejects_odd_output_channels() {
    let device = Default::default();
    ShuffleBlockConfig::new(24, 47)
        .with_stride(2)
        .init::<TestBackend>(&device);
}

#[test]
#[should_panic(expected = "must equal the output channels")]
fn basic_block_rejects_channel_change() {
    let device = Default::default();
    ShuffleBlockConfig::new(24, 48).init::<TestBackend>(&device);
}

#[test]
fn stage_downsamples_once() {
    let device = Default::default();
    let stage = ShuffleStageConfig::new(24, 48, 4).init::<TestBackend>(&device);
    assert_eq!(stage.blocks.len(), 4);
    assert_eq!(stage.blocks[0].stride, 2);
    assert!(stage.blocks[1..].iter().all(|block| block.stride == 1));

    let out = stage.forward(random_input([1, 24, 16, 16]));
    assert_eq!(out.dims(), [1, 48, 8, 8]);
}

#[test]
#[should_panic(expected = "at least one block")]
fn stage_rejects_zero_repeats() {
    let device = Default::default();
    ShuffleStageConfig::new(24, 48, 0).init::<TestBackend>(&device);
}

#[test]
fn network_produces_logits() {
    let device = Default::default();
    let model = ShuffleNetV2Config::x0_5(10, 3).init::<TestBackend>(&device);

    let logits = model.forward(random_input([2, 3, 64, 64]));
    assert_eq!(logits.dims(), [2, 10]);
}

#[test]
fn network_features_have_conv5_width() {
    let device = Default::default();
    let model = ShuffleNetV2Config::x0_5(5, 1).init::<TestBackend>(&device);

    let features = model.forward_features(random_input([1, 1, 32, 32]));
    assert_eq!(features.dims(), [1, 1024]);
}

#[test]
fn network_layout_follows_config() {
    let device = Default::default();
    let config = ShuffleNetV2Config::new(7, 3, [1, 2, 3], [8, 16, 32, 64, 128]);
    let model = config.init::<TestBackend>(&device);

    assert_eq!(model.stage2.blocks.len(), 1);
    assert_eq!(model.stage3.blocks.len(), 2);
    assert_eq!(model.stage4.blocks.len(), 3);
    assert_eq!(model.fc.weight.dims(), [128, 7]);
    assert!(model.fc.bias.is_some());

    let logits = model.forward(random_input([3, 3, 40, 40]));
    assert_eq!(logits.dims(), [3, 7]);
}

#[test]
fn wider_variants_have_more_parameters() {
    let device = Default::default();
    let x0_5 = ShuffleNetV2Config::x0_5(196, 3).init::<TestBackend>(&device);
    let x1_0 = ShuffleNetV2Config::x1_0(196, 3).init::<TestBackend>(&device);
    assert!(x0_5.num_params() < x1_0.num_params());
}

#[test]
fn variants_match_published_widths() {
    let expected = [
        (ShuffleNetV2Variant::X0_5, [24, 48, 96, 192, 1024]),
        (ShuffleNetV2Variant::X1_0, [24, 116, 232, 464, 1024]),
        (ShuffleNetV2Variant::X1_5, [24, 176, 352, 704, 1024]),
        (ShuffleNetV2Variant::X2_0, [24, 244, 488, 976, 2048]),
    ];
    for (variant, out_channels) in expected {
        let config = variant.config(196, 3);
        assert_eq!(config.stages_repeats, [4, 8, 4]);
        assert_eq!(config.stages_out_channels, out_channels);
        assert_eq!(config.num_classes, 196);
        assert_eq!(config.img_channels, 3);
    }

    assert_eq!(
        ShuffleNetV2Config::x1_5(10, 3).stages_out_channels,
        ShuffleNetV2Variant::X1_5.stages_out_channels()
    );
}

#[test]
fn variant_names_parse() {
    for variant in ShuffleNetV2Variant::ALL {
        assert_eq!(variant.to_string().parse::<ShuffleNetV2Variant>(), Ok(variant));
    }
    assert_eq!("0.5".parse::<ShuffleNetV2Variant>(), Ok(ShuffleNetV2Variant::X0_5));
    assert_eq!("X2_0".parse::<ShuffleNetV2Variant>(), Ok(ShuffleNetV2Variant::X2_0));
    assert_eq!("x10".parse::<ShuffleNetV2Variant>(), Ok(ShuffleNetV2Variant::X1_0));
    assert!("x3_0".parse::<ShuffleNetV2Variant>().is_err());
}

#[test]
fn config_survives_save_and_load() {
    let dir = temp_dir::TempDir::new().unwrap();
    let path = dir.child("model_config.json");

    let config = ShuffleNetV2Config::x1_0(196, 3);
    config.save(&path).unwrap();
    let loaded = ShuffleNetV2Config::load(&path).unwrap();

    assert_eq!(loaded.num_classes, 196);
    assert_eq!(loaded.img_channels, 3);
    assert_eq!(loaded.stages_repeats, config.stages_repeats);
    assert_eq!(loaded.stages_out_channels, config.stages_out_channels);
}

#[test]
fn network_backpropagates_in_training_mode() {
    let device = Default::default();
    let config = ShuffleNetV2Config::new(4, 3, [1, 1, 1], [8, 16, 32, 64, 128]);
    let model = config.init::<TestAutodiffBackend>(&device);

    let x = Tensor::<TestAutodiffBackend, 4>::random([2, 3, 32, 32], Distribution::Default, &device);
    let logits = model.forward(x);
    assert_eq!(logits.dims(), [2, 4]);

    let grads = logits.sum().backward();
    let fc_grad = model
        .fc
        .weight
        .grad(&grads)
        .expect("fc weight should have a gradient");
    assert_eq!(fc_grad.dims(), [128, 4]);
    assert!(model.conv1.conv.weight.grad(&grads).is_some());

    // batch statistics moved the running mean away from its zero init
    let running_mean = model
        .conv1
        .norm
        .running_mean
        .value()
        .abs()
        .sum()
        .into_scalar();
    assert!(running_mean > 0.);
}
