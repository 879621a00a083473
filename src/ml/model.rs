use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Relu,
    },
    prelude::*,
};

/// Ten digit classes, 0..=9.
pub const NUM_CLASSES: usize = 10;

const CONV1_CHANNELS: usize = 8;
const CONV2_CHANNELS: usize = 16;
const POOLED_SIDE:    usize = 8;

// #[derive(Config)] brings its own Clone and serde impls.
#[derive(Config, Debug)]
pub struct DigitCnnConfig {
    pub num_classes: usize,
    pub hidden_size: usize,
    #[config(default = 0.5)]
    pub dropout:     f64,
}

impl DigitCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitCnn<B> {
        DigitCnn {
            conv1:      Conv2dConfig::new([1, CONV1_CHANNELS], [3, 3]).init(device),
            conv2:      Conv2dConfig::new([CONV1_CHANNELS, CONV2_CHANNELS], [3, 3]).init(device),
            pool:       AdaptiveAvgPool2dConfig::new([POOLED_SIDE, POOLED_SIDE]).init(),
            dropout:    DropoutConfig::new(self.dropout).init(),
            linear1:    LinearConfig::new(CONV2_CHANNELS * POOLED_SIDE * POOLED_SIDE, self.hidden_size)
                .init(device),
            linear2:    LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// Small convolutional digit classifier.
///
/// Adaptive pooling makes the head independent of the input
/// size, so the same architecture serves any configured bitmap
/// shape.
#[derive(Module, Debug)]
pub struct DigitCnn<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub conv2:      Conv2d<B>,
    pub pool:       AdaptiveAvgPool2d,
    pub dropout:    Dropout,
    pub linear1:    Linear<B>,
    pub linear2:    Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> DigitCnn<B> {
    /// images: [batch, height, width] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, height, width] = images.dims();

        let x = images.reshape([batch_size, 1, height, width]);

        let x = self.conv1.forward(x);
        let x = self.dropout.forward(x);
        let x = self.conv2.forward(x);
        let x = self.dropout.forward(x);
        let x = self.activation.forward(x);

        let x = self.pool.forward(x); // [batch, 16, 8, 8]
        let x = x.reshape([batch_size, CONV2_CHANNELS * POOLED_SIDE * POOLED_SIDE]);

        let x = self.linear1.forward(x);
        let x = self.dropout.forward(x);
        let x = self.activation.forward(x);

        self.linear2.forward(x)
    }

    /// Mean cross-entropy over the batch, plus the logits.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 3>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}
