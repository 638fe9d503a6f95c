use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct BoxNetConfig {
    /// Flattened crop size: SAMPLE_SIDE² grayscale values
    pub input_size:  usize,
    pub hidden_size: usize,
    /// Two classes: 0 = empty, 1 = crossed
    pub num_classes: usize,
    pub dropout:     f64,
}

impl BoxNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BoxNet<B> {
        BoxNet {
            hidden:  LinearConfig::new(self.input_size, self.hidden_size).init(device),
            output:  LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// The box classifier: Linear → ReLU → Dropout → Linear.
/// Small on purpose — the inputs are low-resolution binaryish
/// crops and two classes, not a vision benchmark.
#[derive(Module, Debug)]
pub struct BoxNet<B: Backend> {
    pub hidden:  Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> BoxNet<B> {
    /// images: [batch, input_size] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = burn::tensor::activation::relu(self.hidden.forward(images));
        self.output.forward(self.dropout.forward(x))
    }

    pub fn forward_loss(
        &self,
        images:  Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(images);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), targets);
        (loss, logits)
    }
}
