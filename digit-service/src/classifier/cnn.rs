//! Convolutional MNIST classifier on the burn `NdArray` CPU backend.

use super::{ClassifierError, DigitClassifier, Prediction, NUM_CLASSES};
use crate::preprocess::{ModelInput, MNIST_SIDE};
use burn::backend::NdArray;
use burn::module::Module;
use burn::nn::{
    activation::Relu,
    conv::{Conv2d, Conv2dConfig},
    pool::{MaxPool2d, MaxPool2dConfig},
    Dropout, DropoutConfig, Linear, LinearConfig,
};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::{activation::softmax, backend::Backend, Tensor, TensorData};
use std::path::Path;
use std::sync::Mutex;

/// CPU backend used for serving.
pub type CpuBackend = NdArray<f32>;

const CONV1_CHANNELS: usize = 32;
const CONV2_CHANNELS: usize = 64;
const HIDDEN: usize = 128;
/// 28 -> 26 -> 24 after two unpadded 3x3 convolutions, halved by the pool.
const POOLED_SIDE: usize = 12;
const FLATTENED: usize = CONV2_CHANNELS * POOLED_SIDE * POOLED_SIDE;

/// conv 3x3 (1->32), relu, conv 3x3 (32->64), relu, maxpool 2x2, dropout,
/// dense 9216->128, relu, dropout, dense 128->10, softmax.
#[derive(Module, Debug)]
pub struct MnistCnn<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: MaxPool2d,
    dropout_conv: Dropout,
    fc1: Linear<B>,
    dropout_fc: Dropout,
    fc2: Linear<B>,
    relu: Relu,
}

impl<B: Backend> MnistCnn<B> {
    /// Fresh, randomly initialised network.
    pub fn new(device: &B::Device) -> Self {
        Self {
            conv1: Conv2dConfig::new([1, CONV1_CHANNELS], [3, 3]).init(device),
            conv2: Conv2dConfig::new([CONV1_CHANNELS, CONV2_CHANNELS], [3, 3]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            dropout_conv: DropoutConfig::new(0.25).init(),
            fc1: LinearConfig::new(FLATTENED, HIDDEN).init(device),
            dropout_fc: DropoutConfig::new(0.5).init(),
            fc2: LinearConfig::new(HIDDEN, NUM_CLASSES).init(device),
            relu: Relu::new(),
        }
    }

    /// `[batch, 1, 28, 28]` -> `[batch, 10]` class probabilities.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.conv1.forward(images));
        let x = self.relu.forward(self.conv2.forward(x));
        let x = self.dropout_conv.forward(self.pool.forward(x));

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout_fc.forward(self.relu.forward(self.fc1.forward(x)));

        softmax(self.fc2.forward(x), 1)
    }

    /// Records of another architecture can still deserialize; every weight
    /// shape must match this layout before the model serves.
    fn check_shapes(&self) -> Result<(), ClassifierError> {
        let expected: [(&str, Vec<usize>, Vec<usize>); 4] = [
            (
                "conv1",
                self.conv1.weight.dims().to_vec(),
                vec![CONV1_CHANNELS, 1, 3, 3],
            ),
            (
                "conv2",
                self.conv2.weight.dims().to_vec(),
                vec![CONV2_CHANNELS, CONV1_CHANNELS, 3, 3],
            ),
            ("fc1", self.fc1.weight.dims().to_vec(), vec![FLATTENED, HIDDEN]),
            ("fc2", self.fc2.weight.dims().to_vec(), vec![HIDDEN, NUM_CLASSES]),
        ];

        for (layer, actual, wanted) in expected {
            if actual != wanted {
                return Err(ClassifierError::ModelLoad(format!(
                    "layer {layer} has shape {actual:?}, expected {wanted:?}"
                )));
            }
        }
        Ok(())
    }
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Serving wrapper around a loaded [`MnistCnn`].
pub struct BurnClassifier {
    model: Mutex<MnistCnn<CpuBackend>>,
    device: <CpuBackend as Backend>::Device,
}

impl BurnClassifier {
    /// Load weights from a named MessagePack record (`.mpk`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ClassifierError::ModelLoad(format!(
                "model file {} does not exist",
                path.display()
            )));
        }

        let device = <CpuBackend as Backend>::Device::default();
        let model = MnistCnn::<CpuBackend>::new(&device)
            .load_file(path.to_path_buf(), &recorder(), &device)
            .map_err(|e| ClassifierError::ModelLoad(format!("{}: {e:?}", path.display())))?;
        model.check_shapes()?;

        tracing::info!(path = %path.display(), "Loaded MNIST CNN weights");

        Ok(Self::from_model(model, device))
    }

    /// Untrained network, useful for smoke tests of the serving path.
    pub fn with_random_weights() -> Self {
        let device = <CpuBackend as Backend>::Device::default();
        Self::from_model(MnistCnn::new(&device), device)
    }

    pub fn from_model(
        model: MnistCnn<CpuBackend>,
        device: <CpuBackend as Backend>::Device,
    ) -> Self {
        Self {
            model: Mutex::new(model),
            device,
        }
    }

    /// Persist the current weights in the format [`BurnClassifier::load`] reads.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ClassifierError> {
        self.snapshot()?
            .save_file(path.as_ref().to_path_buf(), &recorder())
            .map_err(|e| ClassifierError::ModelLoad(format!("{e:?}")))
    }

    // Clones share parameter storage; the lock is held only for the copy.
    fn snapshot(&self) -> Result<MnistCnn<CpuBackend>, ClassifierError> {
        self.model
            .lock()
            .map(|model| model.clone())
            .map_err(|_| ClassifierError::Unavailable)
    }
}

impl DigitClassifier for BurnClassifier {
    fn classify(&self, input: &ModelInput) -> Result<Prediction, ClassifierError> {
        let side = MNIST_SIDE as usize;
        let data = TensorData::new(input.as_slice().to_vec(), [1, 1, side, side]);
        let images = Tensor::<CpuBackend, 4>::from_data(data, &self.device);

        let probs = self
            .snapshot()?
            .forward(images)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("{e:?}")))?;

        Prediction::from_probabilities(&probs)
    }

    fn name(&self) -> &str {
        "burn-cnn"
    }
}
