//! Candle feedforward network for position classification.
//!
//! Architecture: 10 → 32 → 16 → K with ReLU activations; the output is raw
//! per-class logits. K is the number of labels in the artifact.
//!
//! Candle is only used to read and check the safetensors file. At load time
//! the weights are copied into [`RawWeights`] so the request path is plain
//! `f32` arithmetic with no tensor allocation.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

use crate::error::PredictError;
use crate::features::DerivedFeatures;

const IN: usize = DerivedFeatures::NUM_FEATURES;
const H1: usize = 32;
const H2: usize = 16;

/// Feedforward classifier over normalized player features.
pub struct PositionNet {
    fc1: Linear, // 10 → 32
    fc2: Linear, // 32 → 16
    fc3: Linear, // 16 → K
    num_classes: usize,
}

impl PositionNet {
    /// Create the network from a var builder (fresh weights or a checkpoint).
    pub fn new(vb: VarBuilder<'_>, num_classes: usize) -> Result<Self> {
        let fc1 = linear(IN, H1, vb.pp("fc1"))?;
        let fc2 = linear(H1, H2, vb.pp("fc2"))?;
        let fc3 = linear(H2, num_classes, vb.pp("fc3"))?;
        Ok(Self {
            fc1,
            fc2,
            fc3,
            num_classes,
        })
    }

    /// Load trained weights from a safetensors file.
    ///
    /// Fails if any tensor is missing or its shape disagrees with
    /// `num_classes`.
    pub fn load(path: &std::path::Path, num_classes: usize, device: &Device) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("reading weights {}", path.display()))?;
        let vb = VarBuilder::from_buffered_safetensors(data, DType::F32, device)?;
        Self::new(vb, num_classes)
            .with_context(|| format!("weights {} do not match a {num_classes}-class network", path.display()))
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Forward pass: `(batch, 10)` normalized features → `(batch, K)` logits.
    pub fn forward_logits(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.fc1.forward(x)?.relu()?;
        let x = self.fc2.forward(&x)?.relu()?;
        let x = self.fc3.forward(&x)?;
        Ok(x)
    }

    /// Copy the weights out of candle for allocation-free inference.
    pub fn extract_weights(&self) -> Result<RawWeights> {
        Ok(RawWeights {
            fc1: DenseLayer::from_linear("fc1", &self.fc1)?,
            fc2: DenseLayer::from_linear("fc2", &self.fc2)?,
            fc3: DenseLayer::from_linear("fc3", &self.fc3)?,
        })
    }
}

/// One fully connected layer, row-major `(out, in)` weights.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    weight: Vec<f32>,
    bias: Vec<f32>,
    inputs: usize,
}

impl DenseLayer {
    /// Copy one candle layer. NaN or infinite parameters are an integrity
    /// error: they would poison every request instead of failing at load.
    fn from_linear(name: &str, layer: &Linear) -> Result<Self> {
        let (outputs, inputs) = layer.weight().dims2()?;
        let weight = layer.weight().flatten_all()?.to_vec1::<f32>()?;
        let bias = match layer.bias() {
            Some(b) => b.to_vec1::<f32>()?,
            None => vec![0.0; outputs],
        };
        if let Some(i) = weight.iter().position(|w| !w.is_finite()) {
            return Err(PredictError::integrity(format!(
                "{name}.weight[{}][{}] is not finite",
                i / inputs.max(1),
                i % inputs.max(1)
            ))
            .into());
        }
        if let Some(i) = bias.iter().position(|b| !b.is_finite()) {
            return Err(PredictError::integrity(format!("{name}.bias[{i}] is not finite")).into());
        }
        Ok(Self {
            weight,
            bias,
            inputs,
        })
    }

    fn outputs(&self) -> usize {
        self.bias.len()
    }

    /// `out = W·x + b`, optionally followed by ReLU.
    fn apply(&self, x: &[f32], out: &mut [f32], relu: bool) {
        debug_assert_eq!(x.len(), self.inputs);
        for (o, (row, b)) in out
            .iter_mut()
            .zip(self.weight.chunks_exact(self.inputs).zip(&self.bias))
        {
            let mut acc = *b;
            for (w, xi) in row.iter().zip(x) {
                acc += w * xi;
            }
            *o = if relu { acc.max(0.0) } else { acc };
        }
    }
}

/// Plain-array copy of [`PositionNet`] weights.
#[derive(Debug, Clone)]
pub struct RawWeights {
    fc1: DenseLayer,
    fc2: DenseLayer,
    fc3: DenseLayer,
}

impl RawWeights {
    pub fn num_classes(&self) -> usize {
        self.fc3.outputs()
    }

    /// Per-class logits for one normalized feature vector.
    pub fn logits(&self, input: &[f32; IN]) -> Vec<f32> {
        let mut h1 = [0.0_f32; H1];
        let mut h2 = [0.0_f32; H2];
        let mut out = vec![0.0_f32; self.num_classes()];
        self.fc1.apply(input, &mut h1, true);
        self.fc2.apply(&h1, &mut h2, true);
        self.fc3.apply(&h2, &mut out, false);
        out
    }
}
