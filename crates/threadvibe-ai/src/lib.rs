//! AI inference layer: ONNX Runtime text classification over pretrained
//! sentiment and emotion models.

pub mod labels;

#[cfg(feature = "onnx")]
mod classifier;
#[cfg(feature = "onnx")]
pub use classifier::TextClassifier;
