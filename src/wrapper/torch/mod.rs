//! torch 包装
mod tensor;
pub use tensor::TensorWrapper;
