//! Convert to Python object wrapper
//! 依赖:
//! - python: torch

use numpy::{PyArray, PyArrayMethods};
use pyo3::{types::PyAnyMethods, Bound, PyAny, PyResult, Python};

use crate::error::Error;

/// 行优先的 f32 张量数据, 用于传递给 torch
#[derive(Debug, Clone, PartialEq)]
pub struct TensorWrapper {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl TensorWrapper {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, Error> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidInput(format!(
                "tensor data length {} does not match shape {:?}",
                data.len(),
                shape
            )));
        }
        Ok(Self { data, shape })
    }

    /// 全零张量
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    /// The dimension size for this tensor on each axis.
    pub fn dims(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl TensorWrapper {
    /// 转换为python对象
    ///
    /// ```python,ignore
    /// import torch
    /// tensor = torch.from_numpy(array)
    /// ```
    pub fn to_py_tensor<'py>(self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let array = PyArray::from_vec(py, self.data).reshape(self.shape)?;

        let torch = py.import("torch")?;
        torch.getattr("from_numpy")?.call1((array,))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let result = TensorWrapper::new(vec![0.0; 5], vec![1, 2, 2, 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zeros() {
        let tensor = TensorWrapper::zeros(vec![1, 1, 1, 4]);
        assert_eq!(tensor.dims(), &[1, 1, 1, 4]);
        assert_eq!(tensor.data(), &[0.0; 4]);
    }
}
