//! 宽高转 VEC2
//!
//! 将宽高转换为 VEC2 元组, 供需要向量输入的节点使用 (如 jovi_glsl)

use log::{error, info};
use pyo3::{
    exceptions::PyValueError,
    pyclass, pymethods,
    types::{PyAnyMethods, PyDict, PyDictMethods, PyFloat, PyInt, PyString, PyType, PyTypeMethods},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::category::CATEGORY_RESOLUTION,
    error::Error,
    wrapper::comfyui::{
        types::{NODE_INT, NODE_VEC2},
        PromptServer,
    },
};

pub const VEC2_MIN: i64 = 1;
pub const VEC2_MAX: i64 = 8192;

/// 宽高转 VEC2
#[pyclass(subclass)]
pub struct WidthHeightToVec2 {}

impl PromptServer for WidthHeightToVec2 {}

#[pymethods]
impl WidthHeightToVec2 {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_VEC2,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("vec2",)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_RESOLUTION;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Convert width and height values to a VEC2 tuple."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "convert_to_vec2";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                for (name, tooltip) in [
                    ("width", "Width value (x component of VEC2)"),
                    ("height", "Height value (y component of VEC2)"),
                ] {
                    required.set_item(
                        name,
                        (NODE_INT, {
                            let params = PyDict::new(py);
                            params.set_item("default", 1024)?;
                            params.set_item("min", VEC2_MIN)?;
                            params.set_item("max", VEC2_MAX)?;
                            params.set_item("step", 1)?;
                            params.set_item("tooltip", tooltip)?;
                            params
                        }),
                    )?;
                }
                required
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "convert_to_vec2")]
    fn convert_to_vec2<'py>(
        &self,
        py: Python<'py>,
        width: Bound<'py, PyAny>,
        height: Bound<'py, PyAny>,
    ) -> PyResult<((i64, i64),)> {
        match to_vec2(&width, &height) {
            Ok(v) => {
                info!("Converted to VEC2: ({}, {})", v.0, v.1);
                Ok((v,))
            }
            Err(e) => {
                error!("WidthHeightToVec2 error, {e}");
                if let Err(e) =
                    self.send_error(py, "WidthHeightToVec2".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                }
                Err(PyErr::new::<PyValueError, _>(format!(
                    "Failed to convert to VEC2: {e}"
                )))
            }
        }
    }
}

/// 转换并限制宽高
fn to_vec2(width: &Bound<'_, PyAny>, height: &Bound<'_, PyAny>) -> Result<(i64, i64), Error> {
    let w = py_to_int(width, "width")?;
    let h = py_to_int(height, "height")?;
    Ok(clamp_vec2(w, h))
}

/// 将 python 值转换为整数
///
/// int 原样返回, float 截断, str 先按浮点解析再截断, 其他类型调用 `__int__`
fn py_to_int(value: &Bound<'_, PyAny>, name: &str) -> Result<i64, Error> {
    if value.is_instance_of::<PyInt>() {
        return saturating_int(value);
    }
    if value.is_instance_of::<PyFloat>() {
        return float_to_int(value.extract::<f64>()?, name);
    }
    if value.is_instance_of::<PyString>() {
        return parse_dimension(&value.extract::<String>()?, name);
    }

    match value.call_method0("__int__") {
        Ok(v) if v.is_instance_of::<PyInt>() => saturating_int(&v),
        _ => {
            let type_name = value
                .get_type()
                .name()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::TypeConversion(format!(
                "Cannot convert {name} of type {type_name} to integer"
            )))
        }
    }
}

/// 超出 i64 范围的 python int 取对应方向的边界值
fn saturating_int(value: &Bound<'_, PyAny>) -> Result<i64, Error> {
    match value.extract::<i64>() {
        Ok(v) => Ok(v),
        Err(_) if value.lt(0)? => Ok(i64::MIN),
        Err(_) => Ok(i64::MAX),
    }
}

/// 解析字符串形式的尺寸, 支持 "1024" 和 "1024.0"
pub fn parse_dimension(value: &str, name: &str) -> Result<i64, Error> {
    let parsed = value.trim().parse::<f64>().map_err(|_| {
        Error::TypeConversion(format!("Cannot convert {name} string '{value}' to integer"))
    })?;
    float_to_int(parsed, name)
}

fn float_to_int(value: f64, name: &str) -> Result<i64, Error> {
    if !value.is_finite() {
        return Err(Error::TypeConversion(format!(
            "Cannot convert {name} value {value} to integer"
        )));
    }
    Ok(value.trunc() as i64)
}

/// 限制在 [1, 8192]
pub fn clamp_vec2(width: i64, height: i64) -> (i64, i64) {
    (
        width.clamp(VEC2_MIN, VEC2_MAX),
        height.clamp(VEC2_MIN, VEC2_MAX),
    )
}
