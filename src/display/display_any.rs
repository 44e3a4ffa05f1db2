//! 显示任意值

use log::error;
use pyo3::{
    exceptions::{PyRuntimeError, PyTypeError, PyValueError},
    pyclass, pymethods,
    types::{PyAnyMethods, PyDict, PyDictMethods, PyModule, PyString, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::category::CATEGORY_UTILS,
    error::Error,
    wrapper::comfyui::{
        types::{any_type, NODE_STRING},
        PromptServer,
    },
};

/// 显示任意值
#[pyclass(subclass)]
pub struct DisplayAny {}

impl PromptServer for DisplayAny {}

#[pymethods]
impl DisplayAny {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_NODE")]
    fn output_node() -> bool {
        true
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_STRING,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("text",)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_UTILS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Display any value as text in the node."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                required.set_item(
                    "value",
                    (any_type(py)?, {
                        let value = PyDict::new(py);
                        value.set_item("tooltip", "any input")?;
                        value
                    }),
                )?;
                required
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "execute")]
    fn execute<'py>(&self, py: Python<'py>, value: Bound<'py, PyAny>) -> PyResult<Bound<'py, PyDict>> {
        match render_value(&value) {
            Ok(text) => display_result(py, text),
            Err(e) => {
                error!("DisplayAny error, {e}");
                if let Err(e) = self.send_error(py, "DisplayAny".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

/// 组合为前端需要的数据结构
///
/// `{"ui": {"text": [text]}, "result": (text,)}`
pub(crate) fn display_result(py: Python<'_>, text: String) -> PyResult<Bound<'_, PyDict>> {
    let ui = PyDict::new(py);
    ui.set_item("text", vec![text.clone()])?;

    let dict = PyDict::new(py);
    dict.set_item("ui", ui)?;
    dict.set_item("result", (text,))?;
    Ok(dict)
}

/// 将 python 值渲染为文本
///
/// 字符串原样输出, 带 `shape` 属性的对象输出张量摘要,
/// 可序列化为 JSON 的值缩进输出, 其余使用 `str()`
fn render_value(value: &Bound<'_, PyAny>) -> Result<String, Error> {
    if value.is_instance_of::<PyString>() {
        return Ok(value.extract::<String>()?);
    }

    if value.hasattr("shape")? {
        let shape = value
            .getattr("shape")?
            .try_iter()?
            .map(|v| v.and_then(|v| v.extract::<i64>()))
            .collect::<PyResult<Vec<i64>>>()?;
        let dtype = match value.getattr("dtype") {
            Ok(v) => v.str()?.to_string(),
            Err(_) => "unknown".to_string(),
        };
        return Ok(tensor_summary(&shape, &dtype));
    }

    if let Some(json) = dump_json(value)? {
        return Ok(json);
    }

    Ok(value.str()?.to_string())
}

/// 张量摘要
fn tensor_summary(shape: &[i64], dtype: &str) -> String {
    let dims = shape
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<String>>()
        .join(", ");
    format!("Tensor shape: [{dims}], dtype: {dtype}")
}

/// 使用 python json 模块以两空格缩进序列化
///
/// 不可序列化的值返回 None
fn dump_json(value: &Bound<'_, PyAny>) -> Result<Option<String>, Error> {
    let py = value.py();
    let kwargs = PyDict::new(py);
    kwargs.set_item("indent", 2)?;

    let dumps = PyModule::import(py, "json")?.getattr("dumps")?;
    match dumps.call((value,), Some(&kwargs)) {
        Ok(text) => Ok(Some(text.extract::<String>()?)),
        Err(e) if e.is_instance_of::<PyTypeError>(py) || e.is_instance_of::<PyValueError>(py) => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use pyo3::ffi::c_str;

    use super::*;

    #[test]
    fn test_tensor_summary() {
        assert_eq!(
            tensor_summary(&[1, 512, 512, 3], "torch.float32"),
            "Tensor shape: [1, 512, 512, 3], dtype: torch.float32"
        );
        assert_eq!(tensor_summary(&[], "unknown"), "Tensor shape: [], dtype: unknown");
    }

    #[test]
    fn test_render_value() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| -> anyhow::Result<()> {
            let text = PyString::new(py, "plain text");
            assert_eq!(render_value(text.as_any())?, "plain text");

            let value = py.eval(c_str!("{'a': [1, 2]}"), None, None)?;
            assert_eq!(render_value(&value)?, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");

            let value = py.eval(c_str!("{1: 'a', 2: 'b'}"), None, None)?;
            assert_eq!(render_value(&value)?, "{\n  \"1\": \"a\",\n  \"2\": \"b\"\n}");

            let globals = PyDict::new(py);
            py.run(
                c_str!(
                    r#"
class FakeTensor:
    shape = (1, 64, 32, 3)
    dtype = "torch.float32"


class Opaque:
    def __str__(self):
        return "opaque value"
"#
                ),
                Some(&globals),
                None,
            )?;

            let tensor = py.eval(c_str!("FakeTensor()"), Some(&globals), None)?;
            assert_eq!(
                render_value(&tensor)?,
                "Tensor shape: [1, 64, 32, 3], dtype: torch.float32"
            );

            let opaque = py.eval(c_str!("Opaque()"), Some(&globals), None)?;
            assert_eq!(render_value(&opaque)?, "opaque value");

            let circular = py.eval(c_str!("(lambda v: v.append(v) or v)([])"), None, None)?;
            assert_eq!(render_value(&circular)?, "[[...]]");
            Ok(())
        })
    }

    #[test]
    fn test_display_result() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| -> anyhow::Result<()> {
            let result = display_result(py, "hi".to_string())?;
            let text = result
                .get_item("ui")?
                .map(|ui| ui.get_item("text"))
                .transpose()?
                .map(|v| v.extract::<Vec<String>>())
                .transpose()?;
            assert_eq!(text, Some(vec!["hi".to_string()]));

            let output = result
                .get_item("result")?
                .map(|v| v.extract::<(String,)>())
                .transpose()?;
            assert_eq!(output, Some(("hi".to_string(),)));
            Ok(())
        })
    }
}
