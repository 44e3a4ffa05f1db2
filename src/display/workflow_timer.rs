//! 工作流计时器
//!
//! 仅用于显示, 计时由前端根据执行事件完成

use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyResult, Python,
};

use crate::{
    core::category::CATEGORY_UTILS,
    wrapper::comfyui::types::{NODE_PROMPT, NODE_UNIQUE_ID},
};

/// 工作流计时器
#[pyclass(subclass)]
pub struct KikoWorkflowTimer {}

#[pymethods]
impl KikoWorkflowTimer {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "DISPLAY_NAME")]
    const DISPLAY_NAME: &'static str = "Workflow Timer";

    #[classattr]
    #[pyo3(name = "OUTPUT_NODE")]
    fn output_node() -> bool {
        true
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() {}

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_UTILS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Display the elapsed time of the running workflow."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let dict = PyDict::new(py);
            dict.set_item("required", PyDict::new(py))?;
            dict.set_item("hidden", {
                let hidden = PyDict::new(py);
                hidden.set_item("prompt", NODE_PROMPT)?;
                hidden.set_item("unique_id", NODE_UNIQUE_ID)?;
                hidden
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "execute", signature = (**_kwargs))]
    fn execute<'py>(
        &self,
        py: Python<'py>,
        _kwargs: Option<Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyDict>> {
        Ok(PyDict::new(py))
    }
}
