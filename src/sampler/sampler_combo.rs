//! 采样器组合
//!
//! 在一个节点中选择采样器、调度器、步数与 CFG

use log::{error, warn};
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pyfunction, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::category::CATEGORY_SAMPLERS,
    error::Error,
    sampler::samplers::{
        cfg_recommendation, steps_recommendation, SamplerCatalog, SamplerSettings,
        DEFAULT_CFG, DEFAULT_SAMPLER, DEFAULT_SCHEDULER, DEFAULT_STEPS,
    },
    wrapper::comfyui::{
        types::{NODE_FLOAT, NODE_INT},
        PromptServer,
    },
};

/// 节点界面步数上限
const STEPS_INPUT_MAX: i64 = 100;
/// 节点界面 CFG 上限
const CFG_INPUT_MAX: f64 = 20.0;

/// 采样器组合
#[pyclass(subclass)]
pub struct SamplerCombo {}

impl PromptServer for SamplerCombo {}

#[pymethods]
impl SamplerCombo {
    #[new]
    fn new() -> Self {
        Self {}
    }

    // 采样器与调度器以列表作为类型, 可直接连接 KSampler
    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types(py: Python<'_>) -> (Vec<String>, Vec<String>, &'static str, &'static str) {
        let catalog = SamplerCatalog::from_host(py);
        (catalog.samplers, catalog.schedulers, NODE_INT, NODE_FLOAT)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str, &'static str) {
        ("sampler_name", "scheduler", "steps", "cfg")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_SAMPLERS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Select sampler, scheduler, steps and CFG in one node."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "get_sampler_combo";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let catalog = SamplerCatalog::from_host(py);
            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                set_combo_inputs(py, &required, catalog)?;
                required.set_item(
                    "steps",
                    (NODE_INT, {
                        let steps = PyDict::new(py);
                        steps.set_item("default", DEFAULT_STEPS)?;
                        steps.set_item("min", 1)?;
                        steps.set_item("max", STEPS_INPUT_MAX)?;
                        steps.set_item("step", 1)?;
                        steps.set_item("tooltip", "Number of sampling steps")?;
                        steps
                    }),
                )?;
                required.set_item(
                    "cfg",
                    (NODE_FLOAT, {
                        let cfg = PyDict::new(py);
                        cfg.set_item("default", DEFAULT_CFG)?;
                        cfg.set_item("min", 0.0)?;
                        cfg.set_item("max", CFG_INPUT_MAX)?;
                        cfg.set_item("step", 0.1)?;
                        cfg.set_item("round", 0.01)?;
                        cfg.set_item("tooltip", "Classifier free guidance scale")?;
                        cfg
                    }),
                )?;
                required
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "get_sampler_combo")]
    fn get_sampler_combo(
        &self,
        py: Python,
        sampler_name: String,
        scheduler: String,
        steps: i64,
        cfg: f64,
    ) -> PyResult<(String, String, i64, f64)> {
        let catalog = SamplerCatalog::from_host(py);
        if !catalog.validate(&sampler_name, &scheduler, steps, cfg) {
            let msg = format!(
                "invalid sampler settings: {sampler_name}/{scheduler}, steps={steps}, cfg={cfg}"
            );
            warn!("SamplerCombo {msg}");
            if let Err(e) = self.send_error(py, "SamplerCombo".to_string(), msg) {
                error!("send error failed, {e}");
            }
        }
        Ok(catalog
            .sampler_combo(&sampler_name, &scheduler, steps, cfg)
            .into_tuple())
    }
}

/// 采样器组合 (精简)
///
/// 只选择采样器与调度器
#[pyclass(subclass)]
pub struct SamplerComboCompact {}

impl PromptServer for SamplerComboCompact {}

#[pymethods]
impl SamplerComboCompact {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types(py: Python<'_>) -> (Vec<String>, Vec<String>) {
        let catalog = SamplerCatalog::from_host(py);
        (catalog.samplers, catalog.schedulers)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("sampler_name", "scheduler")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_SAMPLERS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Select sampler and scheduler."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "get_sampler_combo";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let catalog = SamplerCatalog::from_host(py);
            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                set_combo_inputs(py, &required, catalog)?;
                required
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "get_sampler_combo")]
    fn get_sampler_combo(
        &self,
        py: Python,
        sampler_name: String,
        scheduler: String,
    ) -> PyResult<(String, String)> {
        let catalog = SamplerCatalog::from_host(py);
        if !catalog.has_sampler(&sampler_name) || !catalog.has_scheduler(&scheduler) {
            let msg = format!("invalid sampler settings: {sampler_name}/{scheduler}");
            warn!("SamplerComboCompact {msg}");
            if let Err(e) = self.send_error(py, "SamplerComboCompact".to_string(), msg) {
                error!("send error failed, {e}");
            }
        }
        let SamplerSettings {
            sampler, scheduler, ..
        } = catalog.sampler_combo(&sampler_name, &scheduler, DEFAULT_STEPS, DEFAULT_CFG);
        Ok((sampler, scheduler))
    }
}

/// 采样器与调度器下拉框
fn set_combo_inputs<'py>(
    py: Python<'py>,
    required: &Bound<'py, PyDict>,
    catalog: SamplerCatalog,
) -> PyResult<()> {
    required.set_item(
        "sampler_name",
        (catalog.samplers, {
            let sampler = PyDict::new(py);
            sampler.set_item("default", DEFAULT_SAMPLER)?;
            sampler.set_item("tooltip", "Sampling algorithm")?;
            sampler
        }),
    )?;
    required.set_item(
        "scheduler",
        (catalog.schedulers, {
            let scheduler = PyDict::new(py);
            scheduler.set_item("default", DEFAULT_SCHEDULER)?;
            scheduler.set_item("tooltip", "Noise schedule")?;
            scheduler
        }),
    )?;
    Ok(())
}

/// 采样器目录信息
#[pyfunction]
pub fn sampler_info(py: Python<'_>) -> PyResult<Bound<'_, PyAny>> {
    let info = SamplerCatalog::from_host(py).info();
    to_py(py, &info, "sampler_info")
}

/// 分析采样器设置组合
#[pyfunction]
pub fn combo_analysis<'py>(
    py: Python<'py>,
    sampler_name: &str,
    scheduler: &str,
    steps: i64,
    cfg: f64,
) -> PyResult<Bound<'py, PyAny>> {
    let analysis = SamplerCatalog::from_host(py).combo_analysis(sampler_name, scheduler, steps, cfg);
    to_py(py, &analysis, "combo_analysis")
}

/// 推荐步数
#[pyfunction]
pub fn recommended_steps<'py>(py: Python<'py>, sampler_name: &str) -> PyResult<Bound<'py, PyAny>> {
    to_py(py, &steps_recommendation(sampler_name), "recommended_steps")
}

/// 推荐 CFG
#[pyfunction]
pub fn recommended_cfg<'py>(py: Python<'py>, sampler_name: &str) -> PyResult<Bound<'py, PyAny>> {
    to_py(py, &cfg_recommendation(sampler_name), "recommended_cfg")
}

fn to_py<'py, T: serde::Serialize>(
    py: Python<'py>,
    value: &T,
    name: &str,
) -> PyResult<Bound<'py, PyAny>> {
    pythonize::pythonize(py, value)
        .map_err(Error::PythonizeError)
        .map_err(|e| {
            error!("{name} error, {e}");
            PyErr::new::<PyRuntimeError, _>(e.to_string())
        })
}
