//! 采样器节点
use pyo3::{
    types::{PyModule, PyModuleMethods},
    wrap_pyfunction, Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod samplers;
pub use samplers::{SamplerCatalog, SamplerSettings};

mod sampler_combo;
pub use sampler_combo::{
    combo_analysis, recommended_cfg, recommended_steps, sampler_info, SamplerCombo,
    SamplerComboCompact,
};

/// 采样器模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "sampler")?;
    submodule.add_class::<SamplerCombo>()?;
    submodule.add_class::<SamplerComboCompact>()?;
    submodule.add_function(wrap_pyfunction!(sampler_info, &submodule)?)?;
    submodule.add_function(wrap_pyfunction!(combo_analysis, &submodule)?)?;
    submodule.add_function(wrap_pyfunction!(recommended_steps, &submodule)?)?;
    submodule.add_function(wrap_pyfunction!(recommended_cfg, &submodule)?)?;
    Ok(submodule)
}

/// Sampler node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister("SamplerCombo", py.get_type::<SamplerCombo>(), "Sampler Combo"),
        NodeRegister(
            "SamplerComboCompact",
            py.get_type::<SamplerComboCompact>(),
            "Sampler Combo (Compact)",
        ),
    ];
    Ok(nodes)
}
