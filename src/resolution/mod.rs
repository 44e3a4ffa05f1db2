//! 分辨率节点
use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod presets;

mod width_height_selector;
pub use width_height_selector::{resolve_dimensions, WidthHeightSelector};

mod width_height_to_vec2;
pub use width_height_to_vec2::WidthHeightToVec2;

/// 分辨率模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "resolution")?;
    submodule.add_class::<WidthHeightSelector>()?;
    submodule.add_class::<WidthHeightToVec2>()?;
    Ok(submodule)
}

/// Resolution node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "WidthHeightSelector",
            py.get_type::<WidthHeightSelector>(),
            "Width Height Selector",
        ),
        NodeRegister(
            "WidthHeightToVec2",
            py.get_type::<WidthHeightToVec2>(),
            "Width Height to VEC2",
        ),
    ];
    Ok(nodes)
}
