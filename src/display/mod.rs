//! 显示节点
use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

mod display_any;
pub use display_any::DisplayAny;

mod display_text;
pub use display_text::DisplayText;

mod workflow_timer;
pub use workflow_timer::KikoWorkflowTimer;

/// 显示模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "display")?;
    submodule.add_class::<DisplayAny>()?;
    submodule.add_class::<DisplayText>()?;
    submodule.add_class::<KikoWorkflowTimer>()?;
    Ok(submodule)
}

/// Display node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister("DisplayAny", py.get_type::<DisplayAny>(), "Display Any"),
        NodeRegister("DisplayText", py.get_type::<DisplayText>(), "Display Text"),
        NodeRegister(
            "KikoWorkflowTimer",
            py.get_type::<KikoWorkflowTimer>(),
            "Workflow Timer",
        ),
    ];
    Ok(nodes)
}
