pub mod core;
pub mod error;
pub mod wrapper;

pub mod browser;
pub mod display;
pub mod resolution;
pub mod sampler;

use pyo3::{
    pymodule,
    types::{PyDict, PyDictMethods, PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};
use tracing_subscriber::EnvFilter;

use crate::core::{node::NodeRegister, settings::ENV_LOG};

/// A Python module implemented in Rust.
#[pymodule]
#[pyo3(name = "comfyui_kikotools")] // 需要与包名保持一致
fn py_init(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // 初始化日志
    // 每个扩展模块都有自己的全局变量, 日志级别由 KIKOTOOLS_LOG 控制, 默认 info
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_ansi(true)
        .with_env_filter(filter)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init();

    // 添加子模块
    let browser = browser::submodule(py)?;
    m.add_submodule(&resolution::submodule(py)?)?;
    m.add_submodule(&sampler::submodule(py)?)?;
    m.add_submodule(&display::submodule(py)?)?;
    m.add_submodule(&browser)?;

    // 注册 ComfyUI NODE_CLASS_MAPPINGS/NODE_DISPLAY_NAME_MAPPINGS
    let node_mapping = PyDict::new(py);
    let name_mapping = PyDict::new(py);

    // 批量注册节点
    let nodes = node_register(py)?;
    for node in nodes {
        node_mapping.set_item(node.0, node.1)?;
        name_mapping.set_item(node.0, node.2)?;
    }

    m.add("NODE_CLASS_MAPPINGS", node_mapping)?;
    m.add("NODE_DISPLAY_NAME_MAPPINGS", name_mapping)?;

    // 注册本地媒体浏览器接口
    browser::api::register_routes(py, &browser)?;
    Ok(())
}

/// 节点注册
fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let mut nodes: Vec<NodeRegister> = Vec::new();
    nodes.extend(resolution::node_register(py)?);
    nodes.extend(sampler::node_register(py)?);
    nodes.extend(display::node_register(py)?);
    nodes.extend(browser::node_register(py)?);
    Ok(nodes)
}
