//! 本地媒体浏览器
use pyo3::{
    types::{PyModule, PyModuleMethods},
    wrap_pyfunction, Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod api;
pub mod media;
pub mod metadata;
pub mod scanner;
pub mod store;
pub mod thumbnail;

mod local_image_loader;
pub use local_image_loader::KikoLocalImageLoader;

/// 浏览器模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "browser")?;
    submodule.add_class::<KikoLocalImageLoader>()?;
    submodule.add_function(wrap_pyfunction!(api::dispatch, &submodule)?)?;
    Ok(submodule)
}

/// Browser node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "KikoLocalImageLoader",
        py.get_type::<KikoLocalImageLoader>(),
        "Local Image Loader",
    )];
    Ok(nodes)
}
