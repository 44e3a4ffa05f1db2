//! 本地图片加载
//!
//! 前端通过浏览器接口记录选择, 节点执行时按 unique_id 读取记录并加载图片

use std::path::Path;

use log::{error, info};
use pyo3::{
    pyclass, pymethods,
    types::{PyAnyMethods, PyDict, PyDictMethods, PyType},
    Bound, Py, PyAny, PyResult, Python,
};

use crate::{
    browser::{
        media::MediaKind,
        metadata::{empty_image, load_image},
        store::SelectionStore,
    },
    core::category::CATEGORY_IMAGES,
    error::Error,
    wrapper::{
        comfyui::{
            types::{NODE_IMAGE, NODE_STRING, NODE_UNIQUE_ID},
            PromptServer,
        },
        torch::TensorWrapper,
    },
};

/// 本地图片加载
#[pyclass(subclass)]
pub struct KikoLocalImageLoader {}

impl PromptServer for KikoLocalImageLoader {}

#[pymethods]
impl KikoLocalImageLoader {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_IMAGE, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("image", "info")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_IMAGES;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Load an image selected in the local media browser."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "load_media";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let dict = PyDict::new(py);
            dict.set_item("required", PyDict::new(py))?;
            dict.set_item("hidden", {
                let hidden = PyDict::new(py);
                hidden.set_item("unique_id", NODE_UNIQUE_ID)?;
                hidden
            })?;
            Ok(dict.into())
        })
    }

    /// 选择记录文件变化时重新执行
    #[classmethod]
    #[pyo3(name = "IS_CHANGED", signature = (**_kwargs))]
    fn is_changed(_cls: &Bound<'_, PyType>, _kwargs: Option<Bound<'_, PyDict>>) -> f64 {
        selection_marker(&SelectionStore::global())
    }

    #[pyo3(name = "load_media")]
    fn load_media<'py>(
        &self,
        py: Python<'py>,
        unique_id: Bound<'py, PyAny>,
    ) -> PyResult<(Bound<'py, PyAny>, String)> {
        let node_id = unique_id.str()?.to_string();
        let store = SelectionStore::global();

        let (tensor, info) = match py.allow_threads(|| load_selected(&store, &node_id)) {
            Ok(v) => v,
            Err(e) => {
                error!("KikoLocalImageLoader error, {e}");
                if let Err(e) =
                    self.send_error(py, "KikoLocalImageLoader".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                }
                (empty_image(), String::new())
            }
        };

        Ok((tensor.to_py_tensor(py)?, info))
    }
}

/// 选择记录文件的修改时间, 无记录时为 inf 使节点总是重新执行
fn selection_marker(store: &SelectionStore) -> f64 {
    store.modified_time().unwrap_or(f64::INFINITY)
}

/// 加载节点选择的图片
///
/// 未选择或文件不存在时返回空图片与空信息
pub fn load_selected(store: &SelectionStore, node_id: &str) -> Result<(TensorWrapper, String), Error> {
    let selected = store.selected_path(node_id, &MediaKind::Image.to_string())?;
    let Some(path) = selected else {
        return Ok((empty_image(), String::new()));
    };
    if !Path::new(&path).exists() {
        info!("selected image not found: {path}");
        return Ok((empty_image(), String::new()));
    }

    let (tensor, image_info) = load_image(Path::new(&path))?;
    Ok((tensor, image_info.to_pretty_json()?))
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use pyo3::types::PyTypeMethods;

    use super::*;

    #[test]
    fn test_load_selected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let image_path = dir.path().join("pick.png");
        RgbImage::from_pixel(5, 3, Rgb([9, 9, 9])).save(&image_path)?;

        let store = SelectionStore::new(dir.path().join("selections.json"));
        store.set("42", "image", &image_path.to_string_lossy())?;

        let (tensor, info) = load_selected(&store, "42")?;
        assert_eq!(tensor.dims(), &[1, 3, 5, 3]);
        assert!(info.contains("\"filename\": \"pick.png\""));
        Ok(())
    }

    #[test]
    fn test_no_selection_returns_empty() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SelectionStore::new(dir.path().join("selections.json"));

        let (tensor, info) = load_selected(&store, "1")?;
        assert_eq!(tensor.dims(), &[1, 1, 1, 4]);
        assert!(info.is_empty());

        store.set("1", "image", "/nonexistent/gone.png")?;
        let (tensor, info) = load_selected(&store, "1")?;
        assert_eq!(tensor.dims(), &[1, 1, 1, 4]);
        assert!(info.is_empty());
        Ok(())
    }

    #[test]
    fn test_broken_image_is_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"garbage")?;

        let store = SelectionStore::new(dir.path().join("selections.json"));
        store.set("3", "image", &path.to_string_lossy())?;
        assert!(load_selected(&store, "3").is_err());
        Ok(())
    }

    #[test]
    fn test_selection_marker() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SelectionStore::new(dir.path().join("selections.json"));
        assert_eq!(selection_marker(&store), f64::INFINITY);

        store.set("5", "image", "/a.png")?;
        let marker = selection_marker(&store);
        assert!(marker.is_finite());
        assert!(marker > 0.0);
        Ok(())
    }

    #[test]
    fn test_is_changed_from_python() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| -> anyhow::Result<()> {
            let cls = py.get_type::<KikoLocalImageLoader>();
            assert_eq!(cls.name()?.to_string(), "KikoLocalImageLoader");

            let marker = cls.call_method0("IS_CHANGED")?.extract::<f64>()?;
            let expected = selection_marker(&SelectionStore::global());
            if expected.is_infinite() {
                assert!(marker.is_infinite());
            } else {
                assert_eq!(marker, expected);
            }

            let kwargs = PyDict::new(py);
            kwargs.set_item("unique_id", "9")?;
            let marker = cls.call_method("IS_CHANGED", (), Some(&kwargs))?.extract::<f64>()?;
            assert!(marker.is_infinite() || marker > 0.0);
            Ok(())
        })
    }
}
