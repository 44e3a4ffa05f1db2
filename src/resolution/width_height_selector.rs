//! 宽高选择器
//!
//! 从分辨率预设中选择宽高, 或使用自定义宽高

use std::collections::HashMap;

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyErr, PyResult, Python,
};

use crate::{
    core::category::CATEGORY_RESOLUTION,
    error::Error,
    resolution::presets::{
        preset_names, preset_options, PRESET_CUSTOM, PRESET_MAX_DIMENSION, PRESET_MIN_DIMENSION,
    },
    wrapper::comfyui::{
        types::{NODE_BOOLEAN, NODE_INT},
        PromptServer,
    },
};

/// 默认预设
const DEFAULT_PRESET: &str = "1024×1024";

/// 宽高选择器
#[pyclass(subclass)]
pub struct WidthHeightSelector {}

impl PromptServer for WidthHeightSelector {}

#[pymethods]
impl WidthHeightSelector {
    #[new]
    fn new() -> Self {
        Self {}
    }

    // 返回参数类型
    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_INT, NODE_INT)
    }

    // 返回参数名称
    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("width", "height")
    }

    // 节点分类
    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_RESOLUTION;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Select width and height from SDXL, FLUX, Ultra-Wide and Qwen presets, or enter custom dimensions."
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
                    "preset",
                    (preset_names(), {
                        let mut preset = HashMap::new();
                        preset.insert("default", DEFAULT_PRESET);
                        preset.insert("tooltip", "Resolution preset, 'custom' uses width/height");
                        preset
                    }),
                )?;
                for (name, tooltip) in [
                    ("width", "Custom width, rounded to a multiple of 8"),
                    ("height", "Custom height, rounded to a multiple of 8"),
                ] {
                    required.set_item(
                        name,
                        (NODE_INT, {
                            let params = PyDict::new(py);
                            params.set_item("default", 1024)?;
                            params.set_item("min", PRESET_MIN_DIMENSION)?;
                            params.set_item("max", PRESET_MAX_DIMENSION)?;
                            params.set_item("step", 8)?;
                            params.set_item("tooltip", tooltip)?;
                            params
                        }),
                    )?;
                }
                required.set_item(
                    "swap_dimensions",
                    (NODE_BOOLEAN, {
                        let swap = PyDict::new(py);
                        swap.set_item("default", false)?;
                        swap.set_item("label_on", "enabled")?;
                        swap.set_item("label_off", "disabled")?;
                        swap
                    }),
                )?;
                required
            })?;
            Ok(dict.into())
        })
    }

    #[pyo3(name = "execute")]
    fn execute(
        &self,
        py: Python,
        preset: String,
        width: i64,
        height: i64,
        swap_dimensions: bool,
    ) -> PyResult<(u32, u32)> {
        match resolve_dimensions(&preset, width, height, swap_dimensions) {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("WidthHeightSelector error, {e}");
                if let Err(e) =
                    self.send_error(py, "WidthHeightSelector".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

/// 解析最终宽高
pub fn resolve_dimensions(
    preset: &str,
    width: i64,
    height: i64,
    swap_dimensions: bool,
) -> Result<(u32, u32), Error> {
    let (w, h) = if preset == PRESET_CUSTOM {
        (snap_dimension(width), snap_dimension(height))
    } else {
        preset_options(preset)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown preset: {preset}")))?
    };

    if swap_dimensions {
        Ok((h, w))
    } else {
        Ok((w, h))
    }
}

/// 取最接近的 8 的倍数, 并限制在预设边界内
fn snap_dimension(value: i64) -> u32 {
    let snapped = ((value + 4).div_euclid(8)) * 8;
    snapped.clamp(PRESET_MIN_DIMENSION as i64, PRESET_MAX_DIMENSION as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_preset() -> anyhow::Result<()> {
        assert_eq!(resolve_dimensions("832×1216", 0, 0, false)?, (832, 1216));
        assert_eq!(resolve_dimensions("832×1216", 0, 0, true)?, (1216, 832));
        Ok(())
    }

    #[test]
    fn test_custom_dimensions_are_snapped() -> anyhow::Result<()> {
        assert_eq!(resolve_dimensions(PRESET_CUSTOM, 1000, 515, false)?, (1000, 512));
        assert_eq!(resolve_dimensions(PRESET_CUSTOM, 1003, 1005, false)?, (1000, 1008));
        assert_eq!(resolve_dimensions(PRESET_CUSTOM, 10, 99999, false)?, (64, 8192));
        assert_eq!(resolve_dimensions(PRESET_CUSTOM, 512, 768, true)?, (768, 512));
        Ok(())
    }

    #[test]
    fn test_unknown_preset() {
        assert!(resolve_dimensions("13×37", 512, 512, false).is_err());
    }
}
