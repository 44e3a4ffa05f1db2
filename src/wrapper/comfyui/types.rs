//! 类型定义
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

use pyo3::{ffi::c_str, pyfunction, Bound, PyResult, Python};

pub const NODE_INT: &str = "INT";
pub const NODE_FLOAT: &str = "FLOAT";
pub const NODE_STRING: &str = "STRING";
pub const NODE_BOOLEAN: &str = "BOOLEAN";
pub const NODE_IMAGE: &str = "IMAGE";
pub const NODE_VEC2: &str = "VEC2";

// 隐藏输入
pub const NODE_PROMPT: &str = "PROMPT";
pub const NODE_UNIQUE_ID: &str = "UNIQUE_ID";

/// 任意类型
#[pyfunction]
pub fn any_type(py: Python<'_>) -> PyResult<Bound<'_, pyo3::PyAny>> {
    let code = c_str!(
        r#"
class AlwaysEqualProxy(str):
    def __eq__(self, _):
        return True
    def __ne__(self, _):
        return False
        "#
    );

    py.run(code, None, None)?;
    py.eval(c_str!("AlwaysEqualProxy('*')"), None, None)
}
