//! 节点分类

/// 分辨率
pub const CATEGORY_RESOLUTION: &str = "🫶 ComfyAssets/🖼️ Resolution";
/// 采样器
pub const CATEGORY_SAMPLERS: &str = "🫶 ComfyAssets/🌀 Samplers";
/// 图片
pub const CATEGORY_IMAGES: &str = "🫶 ComfyAssets/💾 Images";
/// 实用工具
pub const CATEGORY_UTILS: &str = "🫶 ComfyAssets/🛠️ Utils";
