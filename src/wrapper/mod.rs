// python 包装
pub mod comfyui;
pub mod torch;
