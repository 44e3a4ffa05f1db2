//! ComfyUI 包装

mod prompt_server;
pub use prompt_server::PromptServer;

pub mod types;
