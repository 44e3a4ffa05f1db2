//! 错误处理

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // 标准库错误处理
    #[error("io error, {0}")]
    Io(std::io::Error),
    #[error("system time error, {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
    // std::sync::poison::rwlock
    #[error("lock error, {0}")]
    LockError(String),

    #[error("serde json error, {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("type conversion failed, {0}")]
    TypeConversion(String),

    #[error("py error, {0}")]
    PyErr(#[from] pyo3::PyErr),
    #[error("pythonize error, {0}")]
    PythonizeError(#[from] pythonize::PythonizeError),

    #[error("image error, {0}")]
    ImageError(#[from] image::ImageError),
    #[error("png decoding error, {0}")]
    PngDecodingError(#[from] png::DecodingError),

    #[error("invalid directory, {0}")]
    InvalidDirectory(String),
    #[error("invalid parameter, {0}")]
    InvalidParameter(String),

    #[error("file not found, {0}")]
    FileNotFound(String),
    #[error("invalid input, {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
