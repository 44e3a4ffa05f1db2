//! 媒体类型与过滤

use std::{fs::Metadata, path::Path, time::UNIX_EPOCH};

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::error::Error;

/// 图片扩展名
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];
/// 视频扩展名
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi"];
/// 音频扩展名
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Dir,
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// 根据扩展名判断文件类型, 大小写不敏感
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let matches = |exts: &[&str]| exts.iter().any(|v| *v == ext);
        if matches(IMAGE_EXTENSIONS) {
            Some(Self::Image)
        } else if matches(VIDEO_EXTENSIONS) {
            Some(Self::Video)
        } else if matches(AUDIO_EXTENSIONS) {
            Some(Self::Audio)
        } else {
            None
        }
    }
}

/// 浏览器条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub path: String,
    pub name: String,
    /// 所在目录, 仅搜索结果包含
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub mtime: f64,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn new(path: &Path, metadata: &Metadata, kind: MediaKind) -> Result<Self, Error> {
        let name = path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let mtime = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)?
            .as_secs_f64();

        Ok(Self {
            path: path.to_string_lossy().to_string(),
            name,
            directory: None,
            mtime,
            size: metadata.len(),
            kind,
        })
    }

    pub fn with_directory(mut self, directory: &Path) -> Self {
        self.directory = Some(directory.to_string_lossy().to_string());
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == MediaKind::Dir
    }
}

/// 条目过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFilter {
    pub show_videos: bool,
    pub show_audio: bool,
    pub hide_dot_folders: bool,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            show_videos: false,
            show_audio: false,
            hide_dot_folders: true,
        }
    }
}

impl MediaFilter {
    /// 目录是否可见
    pub fn allows_dir(&self, name: &str) -> bool {
        !(self.hide_dot_folders && name.starts_with('.'))
    }

    /// 文件类型, 不显示的文件返回 None
    pub fn file_kind(&self, path: &Path) -> Option<MediaKind> {
        match MediaKind::from_extension(path)? {
            MediaKind::Video if !self.show_videos => None,
            MediaKind::Audio if !self.show_audio => None,
            kind => Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(MediaKind::from_extension(Path::new("a.PNG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension(Path::new("a.webp")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension(Path::new("a.Mp4")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension(Path::new("a.flac")), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension(Path::new("a.txt")), None);
        assert_eq!(MediaKind::from_extension(Path::new("png")), None);
    }

    #[test]
    fn test_filter() {
        let filter = MediaFilter::default();
        assert_eq!(filter.file_kind(Path::new("a.jpg")), Some(MediaKind::Image));
        assert_eq!(filter.file_kind(Path::new("a.mp4")), None);
        assert_eq!(filter.file_kind(Path::new("a.wav")), None);
        assert!(!filter.allows_dir(".git"));
        assert!(filter.allows_dir("photos"));

        let filter = MediaFilter {
            show_videos: true,
            show_audio: true,
            hide_dot_folders: false,
        };
        assert_eq!(filter.file_kind(Path::new("a.mp4")), Some(MediaKind::Video));
        assert_eq!(filter.file_kind(Path::new("a.wav")), Some(MediaKind::Audio));
        assert!(filter.allows_dir(".git"));
    }

    #[test]
    fn test_kind_names() -> anyhow::Result<()> {
        assert_eq!(MediaKind::Dir.to_string(), "dir");
        assert_eq!(MediaKind::from_str("image")?, MediaKind::Image);
        assert_eq!(serde_json::to_string(&MediaKind::Audio)?, "\"audio\"");
        Ok(())
    }
}
