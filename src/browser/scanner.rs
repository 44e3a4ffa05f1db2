//! 目录扫描与搜索

use std::{
    cmp::Ordering,
    fs, io,
    path::{is_separator, Path, MAIN_SEPARATOR},
};

use log::{debug, warn};
use serde::Serialize;
use strum_macros::{Display, EnumString};
use walkdir::WalkDir;

use crate::{
    browser::media::{MediaFilter, MediaItem, MediaKind},
    error::Error,
};

/// 排序字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Date,
    Size,
}

/// 排序方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortBy {
    /// 未知字段按名称排序
    pub fn parse(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl SortOrder {
    /// 未知方向按升序排序
    pub fn parse(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

/// 扫描单层目录
///
/// 目录排在文件之前; 消失或无权限的条目会被跳过
pub fn scan_directory(
    directory: &Path,
    filter: &MediaFilter,
    sort_by: SortBy,
    sort_order: SortOrder,
) -> Result<Vec<MediaItem>, Error> {
    if !directory.is_dir() {
        return Err(Error::InvalidDirectory(format!(
            "not a directory: {}",
            directory.display()
        )));
    }

    let mut items = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = match entry {
            Ok(v) => v,
            Err(e) => {
                debug!("skip entry in {}, {e}", directory.display());
                continue;
            }
        };
        if let Some(item) = entry_item(&entry.path(), filter) {
            items.push(item);
        }
    }

    sort_items(&mut items, sort_by, sort_order);
    Ok(items)
}

/// 构建条目, 不可见或无法读取的条目返回 None
fn entry_item(path: &Path, filter: &MediaFilter) -> Option<MediaItem> {
    let metadata = fs::metadata(path).ok()?;
    let name = path.file_name()?.to_string_lossy();

    let kind = if metadata.is_dir() {
        if !filter.allows_dir(&name) {
            return None;
        }
        MediaKind::Dir
    } else {
        filter.file_kind(path)?
    };

    MediaItem::new(path, &metadata, kind).ok()
}

/// 排序条目, 目录始终在前
pub fn sort_items(items: &mut [MediaItem], sort_by: SortBy, sort_order: SortOrder) {
    let compare = |a: &MediaItem, b: &MediaItem| -> Ordering {
        match sort_by {
            SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortBy::Date => a.mtime.total_cmp(&b.mtime),
            SortBy::Size => a.size.cmp(&b.size),
        }
    };

    match sort_order {
        SortOrder::Asc => items.sort_by(compare),
        SortOrder::Desc => items.sort_by(|a, b| compare(b, a)),
    }

    // 稳定排序, 保留同类条目的顺序
    items.sort_by_key(|v| !v.is_dir());
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<MediaItem>,
    pub total_pages: usize,
    pub current_page: usize,
}

/// 分页, 页码从 1 开始
pub fn paginate(items: Vec<MediaItem>, page: usize, per_page: usize) -> Result<Page, Error> {
    if page == 0 || per_page == 0 {
        return Err(Error::InvalidParameter(format!(
            "page and per_page must be positive, page={page}, per_page={per_page}"
        )));
    }

    let total_pages = items.len().div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page);
    let items = items.into_iter().skip(start).take(per_page).collect();

    Ok(Page {
        items,
        total_pages,
        current_page: page,
    })
}

/// 递归搜索文件名
///
/// 匹配的目录也会被继续搜索, 最多返回 `max_results` 条, 结果按名称排序
pub fn search_files(
    root: &Path,
    query: &str,
    filter: &MediaFilter,
    max_results: usize,
) -> Result<Vec<MediaItem>, Error> {
    if !root.is_dir() {
        return Err(Error::InvalidDirectory(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|e| {
        !e.file_type().is_dir() || filter.allows_dir(&e.file_name().to_string_lossy())
    });

    for entry in walker {
        if results.len() >= max_results {
            break;
        }
        let entry = match entry {
            Ok(v) => v,
            Err(e) => {
                debug!("search skip, {e}");
                continue;
            }
        };
        if !entry
            .file_name()
            .to_string_lossy()
            .to_lowercase()
            .contains(&query)
        {
            continue;
        }

        let Some(item) = entry_item(entry.path(), filter) else {
            continue;
        };
        let item = match entry.path().parent() {
            Some(parent) => item.with_directory(parent),
            None => item,
        };
        results.push(item);
    }

    results.sort_by_key(|v| v.name.to_lowercase());
    Ok(results)
}

/// 目录补全结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryListing {
    pub directories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryListing {
    fn from_result(result: io::Result<Vec<String>>, limit: usize) -> Self {
        match result {
            Ok(mut directories) => {
                directories.sort_by_key(|v| v.to_lowercase());
                directories.truncate(limit);
                Self {
                    directories,
                    error: None,
                }
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Self {
                directories: Vec::new(),
                error: Some("Permission denied".to_string()),
            },
            Err(e) => {
                warn!("list directories failed, {e}");
                Self {
                    directories: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// 目录路径补全
///
/// - 空路径返回文件系统根目录
/// - 以分隔符结尾时列出子目录
/// - 否则列出父目录中名称以输入前缀开头的子目录
pub fn list_directories(path: &str, limit: usize) -> DirectoryListing {
    if path.is_empty() {
        return DirectoryListing {
            directories: filesystem_roots(),
            error: None,
        };
    }

    let path = expand_home(path);

    if path.ends_with(is_separator) {
        if !Path::new(&path).is_dir() {
            return DirectoryListing::default();
        }
        return DirectoryListing::from_result(subdirectories(Path::new(&path), ""), limit);
    }

    let Some(idx) = path.rfind(is_separator) else {
        return DirectoryListing::default();
    };
    let parent = match &path[..idx] {
        "" => MAIN_SEPARATOR.to_string(),
        v if cfg!(windows) && v.ends_with(':') => format!("{v}{MAIN_SEPARATOR}"),
        v => v.to_string(),
    };
    let prefix = path[idx + 1..].to_lowercase();

    if !Path::new(&parent).is_dir() {
        return DirectoryListing::default();
    }
    DirectoryListing::from_result(subdirectories(Path::new(&parent), &prefix), limit)
}

/// 名称以 prefix 开头的子目录 (大小写不敏感)
fn subdirectories(dir: &Path, prefix: &str) -> io::Result<Vec<String>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().to_lowercase();
        let path = entry.path();
        if path.is_dir() && name.starts_with(prefix) {
            dirs.push(path.to_string_lossy().to_string());
        }
    }
    Ok(dirs)
}

/// 展开 `~` 为用户目录
pub fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(is_separator) => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.to_string_lossy()),
        None => path.to_string(),
    }
}

/// 文件系统根目录
fn filesystem_roots() -> Vec<String> {
    if cfg!(windows) {
        ('A'..='Z')
            .map(|d| format!("{d}:\\"))
            .filter(|v| Path::new(v).exists())
            .collect()
    } else {
        vec!["/".to_string()]
    }
}
