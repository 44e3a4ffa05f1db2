//! 运行配置
//!
//! 配置来源于环境变量, 在首次访问时解析一次:
//! - `KIKOTOOLS_DATA_DIR`: selections.json / config.json 所在目录
//! - `KIKOTOOLS_THUMBNAIL_SIZE`: 缩略图最大边长
//! - `KIKOTOOLS_PAGE_SIZE`: 默认分页大小
//! - `KIKOTOOLS_MAX_SEARCH_RESULTS`: 搜索结果上限
//! - `KIKOTOOLS_LOG`: 日志级别

use std::{env, path::PathBuf, str::FromStr};

use lazy_static::lazy_static;
use log::warn;

pub const ENV_DATA_DIR: &str = "KIKOTOOLS_DATA_DIR";
pub const ENV_THUMBNAIL_SIZE: &str = "KIKOTOOLS_THUMBNAIL_SIZE";
pub const ENV_PAGE_SIZE: &str = "KIKOTOOLS_PAGE_SIZE";
pub const ENV_MAX_SEARCH_RESULTS: &str = "KIKOTOOLS_MAX_SEARCH_RESULTS";
pub const ENV_LOG: &str = "KIKOTOOLS_LOG";

/// 选择记录文件名
pub const SELECTIONS_FILE: &str = "selections.json";
/// 浏览器配置文件名
pub const CONFIG_FILE: &str = "config.json";

lazy_static! {
    static ref SETTINGS: Settings = Settings::from_env();
}

/// 全局配置
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// 数据目录
    pub data_dir: PathBuf,
    /// 缩略图最大边长
    pub thumbnail_size: u32,
    /// JPEG 缩略图质量
    pub jpeg_quality: u8,
    /// 默认分页大小
    pub page_size: usize,
    /// 搜索结果上限
    pub max_search_results: usize,
    /// 目录补全结果上限
    pub max_directory_suggestions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            thumbnail_size: 320,
            jpeg_quality: 90,
            page_size: 50,
            max_search_results: 100,
            max_directory_suggestions: 50,
        }
    }
}

impl Settings {
    /// 全局配置
    pub fn global() -> &'static Settings {
        &SETTINGS
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 使用指定的查找函数读取配置, 无效值回退到默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup(ENV_DATA_DIR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        Self {
            data_dir,
            thumbnail_size: parse_or(&lookup, ENV_THUMBNAIL_SIZE, defaults.thumbnail_size),
            page_size: parse_or(&lookup, ENV_PAGE_SIZE, defaults.page_size),
            max_search_results: parse_or(
                &lookup,
                ENV_MAX_SEARCH_RESULTS,
                defaults.max_search_results,
            ),
            ..defaults
        }
    }

    /// 选择记录文件路径
    pub fn selections_path(&self) -> PathBuf {
        self.data_dir.join(SELECTIONS_FILE)
    }

    /// 浏览器配置文件路径
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }
}

/// 默认数据目录: <cwd>/user/kikotools
fn default_data_dir() -> PathBuf {
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("user")
        .join("kikotools")
}

/// 解析正整数配置项, 0 或无法解析时使用默认值
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v != T::default() => v,
        _ => {
            warn!("invalid value for {key}: {raw:?}, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.thumbnail_size, 320);
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.max_search_results, 100);
        assert!(settings.data_dir.ends_with("user/kikotools"));
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_DATA_DIR, "/tmp/kiko"),
            (ENV_THUMBNAIL_SIZE, "256"),
            (ENV_PAGE_SIZE, "20"),
        ]));
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/kiko"));
        assert_eq!(settings.thumbnail_size, 256);
        assert_eq!(settings.page_size, 20);
        assert_eq!(
            settings.selections_path(),
            PathBuf::from("/tmp/kiko/selections.json")
        );
        assert_eq!(settings.config_path(), PathBuf::from("/tmp/kiko/config.json"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_THUMBNAIL_SIZE, "big"),
            (ENV_PAGE_SIZE, "0"),
            (ENV_DATA_DIR, "   "),
        ]));
        assert_eq!(settings.thumbnail_size, 320);
        assert_eq!(settings.page_size, 50);
        assert!(settings.data_dir.ends_with("user/kikotools"));
    }
}
