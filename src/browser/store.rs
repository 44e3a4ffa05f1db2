//! 选择记录与浏览器配置
//!
//! 两个 JSON 文件共用一个进程级读写锁, 写入先写临时文件再重命名

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock, RwLock},
    time::UNIX_EPOCH,
};

use log::{error, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, ser::PrettyFormatter, Map, Value};

use crate::{core::settings::Settings, error::Error};

// 全局存储锁
static STORE_LOCK: OnceLock<Arc<RwLock<()>>> = OnceLock::new();

fn store_lock() -> Arc<RwLock<()>> {
    STORE_LOCK
        .get_or_init(|| Arc::new(RwLock::new(())))
        .clone()
}

/// 节点 id -> 媒体类型 -> `{"path": ...}`
///
/// 按原样读写, 形状不符的条目保留在文件中
pub type Selections = Map<String, Value>;

/// 浏览器配置, 已知字段为 `saved_paths` 与 `last_path`
pub type BrowserConfig = Map<String, Value>;

const KEY_SAVED_PATHS: &str = "saved_paths";
const KEY_LAST_PATH: &str = "last_path";

/// 节点选择记录
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 使用全局配置中的路径
    pub fn global() -> Self {
        Self::new(Settings::global().selections_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部选择记录, 文件不存在或损坏时返回空记录
    pub fn load(&self) -> Result<Selections, Error> {
        let lock = store_lock();
        let _guard = lock.read().map_err(|e| Error::LockError(e.to_string()))?;
        Ok(read_json(&self.path))
    }

    /// 记录节点选择, 其他节点的记录不变
    pub fn set(&self, node_id: &str, media_type: &str, path: &str) -> Result<(), Error> {
        let lock = store_lock();
        let _guard = lock.write().map_err(|e| Error::LockError(e.to_string()))?;

        let mut selections: Selections = read_json(&self.path);
        let node = selections
            .entry(node_id.to_string())
            .or_insert_with(|| json!({}));
        if !node.is_object() {
            *node = json!({});
        }
        if let Some(node) = node.as_object_mut() {
            node.insert(media_type.to_string(), json!({ "path": path }));
        }
        write_json(&self.path, &selections)
    }

    /// 节点选择的路径
    pub fn selected_path(&self, node_id: &str, media_type: &str) -> Result<Option<String>, Error> {
        let selections = self.load()?;
        Ok(selections
            .get(node_id)
            .and_then(|v| v.get(media_type))
            .and_then(|v| v.get("path"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string()))
    }

    /// 选择记录文件的修改时间, 文件不存在时返回 None
    pub fn modified_time(&self) -> Option<f64> {
        let metadata = fs::metadata(&self.path).ok()?;
        let mtime = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
        Some(mtime.as_secs_f64())
    }
}

/// 浏览器配置存储
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取配置, 文件不存在或损坏时返回空配置
    pub fn load(&self) -> Result<BrowserConfig, Error> {
        let lock = store_lock();
        let _guard = lock.read().map_err(|e| Error::LockError(e.to_string()))?;
        Ok(read_json(&self.path))
    }

    /// 修改配置并保存
    pub fn update<F>(&self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut BrowserConfig),
    {
        let lock = store_lock();
        let _guard = lock.write().map_err(|e| Error::LockError(e.to_string()))?;

        let mut config: BrowserConfig = read_json(&self.path);
        f(&mut config);
        write_json(&self.path, &config)
    }

    /// 保存的路径, 跳过非字符串条目
    pub fn saved_paths(&self) -> Result<Vec<String>, Error> {
        let config = self.load()?;
        Ok(config
            .get(KEY_SAVED_PATHS)
            .and_then(Value::as_array)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|v| v.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn set_saved_paths(&self, paths: Vec<String>) -> Result<(), Error> {
        self.update(|config| {
            config.insert(KEY_SAVED_PATHS.to_string(), json!(paths));
        })
    }

    pub fn last_path(&self) -> Result<String, Error> {
        let config = self.load()?;
        Ok(config
            .get(KEY_LAST_PATH)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    pub fn set_last_path(&self, path: &str) -> Result<(), Error> {
        self.update(|config| {
            config.insert(KEY_LAST_PATH.to_string(), json!(path));
        })
    }
}

/// 读取 JSON 文件, 失败时返回默认值
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(v) => v,
        Err(_) => return T::default(),
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("ignore corrupt json file {}, {e}", path.display());
            T::default()
        }
    }
}

/// 以 4 空格缩进写入 JSON 文件
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    let tmp_path = path.with_extension("json.tmp");
    let result = fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(&buf)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp_path, path));

    if let Err(e) = result {
        error!("write {} failed, {e}", path.display());
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_roundtrip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SelectionStore::new(dir.path().join("nested").join("selections.json"));

        assert!(store.load()?.is_empty());
        assert!(store.modified_time().is_none());

        store.set("7", "image", "/tmp/a.png")?;
        store.set("7", "video", "/tmp/b.mp4")?;
        store.set("8", "image", "/tmp/ü.png")?;

        assert_eq!(store.selected_path("7", "image")?.as_deref(), Some("/tmp/a.png"));
        assert_eq!(store.selected_path("8", "image")?.as_deref(), Some("/tmp/ü.png"));
        assert_eq!(store.selected_path("9", "image")?, None);
        assert!(store.modified_time().is_some());

        let content = fs::read_to_string(store.path())?;
        assert!(content.contains("\n    \"7\": {"));
        assert!(content.contains("ü"));
        Ok(())
    }

    #[test]
    fn test_corrupt_selection_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("selections.json");
        fs::write(&path, "{not json")?;

        let store = SelectionStore::new(&path);
        assert!(store.load()?.is_empty());

        store.set("1", "image", "/x.png")?;
        assert_eq!(store.selected_path("1", "image")?.as_deref(), Some("/x.png"));
        Ok(())
    }

    #[test]
    fn test_config_preserves_unknown_keys() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"theme": "dark", "last_path": "/old"}"#)?;

        let store = ConfigStore::new(&path);
        assert_eq!(store.last_path()?, "/old");
        assert!(store.saved_paths()?.is_empty());

        store.set_saved_paths(vec!["/a".to_string(), "/b".to_string()])?;
        store.set_last_path("/new")?;

        let config = store.load()?;
        assert_eq!(config.get("saved_paths"), Some(&json!(["/a", "/b"])));
        assert_eq!(config.get("last_path"), Some(&json!("/new")));
        assert_eq!(config.get("theme"), Some(&json!("dark")));
        Ok(())
    }

    #[test]
    fn test_set_keeps_unexpected_entries() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("selections.json");
        fs::write(
            &path,
            r#"{"1": {"image": {"path": "/a.png", "rating": 5}}, "2": {"image": {}}, "4": "stale"}"#,
        )?;

        let store = SelectionStore::new(&path);
        assert_eq!(store.selected_path("1", "image")?.as_deref(), Some("/a.png"));
        assert_eq!(store.selected_path("2", "image")?, None);

        store.set("3", "image", "/c.png")?;
        store.set("4", "image", "/d.png")?;

        let selections = store.load()?;
        assert_eq!(selections["1"], json!({"image": {"path": "/a.png", "rating": 5}}));
        assert_eq!(selections["2"], json!({"image": {}}));
        assert_eq!(store.selected_path("3", "image")?.as_deref(), Some("/c.png"));
        assert_eq!(store.selected_path("4", "image")?.as_deref(), Some("/d.png"));
        Ok(())
    }

    #[test]
    fn test_config_skips_invalid_saved_paths() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"saved_paths": ["/a", 3, null, "/b"], "last_path": 7}"#)?;

        let store = ConfigStore::new(&path);
        assert_eq!(store.saved_paths()?, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(store.last_path()?, "");

        store.set_last_path("/c")?;
        let config = store.load()?;
        assert_eq!(config.get("saved_paths"), Some(&json!(["/a", 3, null, "/b"])));
        assert_eq!(config.get("last_path"), Some(&json!("/c")));
        Ok(())
    }
}
