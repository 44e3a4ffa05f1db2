//! 本地媒体浏览器 HTTP 接口
//!
//! 接口处理函数为纯 Rust 实现, 由 python 端的 aiohttp 路由通过 `dispatch` 调用

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use log::{error, info, warn};
use pyo3::{
    exceptions::PyRuntimeError,
    ffi::c_str,
    pyfunction,
    types::{PyAnyMethods, PyBytes, PyDict, PyDictMethods, PyModule},
    wrap_pyfunction, Bound, PyErr, PyResult, Python,
};
use serde::Deserialize;
use serde_json::{json, Value};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    browser::{
        media::MediaFilter,
        scanner::{
            list_directories, paginate, scan_directory, search_files, SortBy, SortOrder,
        },
        store::{ConfigStore, SelectionStore},
        thumbnail::render_thumbnail,
    },
    core::settings::Settings,
    error::Error,
};

/// 路由前缀
pub const ROUTE_PREFIX: &str = "/kiko_local_image_loader";

/// 接口路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Route {
    SetNodeSelection,
    GetSavedPaths,
    SavePaths,
    Images,
    GetLastPath,
    ListDirectories,
    Search,
    Thumbnail,
    View,
}

impl Route {
    pub fn method(&self) -> &'static str {
        match self {
            Route::SetNodeSelection | Route::SavePaths => "POST",
            _ => "GET",
        }
    }

    pub fn path(&self) -> String {
        format!("{ROUTE_PREFIX}/{self}")
    }
}

/// 接口响应
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json { status: u16, body: Value },
    Bytes { content_type: &'static str, data: Vec<u8> },
    File(PathBuf),
    Empty(u16),
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        ApiResponse::Json { status: 200, body }
    }

    fn json(status: u16, body: Value) -> Self {
        ApiResponse::Json { status, body }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiResponse::Json { status, .. } => *status,
            ApiResponse::Bytes { .. } | ApiResponse::File(_) => 200,
            ApiResponse::Empty(status) => *status,
        }
    }
}

/// 接口请求
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub query: HashMap<String, String>,
    pub body: Option<String>,
}

impl ApiRequest {
    fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|v| v.as_str())
    }

    /// "true" (大小写不敏感) 为真
    fn flag(&self, key: &str, default: bool) -> bool {
        self.query(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn number<T: FromStr>(&self, key: &str, default: T) -> Result<T, Error> {
        match self.query(key) {
            None => Ok(default),
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| Error::InvalidParameter(format!("{key}: {v}"))),
        }
    }

    fn filter(&self) -> MediaFilter {
        MediaFilter {
            show_videos: self.flag("show_videos", false),
            show_audio: self.flag("show_audio", false),
            hide_dot_folders: self.flag("hide_dot_folders", true),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SelectionBody {
    node_id: Option<Value>,
    path: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SavePathsBody {
    #[serde(default)]
    paths: Vec<String>,
}

/// 接口处理
#[derive(Debug, Clone)]
pub struct LocalImageApi {
    selections: SelectionStore,
    config: ConfigStore,
    settings: Settings,
}

impl LocalImageApi {
    pub fn new(settings: Settings) -> Self {
        Self {
            selections: SelectionStore::new(settings.selections_path()),
            config: ConfigStore::new(settings.config_path()),
            settings,
        }
    }

    /// 使用全局配置
    pub fn global() -> Self {
        Self::new(Settings::global().clone())
    }

    pub fn handle(&self, route: Route, request: &ApiRequest) -> ApiResponse {
        match route {
            Route::SetNodeSelection => self.set_node_selection(request),
            Route::GetSavedPaths => self.get_saved_paths(),
            Route::SavePaths => self.save_paths(request),
            Route::Images => self.images(request),
            Route::GetLastPath => self.get_last_path(),
            Route::ListDirectories => self.list_directories(request),
            Route::Search => self.search(request),
            Route::Thumbnail => self.thumbnail(request),
            Route::View => self.view(request),
        }
    }

    fn set_node_selection(&self, request: &ApiRequest) -> ApiResponse {
        let body: SelectionBody = match serde_json::from_str(request.body.as_deref().unwrap_or("")) {
            Ok(v) => v,
            Err(e) => return status_error(500, &e.to_string()),
        };

        let node_id = match body.node_id {
            Some(Value::String(v)) => v,
            Some(Value::Null) | None => String::new(),
            Some(v) => v.to_string(),
        };
        let path = body.path.unwrap_or_default();
        let media_type = body.media_type.unwrap_or_default();
        if node_id.is_empty() || path.is_empty() || media_type.is_empty() {
            return status_error(400, "Missing required data.");
        }

        match self.selections.set(&node_id, &media_type, &path) {
            Ok(_) => ApiResponse::ok(json!({"status": "ok"})),
            Err(e) => {
                error!("save selection failed, {e}");
                status_error(500, &e.to_string())
            }
        }
    }

    fn get_saved_paths(&self) -> ApiResponse {
        let saved_paths = self.config.saved_paths().unwrap_or_else(|e| {
            error!("load config failed, {e}");
            Vec::new()
        });
        ApiResponse::ok(json!({"saved_paths": saved_paths}))
    }

    fn save_paths(&self, request: &ApiRequest) -> ApiResponse {
        let body: SavePathsBody = match serde_json::from_str(request.body.as_deref().unwrap_or("")) {
            Ok(v) => v,
            Err(e) => return status_error(500, &e.to_string()),
        };
        match self.config.set_saved_paths(body.paths) {
            Ok(_) => ApiResponse::ok(json!({"status": "ok"})),
            Err(e) => {
                error!("save paths failed, {e}");
                status_error(500, &e.to_string())
            }
        }
    }

    fn images(&self, request: &ApiRequest) -> ApiResponse {
        let directory = request.query("directory").unwrap_or("");
        if directory.is_empty() || !Path::new(directory).is_dir() {
            return ApiResponse::json(404, json!({"error": "Directory not found."}));
        }
        let directory = normalize_path(directory);

        if let Err(e) = self.config.set_last_path(&directory) {
            error!("save last path failed, {e}");
        }

        let (page, per_page) = match (
            request.number::<usize>("page", 1),
            request.number::<usize>("per_page", self.settings.page_size),
        ) {
            (Ok(page), Ok(per_page)) => (page, per_page),
            (Err(e), _) | (_, Err(e)) => return ApiResponse::json(400, json!({"error": e.to_string()})),
        };
        let sort_by = SortBy::parse(request.query("sort_by").unwrap_or_default());
        let sort_order = SortOrder::parse(request.query("sort_order").unwrap_or_default());

        let result = scan_directory(Path::new(&directory), &request.filter(), sort_by, sort_order)
            .and_then(|items| paginate(items, page, per_page));
        let page = match result {
            Ok(v) => v,
            Err(e @ Error::InvalidParameter(_)) => {
                return ApiResponse::json(400, json!({"error": e.to_string()}))
            }
            Err(e) => {
                error!("scan {directory} failed, {e}");
                return ApiResponse::json(500, json!({"error": e.to_string()}));
            }
        };

        let parent_directory = Path::new(&directory)
            .parent()
            .map(|v| v.to_string_lossy().to_string());

        ApiResponse::ok(json!({
            "items": page.items,
            "total_pages": page.total_pages,
            "current_page": page.current_page,
            "current_directory": directory,
            "parent_directory": parent_directory,
        }))
    }

    fn get_last_path(&self) -> ApiResponse {
        let last_path = self.config.last_path().unwrap_or_else(|e| {
            error!("load config failed, {e}");
            String::new()
        });
        ApiResponse::ok(json!({"last_path": last_path}))
    }

    fn list_directories(&self, request: &ApiRequest) -> ApiResponse {
        let listing = list_directories(
            request.query("path").unwrap_or(""),
            self.settings.max_directory_suggestions,
        );
        match serde_json::to_value(listing) {
            Ok(v) => ApiResponse::ok(v),
            Err(e) => ApiResponse::ok(json!({"directories": [], "error": e.to_string()})),
        }
    }

    fn search(&self, request: &ApiRequest) -> ApiResponse {
        let directory = request.query("directory").unwrap_or("");
        if directory.is_empty() || !Path::new(directory).is_dir() {
            return ApiResponse::json(404, json!({"error": "Directory not found."}));
        }
        let max_results =
            match request.number::<usize>("max_results", self.settings.max_search_results) {
                Ok(v) => v,
                Err(e) => return ApiResponse::json(400, json!({"error": e.to_string()})),
            };

        let query = request.query("query").unwrap_or("");
        match search_files(Path::new(directory), query, &request.filter(), max_results) {
            Ok(items) => ApiResponse::ok(json!({"count": items.len(), "items": items})),
            Err(e) => {
                error!("search {directory} failed, {e}");
                ApiResponse::json(500, json!({"error": e.to_string()}))
            }
        }
    }

    fn thumbnail(&self, request: &ApiRequest) -> ApiResponse {
        let path = match requested_file(request) {
            Ok(v) => v,
            Err(status) => return ApiResponse::Empty(status),
        };
        match render_thumbnail(&path, self.settings.thumbnail_size, self.settings.jpeg_quality) {
            Ok(thumb) => ApiResponse::Bytes {
                content_type: thumb.content_type,
                data: thumb.data,
            },
            Err(e) => {
                error!("generate thumbnail for {} failed, {e}", path.display());
                ApiResponse::Empty(500)
            }
        }
    }

    fn view(&self, request: &ApiRequest) -> ApiResponse {
        match requested_file(request) {
            Ok(path) => ApiResponse::File(path),
            Err(status) => ApiResponse::Empty(status),
        }
    }
}

/// 校验 filepath 参数
///
/// 缺失或包含 `..` 返回 400, 文件不存在返回 404
fn requested_file(request: &ApiRequest) -> Result<PathBuf, u16> {
    let raw = match request.query("filepath") {
        Some(v) if !v.is_empty() && !v.contains("..") => v,
        _ => return Err(400),
    };
    let decoded = urlencoding::decode(raw).map_err(|_| 400u16)?;
    let path = PathBuf::from(decoded.as_ref());
    if !path.exists() {
        return Err(404);
    }
    Ok(path)
}

fn status_error(status: u16, message: &str) -> ApiResponse {
    ApiResponse::json(status, json!({"status": "error", "message": message}))
}

/// 规范化路径: 去除多余分隔符、`.` 以及可折叠的 `..`
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<Component> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return ".".to_string();
    }
    parts
        .iter()
        .collect::<PathBuf>()
        .to_string_lossy()
        .to_string()
}

/// python 路由调用入口
///
/// 返回 (状态码, 响应类型, content type, 数据)
#[pyfunction]
#[pyo3(signature = (route, query, body=None))]
pub fn dispatch<'py>(
    py: Python<'py>,
    route: &str,
    query: HashMap<String, String>,
    body: Option<String>,
) -> PyResult<(u16, &'static str, Option<&'static str>, Bound<'py, PyBytes>)> {
    let Ok(route) = Route::from_str(route) else {
        warn!("unknown route: {route}");
        return Ok((404, "empty", None, PyBytes::new(py, &[])));
    };

    let request = ApiRequest { query, body };
    let response = py.allow_threads(|| LocalImageApi::global().handle(route, &request));

    let status = response.status();
    let (kind, content_type, data) = match response {
        ApiResponse::Json { body, .. } => (
            "json",
            Some("application/json"),
            serde_json::to_vec(&body)
                .map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?,
        ),
        ApiResponse::Bytes { content_type, data } => ("bytes", Some(content_type), data),
        ApiResponse::File(path) => ("file", None, path.to_string_lossy().as_bytes().to_vec()),
        ApiResponse::Empty(_) => ("empty", None, Vec::new()),
    };
    Ok((status, kind, content_type, PyBytes::new(py, &data)))
}

/// 在 ComfyUI PromptServer 上注册接口
///
/// 宿主服务不可用时跳过, 返回是否注册成功
pub fn register_routes(py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<bool> {
    let routes: Vec<(String, &'static str, String)> = Route::iter()
        .map(|v| (v.to_string(), v.method(), v.path()))
        .collect();

    let globals = PyDict::new(py);
    globals.set_item("dispatch", wrap_pyfunction!(dispatch, module)?)?;
    globals.set_item("routes", routes)?;

    let code = c_str!(
        r#"
import asyncio

try:
    import server
    from aiohttp import web
    prompt_server = server.PromptServer.instance
except (ImportError, AttributeError):
    prompt_server = None


def make_handler(route, method):
    async def handler(request):
        query = dict(request.query)
        body = await request.text() if method == "POST" else None
        loop = asyncio.get_running_loop()
        status, kind, content_type, payload = await loop.run_in_executor(
            None, dispatch, route, query, body
        )
        if kind == "file":
            return web.FileResponse(payload.decode("utf-8"))
        if kind == "empty":
            return web.Response(status=status)
        return web.Response(body=payload, status=status, content_type=content_type)

    return handler


registered = False
if prompt_server is not None:
    for route, method, path in routes:
        prompt_server.routes.route(method, path)(make_handler(route, method))
    registered = True
"#
    );

    py.run(code, Some(&globals), None)?;
    let registered = globals
        .get_item("registered")?
        .map(|v| v.extract::<bool>())
        .transpose()?
        .unwrap_or(false);

    if registered {
        info!("registered {} local image loader routes", Route::iter().count());
    } else {
        info!("PromptServer not available, skip route registration");
    }
    Ok(registered)
}
