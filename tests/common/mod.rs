// Shared test support: a scripted in-memory `Transport` and helpers for
// building configs that stage files inside a temp directory.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use xkcd_vk_publisher::transport::Transport;
use xkcd_vk_publisher::{Config, PublishError, PublishResult};

pub const XKCD: &str = "https://xkcd.test";
pub const VK: &str = "https://api.vk.test/method";
pub const UPLOAD_URL: &str = "https://pu.vk.test/c1/upload.php?act=do_add";
pub const IMAGE_URL: &str = "https://imgs.xkcd.com/comics/woodpecker.png";
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nwoodpecker-bytes";
pub const GROUP_ID: u64 = 999;
pub const TOKEN: &str = "test-token";

/// Canned answer for one URL.
#[derive(Clone)]
pub enum Reply {
    /// HTTP 200 with this body.
    Body(Vec<u8>),
    /// Non-2xx status.
    Status(u16),
    /// Body starts streaming then the connection drops.
    Truncated(Vec<u8>),
}

impl Reply {
    pub fn json(value: &str) -> Self {
        Reply::Body(value.as_bytes().to_vec())
    }
}

/// One request seen by the transport.
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: &'static str,
    pub url: String,
    pub params: Vec<(String, String)>,
    /// Bytes of the multipart file, read at upload time.
    pub uploaded: Option<Vec<u8>>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: RefCell<HashMap<String, Reply>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, reply: Reply) -> &Self {
        self.routes.borrow_mut().insert(url.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.url == url)
            .collect()
    }

    fn record(&self, kind: &'static str, url: &str, params: &[(&str, String)], uploaded: Option<Vec<u8>>) {
        self.calls.borrow_mut().push(Call {
            kind,
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            uploaded,
        });
    }

    fn reply(&self, url: &str) -> PublishResult<Reply> {
        self.routes
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| PublishError::transport(url, "no route scripted"))
    }

    fn body(&self, url: &str) -> PublishResult<Vec<u8>> {
        match self.reply(url)? {
            Reply::Body(body) => Ok(body),
            Reply::Status(code) => Err(PublishError::transport(url, format!("HTTP {}", code))),
            Reply::Truncated(_) => Err(PublishError::transport(url, "connection reset")),
        }
    }
}

impl Transport for ScriptedTransport {
    fn get_bytes(&self, url: &str, query: &[(&str, String)]) -> PublishResult<Vec<u8>> {
        self.record("get", url, query, None);
        self.body(url)
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> PublishResult<u64> {
        self.record("download", url, &[], None);
        match self.reply(url)? {
            Reply::Body(body) => {
                sink.write_all(&body)?;
                Ok(body.len() as u64)
            }
            Reply::Status(code) => Err(PublishError::transport(url, format!("HTTP {}", code))),
            Reply::Truncated(partial) => {
                sink.write_all(&partial)?;
                sink.flush()?;
                Err(PublishError::transport(url, "connection reset"))
            }
        }
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> PublishResult<Vec<u8>> {
        self.record("post", url, form, None);
        self.body(url)
    }

    fn upload_file(&self, url: &str, field: &str, path: &Path) -> PublishResult<Vec<u8>> {
        let bytes = std::fs::read(path)?;
        self.record("upload", url, &[("field", field.to_string())], Some(bytes));
        self.body(url)
    }
}

pub fn comic_url(num: u32) -> String {
    format!("{}/{}/info.0.json", XKCD, num)
}

pub fn catalog_url() -> String {
    format!("{}/info.0.json", XKCD)
}

pub fn method_url(method: &str) -> String {
    format!("{}/{}", VK, method)
}

pub fn vk_error(code: i64, msg: &str) -> Reply {
    Reply::json(&format!(
        r#"{{"error":{{"error_code":{},"error_msg":"{}","request_params":[]}}}}"#,
        code, msg
    ))
}

/// Config pointing at the scripted hosts and staging inside `dir`.
pub fn config_in(dir: &Path) -> Config {
    let staged = dir.join("comic.png").to_string_lossy().into_owned();
    let group = GROUP_ID.to_string();
    let vars: HashMap<&str, String> = [
        ("VK_TOKEN", TOKEN.to_string()),
        ("GROUP_ID", group),
        ("XKCD_BASE_URL", XKCD.to_string()),
        ("VK_API_URL", VK.to_string()),
        ("COMIC_FILENAME", staged),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key: &str| vars.get(key).cloned()).expect("test config")
}

/// Routes for a full successful run publishing comic #614 "Woodpecker".
pub fn woodpecker_script() -> ScriptedTransport {
    let transport = ScriptedTransport::new();
    transport
        .route(&catalog_url(), Reply::json(r#"{"num":2900,"safe_title":"Latest"}"#))
        .route(
            &comic_url(614),
            Reply::json(&format!(
                r#"{{"num":614,"img":"{}","safe_title":"Woodpecker","alt":"If you don't have an extension cord I can get that too."}}"#,
                IMAGE_URL
            )),
        )
        .route(IMAGE_URL, Reply::Body(IMAGE_BYTES.to_vec()))
        .route(
            &method_url("photos.getWallUploadServer"),
            Reply::json(&format!(
                r#"{{"response":{{"upload_url":"{}","album_id":-14,"user_id":1}}}}"#,
                UPLOAD_URL
            )),
        )
        .route(
            UPLOAD_URL,
            Reply::json(r#"{"photo":"p1","server":"1","hash":"h1"}"#),
        )
        .route(
            &method_url("photos.saveWallPhoto"),
            Reply::json(r#"{"response":[{"id":42,"owner_id":-999,"album_id":-14}]}"#),
        )
        .route(
            &method_url("wall.post"),
            Reply::json(r#"{"response":{"post_id":7}}"#),
        );
    transport
}
