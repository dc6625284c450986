// HTTP seam: every network call made by the clients goes through `Transport`.
// `HttpTransport` is the real blocking implementation; tests plug in a
// scripted one so the pipeline can run without network access.

use crate::error::{PublishError, PublishResult};
use reqwest::blocking::{multipart, Client, Response};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Longest slice of an error body kept in a transport error message.
const BODY_SNIPPET_LEN: usize = 200;

pub trait Transport {
    /// GET `url` with query parameters and return the response body.
    fn get_bytes(&self, url: &str, query: &[(&str, String)]) -> PublishResult<Vec<u8>>;

    /// GET `url` and stream the body into `sink`. Returns the number of bytes written.
    fn download(&self, url: &str, sink: &mut dyn Write) -> PublishResult<u64>;

    /// POST `form` as `application/x-www-form-urlencoded` and return the body.
    fn post_form(&self, url: &str, form: &[(&str, String)]) -> PublishResult<Vec<u8>>;

    /// POST the file at `path` as a multipart part named `field`.
    fn upload_file(&self, url: &str, field: &str, path: &Path) -> PublishResult<Vec<u8>>;
}

/// Blocking reqwest client with a bounded timeout on every request.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> PublishResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpTransport { client })
    }

    /// Turns a non-2xx response into a transport error carrying a body snippet.
    fn check_status(url: &str, res: Response) -> PublishResult<Response> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let txt = res.text().unwrap_or_default();
        let snippet: String = txt.chars().take(BODY_SNIPPET_LEN).collect();
        Err(PublishError::transport(
            url,
            format!("HTTP {} - {}", status, snippet.trim()),
        ))
    }

    fn read_body(url: &str, res: Response) -> PublishResult<Vec<u8>> {
        let res = Self::check_status(url, res)?;
        let body = res.bytes().map_err(|e| PublishError::transport(url, e))?;
        log::debug!("{} -> {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

impl Transport for HttpTransport {
    fn get_bytes(&self, url: &str, query: &[(&str, String)]) -> PublishResult<Vec<u8>> {
        log::debug!("GET {}", url);
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| PublishError::transport(url, e))?;
        Self::read_body(url, res)
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> PublishResult<u64> {
        log::debug!("GET {} (download)", url);
        let res = self
            .client
            .get(url)
            .send()
            .map_err(|e| PublishError::transport(url, e))?;
        let mut res = Self::check_status(url, res)?;
        let written = res
            .copy_to(sink)
            .map_err(|e| PublishError::transport(url, e))?;
        log::debug!("{} -> {} bytes", url, written);
        Ok(written)
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> PublishResult<Vec<u8>> {
        log::debug!("POST {}", url);
        let res = self
            .client
            .post(url)
            .form(form)
            .send()
            .map_err(|e| PublishError::transport(url, e))?;
        Self::read_body(url, res)
    }

    fn upload_file(&self, url: &str, field: &str, path: &Path) -> PublishResult<Vec<u8>> {
        log::debug!("POST {} (multipart, {})", url, path.display());
        let file = File::open(path)?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image.png")
            .to_string();

        let part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str(guess_mime(path))
            .map_err(|e| PublishError::transport(url, e))?;
        let form = multipart::Form::new().part(field.to_string(), part);

        let res = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .map_err(|e| PublishError::transport(url, e))?;
        Self::read_body(url, res)
    }
}

/// MIME type for the upload part, from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
