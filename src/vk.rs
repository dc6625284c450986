// VK platform client: the four calls needed to put a photo on a community wall.
//
// VK answers application errors with HTTP 200 and an `error` object in the
// body, so every reply is decoded into `ApiReply<T>` first and only then
// unwrapped into a `PublishResult`.

use crate::error::{PublishError, PublishResult};
use crate::stager::StagedFile;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Multipart field name the upload server expects.
const PHOTO_FIELD: &str = "photo";

/// Application-level error reported inside a successful HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VkApiError {
    pub code: i64,
    pub message: String,
}

/// Decoded VK reply: either the payload or the embedded error.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiReply<T> {
    Success(T),
    Failure(VkApiError),
}

impl<T: DeserializeOwned> ApiReply<T> {
    /// Decode `body`. The `error` key wins over any payload that may be present.
    pub fn decode(body: &[u8], context: &str) -> PublishResult<Self> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| PublishError::parse(context, e))?;

        match value.get("error") {
            None | Some(Value::Null) => {}
            Some(Value::Object(obj)) => {
                let code = obj.get("error_code").and_then(Value::as_i64).unwrap_or(0);
                let message = obj
                    .get("error_msg")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                return Ok(ApiReply::Failure(VkApiError { code, message }));
            }
            Some(Value::String(message)) => {
                return Ok(ApiReply::Failure(VkApiError {
                    code: 0,
                    message: message.clone(),
                }));
            }
            Some(other) => {
                return Ok(ApiReply::Failure(VkApiError {
                    code: 0,
                    message: other.to_string(),
                }));
            }
        }

        serde_json::from_value(value)
            .map(ApiReply::Success)
            .map_err(|e| PublishError::parse(context, e))
    }
}

impl<T> ApiReply<T> {
    pub fn into_result(self) -> PublishResult<T> {
        match self {
            ApiReply::Success(payload) => Ok(payload),
            ApiReply::Failure(err) => Err(PublishError::PlatformApi {
                code: err.code,
                message: err.message,
            }),
        }
    }
}

/// Envelope of `api.vk.com/method/*` replies.
#[derive(Debug, Deserialize)]
struct MethodResponse<T> {
    response: T,
}

/// Short-lived destination for a single photo upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadTicket {
    pub upload_url: String,
}

/// What the upload server hands back; only good for `register`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedAsset {
    pub photo: String,
    pub server: Value,
    pub hash: String,
}

/// Durable reference to a saved wall photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegisteredMedia {
    #[serde(rename = "id")]
    pub media_id: i64,
    pub owner_id: i64,
}

impl RegisteredMedia {
    /// Attachment reference in VK's `photo{owner_id}_{media_id}` form.
    pub fn attachment(&self) -> String {
        format!("photo{}_{}", self.owner_id, self.media_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PostCreated {
    pub post_id: i64,
}

pub struct VkClient<'a, T: Transport> {
    transport: &'a T,
    api_url: String,
    token: String,
    version: String,
}

impl<'a, T: Transport> VkClient<'a, T> {
    pub fn new(transport: &'a T, api_url: &str, token: &str, version: &str) -> Self {
        VkClient {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            version: version.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_url, method)
    }

    /// Parameters every method call carries.
    fn auth_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("access_token", self.token.clone()),
            ("v", self.version.clone()),
        ]
    }

    fn call<R: DeserializeOwned>(&self, method: &str, body: &[u8]) -> PublishResult<R> {
        let reply: ApiReply<MethodResponse<R>> = ApiReply::decode(body, method)?;
        reply.into_result().map(|r| r.response)
    }

    /// `photos.getWallUploadServer`
    pub fn get_upload_ticket(&self) -> PublishResult<UploadTicket> {
        let method = "photos.getWallUploadServer";
        let body = self
            .transport
            .get_bytes(&self.method_url(method), &self.auth_params())?;
        self.call(method, &body)
    }

    /// Multipart upload of the staged image to the ticket's server.
    pub fn upload(&self, ticket: &UploadTicket, staged: &StagedFile) -> PublishResult<UploadedAsset> {
        let body = self
            .transport
            .upload_file(&ticket.upload_url, PHOTO_FIELD, staged.path())?;
        let asset = ApiReply::<UploadedAsset>::decode(&body, "photo upload")?.into_result()?;
        // The server accepts the request but stores nothing when the image is rejected.
        if asset.photo.is_empty() || asset.photo == "[]" {
            return Err(PublishError::platform(0, "upload server stored no photo"));
        }
        Ok(asset)
    }

    /// `photos.saveWallPhoto`
    pub fn register(&self, asset: &UploadedAsset) -> PublishResult<RegisteredMedia> {
        let method = "photos.saveWallPhoto";
        let mut form = vec![
            ("photo", asset.photo.clone()),
            ("server", server_param(&asset.server)),
            ("hash", asset.hash.clone()),
        ];
        form.extend(self.auth_params());

        let body = self.transport.post_form(&self.method_url(method), &form)?;
        let saved: Vec<RegisteredMedia> = self.call(method, &body)?;
        saved
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::parse(method, "empty photo list"))
    }

    /// `wall.post` on behalf of the community `group_id`.
    pub fn publish_post(
        &self,
        group_id: u64,
        media: &RegisteredMedia,
        title: &str,
    ) -> PublishResult<PostCreated> {
        let method = "wall.post";
        let mut form = vec![
            ("owner_id", format!("-{}", group_id)),
            ("from_group", "1".to_string()),
            ("message", title.to_string()),
            ("attachments", media.attachment()),
        ];
        form.extend(self.auth_params());

        let body = self.transport.post_form(&self.method_url(method), &form)?;
        self.call(method, &body)
    }
}

/// Upload servers report `server` as a number; older ones send a string.
fn server_param(server: &Value) -> String {
    match server {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
