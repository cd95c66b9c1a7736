use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::ComsClient;
use crate::config::ClientConfig;
use crate::error::{BcboxError, Result};
use crate::types::{
    Bucket, BucketCreate, BucketPermission, BucketPermissionSearch, BucketSearch, BucketUpdate,
    CosObject, Metadata, MetadataSearch, ObjectPermission, ObjectPermissionSearch, ObjectSearch,
    Permission, PermissionAssignment, QueryPairs, SearchFilter, Tagging, TaggingSearch, User,
    UserSearch, Version,
};

/// Longest slice of an error body copied into a transport error.
const ERROR_BODY_PREVIEW_CHARS: usize = 256;

/// COMS client over HTTP with a fixed per-call timeout.
///
/// Clones share the bearer token, so a refresh reaches every store holding
/// the client.
#[derive(Debug, Clone)]
pub struct HttpComsClient {
    config: ClientConfig,
    base: Url,
    http: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpComsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base = Url::parse(config.base())
            .map_err(|err| BcboxError::configuration(format!("invalid base_url: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(BcboxError::configuration(format!(
                "base_url {base} cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let token = Arc::new(RwLock::new(config.bearer_token.clone()));
        Ok(Self {
            config,
            base,
            http,
            token,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the bearer token after an OIDC refresh.
    pub fn set_bearer_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| BcboxError::configuration("base_url cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    #[instrument(
        target = "bcbox::client",
        skip_all,
        fields(method = %method, path = url.path(), params = query.len())
    )]
    async fn execute(
        &self,
        method: Method,
        url: Url,
        query: &QueryPairs,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>> {
        let mut request = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.token.read().as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        tracing::debug!(target = "bcbox::client", "sending request");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            tracing::warn!(
                target = "bcbox::client",
                status = status.as_u16(),
                "request failed"
            );
            return Err(BcboxError::Transport {
                message: format!("{method} {} returned {status}: {preview}", url.path()),
                status: Some(status.as_u16()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &QueryPairs,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        let bytes = self.execute(method, url, query, body).await?;
        serde_json::from_slice(&bytes).map_err(|err| BcboxError::Decode {
            reason: format!("/{}: {err}", segments.join("/")),
        })
    }

    async fn send_only(
        &self,
        method: Method,
        segments: &[&str],
        query: &QueryPairs,
    ) -> Result<()> {
        let url = self.endpoint(segments)?;
        self.execute(method, url, query, None).await?;
        Ok(())
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Option<serde_json::Value>> {
    Ok(Some(serde_json::to_value(body)?))
}

fn require_id<'a>(what: &str, id: &'a str) -> Result<&'a str> {
    if id.trim().is_empty() {
        return Err(BcboxError::invalid_input(format!("{what} must not be empty")));
    }
    Ok(id)
}

fn permission_pairs(user_id: &str, code: Permission) -> QueryPairs {
    vec![
        ("userId", user_id.to_string()),
        ("permCode", code.as_str().to_string()),
    ]
}

#[async_trait]
impl ComsClient for HttpComsClient {
    async fn search_buckets(&self, search: &BucketSearch) -> Result<Vec<Bucket>> {
        self.fetch(Method::GET, &["bucket"], &search.query_pairs(), None)
            .await
    }

    async fn create_bucket(&self, body: &BucketCreate) -> Result<Bucket> {
        self.fetch(Method::PUT, &["bucket"], &QueryPairs::new(), to_body(body)?)
            .await
    }

    async fn update_bucket(&self, bucket_id: &str, body: &BucketUpdate) -> Result<Bucket> {
        let bucket_id = require_id("bucket_id", bucket_id)?;
        self.fetch(
            Method::PATCH,
            &["bucket", bucket_id],
            &QueryPairs::new(),
            to_body(body)?,
        )
        .await
    }

    async fn delete_bucket(&self, bucket_id: &str) -> Result<()> {
        let bucket_id = require_id("bucket_id", bucket_id)?;
        self.send_only(Method::DELETE, &["bucket", bucket_id], &QueryPairs::new())
            .await
    }

    async fn search_objects(&self, search: &ObjectSearch) -> Result<Vec<CosObject>> {
        self.fetch(Method::GET, &["object"], &search.query_pairs(), None)
            .await
    }

    async fn delete_object(&self, object_id: &str, version_id: Option<&str>) -> Result<()> {
        let object_id = require_id("object_id", object_id)?;
        let mut query = QueryPairs::new();
        if let Some(version_id) = version_id {
            query.push(("versionId", version_id.to_string()));
        }
        self.send_only(Method::DELETE, &["object", object_id], &query)
            .await
    }

    async fn set_object_public(&self, object_id: &str, public: bool) -> Result<()> {
        let object_id = require_id("object_id", object_id)?;
        let query = vec![("public", public.to_string())];
        self.send_only(Method::PATCH, &["object", object_id, "public"], &query)
            .await
    }

    async fn search_bucket_permissions(
        &self,
        search: &BucketPermissionSearch,
    ) -> Result<Vec<BucketPermission>> {
        self.fetch(
            Method::GET,
            &["permission", "bucket"],
            &search.query_pairs(),
            None,
        )
        .await
    }

    async fn add_bucket_permissions(
        &self,
        bucket_id: &str,
        assignments: &[PermissionAssignment],
    ) -> Result<Vec<BucketPermission>> {
        let bucket_id = require_id("bucket_id", bucket_id)?;
        self.fetch(
            Method::PUT,
            &["permission", "bucket", bucket_id],
            &QueryPairs::new(),
            to_body(&assignments)?,
        )
        .await
    }

    async fn delete_bucket_permission(
        &self,
        bucket_id: &str,
        user_id: &str,
        code: Permission,
    ) -> Result<()> {
        let bucket_id = require_id("bucket_id", bucket_id)?;
        let user_id = require_id("user_id", user_id)?;
        self.send_only(
            Method::DELETE,
            &["permission", "bucket", bucket_id],
            &permission_pairs(user_id, code),
        )
        .await
    }

    async fn search_object_permissions(
        &self,
        search: &ObjectPermissionSearch,
    ) -> Result<Vec<ObjectPermission>> {
        self.fetch(
            Method::GET,
            &["permission", "object"],
            &search.query_pairs(),
            None,
        )
        .await
    }

    async fn add_object_permissions(
        &self,
        object_id: &str,
        assignments: &[PermissionAssignment],
    ) -> Result<Vec<ObjectPermission>> {
        let object_id = require_id("object_id", object_id)?;
        self.fetch(
            Method::PUT,
            &["permission", "object", object_id],
            &QueryPairs::new(),
            to_body(&assignments)?,
        )
        .await
    }

    async fn delete_object_permission(
        &self,
        object_id: &str,
        user_id: &str,
        code: Permission,
    ) -> Result<()> {
        let object_id = require_id("object_id", object_id)?;
        let user_id = require_id("user_id", user_id)?;
        self.send_only(
            Method::DELETE,
            &["permission", "object", object_id],
            &permission_pairs(user_id, code),
        )
        .await
    }

    async fn search_users(&self, search: &UserSearch) -> Result<Vec<User>> {
        self.fetch(Method::GET, &["user"], &search.query_pairs(), None)
            .await
    }

    async fn list_versions(&self, object_id: &str) -> Result<Vec<Version>> {
        let object_id = require_id("object_id", object_id)?;
        self.fetch(
            Method::GET,
            &["object", object_id, "version"],
            &QueryPairs::new(),
            None,
        )
        .await
    }

    async fn search_tagging(&self, search: &TaggingSearch) -> Result<Vec<Tagging>> {
        self.fetch(
            Method::GET,
            &["object", "tagging"],
            &search.query_pairs(),
            None,
        )
        .await
    }

    async fn search_metadata(&self, search: &MetadataSearch) -> Result<Vec<Metadata>> {
        self.fetch(
            Method::GET,
            &["object", "metadata"],
            &search.query_pairs(),
            None,
        )
        .await
    }
}
