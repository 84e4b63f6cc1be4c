//! `reqwest` implementation of [`UploadBackend`], plus the few non-upload
//! calls the CLI needs.

use std::time::Duration;

use bytes::Bytes;
use docket_shared::auth::{LoginRequest, LoginResponse};
use docket_shared::target::{Target, TargetStatus};
use docket_shared::upload::{
    ConfirmRequest, DeleteFileRequest, DeleteFileResponse, FileDescriptor, PresignRequest,
    PresignResponse, PresignedGrant, UploadMeta, UploadResponse, UploadedFile,
};
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::backend::{ProgressFn, UploadBackend};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::file::LocalFile;

/// Size of each body chunk on a direct PUT; progress is reported per chunk.
const PUT_CHUNK_BYTES: usize = 64 * 1024;

/// HTTP client for a Docket server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpBackend {
    /// Creates a client for `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::network("build client", &e))?;
        Ok(Self { client, config })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ClientError::network(operation, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::network(operation, &e))?;

        if !status.is_success() {
            return Err(ClientError::from_api_response(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Api {
            status: status.as_u16(),
            code: "invalid_response".to_string(),
            message: format!("{operation}: {e}"),
        })
    }

    /// `POST /auth/login`. The returned token is not stored; build a new
    /// client with [`ClientConfig::with_token`].
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = self
            .client
            .post(self.config.api_url("/auth/login"))
            .json(&body);
        self.send_json(request, "login").await
    }

    /// `GET /targets`
    pub async fn list_targets(
        &self,
        status: Option<TargetStatus>,
    ) -> Result<Vec<Target>, ClientError> {
        let mut request = self.client.get(self.config.api_url("/targets"));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        self.send_json(request, "list targets").await
    }

    /// `GET /targets/{id}`
    pub async fn get_target(&self, target_id: Uuid) -> Result<Target, ClientError> {
        let request = self
            .client
            .get(self.config.api_url(&format!("/targets/{target_id}")));
        self.send_json(request, "get target").await
    }
}

impl UploadBackend for HttpBackend {
    async fn presign(
        &self,
        target_id: Uuid,
        files: &[FileDescriptor],
    ) -> Result<Vec<PresignedGrant>, ClientError> {
        let body = PresignRequest {
            files: files.to_vec(),
        };
        let request = self
            .client
            .post(
                self.config
                    .api_url(&format!("/targets/{target_id}/upload/presigned")),
            )
            .json(&body);
        let response: PresignResponse = self
            .send_json(request, "presign")
            .await
            .map_err(ClientError::for_presign)?;
        Ok(response.presigned_urls)
    }

    async fn put_object(
        &self,
        grant: &PresignedGrant,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> Result<(), ClientError> {
        let total = data.len();
        let chunks: Vec<Bytes> = (0..total)
            .step_by(PUT_CHUNK_BYTES)
            .map(|start| data.slice(start..(start + PUT_CHUNK_BYTES).min(total)))
            .collect();

        let mut sent: u64 = 0;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(sent);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        // Presigned URLs carry their own auth; no bearer token here.
        let response = self
            .client
            .put(&grant.presigned_url)
            .header(CONTENT_TYPE, &grant.file_type)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::UploadTimeout {
                        file_name: grant.file_name.clone(),
                    }
                } else {
                    ClientError::network("put object", &e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StorageRejected {
                file_name: grant.file_name.clone(),
                status: status.as_u16(),
            });
        }

        debug!(key = %grant.key, bytes = total, "Object stored");
        Ok(())
    }

    async fn confirm(
        &self,
        target_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<UploadResponse, ClientError> {
        let body = ConfirmRequest {
            uploaded_files: files,
        };
        let request = self
            .client
            .post(
                self.config
                    .api_url(&format!("/targets/{target_id}/upload/confirm")),
            )
            .json(&body);
        self.send_json(request, "confirm").await
    }

    async fn server_upload(
        &self,
        target_id: Uuid,
        files: Vec<LocalFile>,
    ) -> Result<UploadResponse, ClientError> {
        let meta = UploadMeta {
            files: files.iter().map(LocalFile::descriptor).collect(),
        };
        let meta = serde_json::to_string(&meta).map_err(|e| ClientError::Api {
            status: 0,
            code: "invalid_request".to_string(),
            message: e.to_string(),
        })?;

        let mut form = Form::new().text("meta", meta);
        for file in files {
            let size = file.size();
            let part = Part::stream_with_length(Body::from(file.data.clone()), size)
                .file_name(file.file_name.clone());
            let part = match part.mime_str(&file.file_type) {
                Ok(part) => part,
                Err(_) => Part::stream_with_length(Body::from(file.data), size)
                    .file_name(file.file_name)
                    .mime_str("application/octet-stream")
                    .map_err(|e| ClientError::network("build multipart", &e))?,
            };
            form = form.part("files", part);
        }

        let request = self
            .client
            .post(self.config.api_url(&format!("/targets/{target_id}/upload")))
            .multipart(form);
        self.send_json(request, "server upload").await
    }

    async fn remove(
        &self,
        target_id: Uuid,
        file_url: &str,
    ) -> Result<DeleteFileResponse, ClientError> {
        let body = DeleteFileRequest {
            file_url: file_url.to_string(),
        };
        let request = self
            .client
            .delete(self.config.api_url(&format!("/targets/{target_id}/upload")))
            .json(&body);
        self.send_json(request, "remove file").await
    }
}
