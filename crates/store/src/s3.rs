use crate::{ObjectStore, S3Settings, StoreError};
use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;


pub async fn create_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let region = RegionProviderChain::default_provider().or_else("us-east-1");

    let mut config_loader = aws_config::from_env().region(region);

    let endpoint = settings.endpoint.clone()
        .or_else(|| std::env::var("AWS_S3_ENDPOINT").ok());

    if let Some(endpoint) = endpoint {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key) {
        config_loader = config_loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "static"
        ));
    }

    let config = config_loader.load().await;

    // MinIO serves buckets under the path, not as virtual hosts
    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}


pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    root: String
}


impl S3Store {
    pub fn new(
        s3_client: aws_sdk_s3::Client,
        bucket: String,
        root: String
    ) -> Self {
        Self {
            client: s3_client,
            bucket,
            root
        }
    }

    fn resolve(&self, path: &str) -> String {
        let mut segments: Vec<_> = if self.root.is_empty() {
            vec![]
        } else {
            self.root.split('/').collect()
        };

        let mut path = path;
        if let Some(stripped) = path.strip_prefix('/') {
            segments.clear();
            path = stripped;
        }

        for seg in path.split('/') {
            match seg {
                "" | "." => {},
                ".." => {
                    segments.pop();
                },
                s => {
                    segments.push(s);
                }
            }
        }

        segments.join("/")
    }

    fn resolve_item_key(&self, path: &str) -> Result<String, StoreError> {
        let key = self.resolve(path);
        if key.is_empty() {
            return Err(StoreError::Transport(anyhow!(
                "'{}' resolves to a root path, not to an item",
                path
            )))
        }
        Ok(key)
    }
}


#[async_trait]
impl ObjectStore for S3Store {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let key = self.resolve_item_key(path)?;
        let result = self.client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(StoreError::transport(err))
                }
            }
        }
    }

    async fn put(&self, path: &str, value: Bytes) -> Result<(), StoreError> {
        let key = self.resolve_item_key(path)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(value))
            .send()
            .await
            .map_err(|err| StoreError::transport(err.into_service_error()))?;
        debug!(bucket = %self.bucket, key = %key, "object saved");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        let key = self.resolve_item_key(path)?;
        let result = self.client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                return if err.is_no_such_key() {
                    Err(StoreError::NotFound(path.to_string()))
                } else {
                    Err(StoreError::transport(err))
                }
            }
        };

        let data = output.body
            .collect()
            .await
            .map_err(StoreError::transport)?;

        Ok(data.into_bytes())
    }
}
