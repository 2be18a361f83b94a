//! External service contracts consumed by the pipeline and read path.
//!
//! Every collaborator (identity, blob store, key-value store, AI chat,
//! PDF renderer) is an object-safe trait held as `Arc<dyn T>` and injected
//! explicitly. Nothing in the application reaches for an ambient global
//! client; tests substitute in-memory fakes for all five contracts.

pub mod ai;
pub mod blob;
pub mod identity;
pub mod kv;
pub mod pdf;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tracing::info;

use crate::config::Config;
use crate::services::ai::{AnthropicChat, ChatService};
use crate::services::blob::{BlobStore, S3BlobStore};
use crate::services::identity::{IdentityProvider, KvSessionIdentity};
use crate::services::kv::{KvStore, RedisKvStore};
use crate::services::pdf::{PdfRenderer, PdftoppmRenderer};

/// Upper bound on the one-shot readiness pass at startup.
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// The five external services, bundled for injection.
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub kv: Arc<dyn KvStore>,
    pub chat: Arc<dyn ChatService>,
    pub renderer: Arc<dyn PdfRenderer>,
}

impl Services {
    /// Connects every production backend and verifies reachability in a
    /// single bounded readiness pass. Resolves once: an unreachable backend
    /// fails startup instead of being polled on an interval.
    pub async fn connect(config: &Config) -> Result<Arc<Self>> {
        let kv_store = RedisKvStore::connect(&config.redis_url).await?;
        info!("Redis client initialized");

        let s3 = build_s3_client(config).await;
        let blob_store = S3BlobStore::new(s3, config.s3_bucket.clone());
        info!("S3 client initialized");

        let renderer = PdftoppmRenderer;

        tokio::time::timeout(READY_TIMEOUT, async {
            kv_store.check_ready().await?;
            blob_store.check_ready().await?;
            renderer.check_ready().await
        })
        .await
        .map_err(|_| {
            anyhow!(
                "service readiness check timed out after {}s",
                READY_TIMEOUT.as_secs()
            )
        })??;

        let kv: Arc<dyn KvStore> = Arc::new(kv_store);
        let blobs: Arc<dyn BlobStore> = Arc::new(blob_store);
        let chat = AnthropicChat::new(config.anthropic_api_key.clone(), blobs.clone());
        info!("Chat client initialized (model: {})", ai::DEFAULT_MODEL);

        let identity = KvSessionIdentity::new(kv.clone(), config.access_secret.clone());

        Ok(Arc::new(Services {
            identity: Arc::new(identity),
            blobs,
            kv,
            chat: Arc::new(chat),
            renderer: Arc::new(renderer),
        }))
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumind-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
