//! 外部图片索引
//!
//! 索引是 best-effort：事件在数据库提交后异步派发，
//! 失败只记日志，绝不影响已提交的变更。

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use surrealdb::RecordId;
use tracing::{debug, warn};

use crate::core::{AppError, AppResult};
use crate::db::models::TargetGroup;
use crate::services::FileStore;

/// 一次索引侧变更
#[derive(Debug, Clone)]
pub enum IndexEvent {
    /// 新图片入索引
    Index {
        product: RecordId,
        image: String,
        target_group: TargetGroup,
    },
    /// 批量移除某商品的若干图片
    RemoveBatch {
        product: RecordId,
        images: Vec<String>,
    },
    /// 移除某商品的全部索引数据
    RemoveProduct { product: RecordId },
    /// 清空整个索引
    ClearAll,
}

/// 索引后端
#[async_trait]
pub trait ImageIndexer: Send + Sync {
    async fn handle(&self, event: IndexEvent) -> AppResult<()>;
}

/// 丢弃所有事件的后端，测试和无索引部署用
pub struct NullIndexer;

#[async_trait]
impl ImageIndexer for NullIndexer {
    async fn handle(&self, _event: IndexEvent) -> AppResult<()> {
        Ok(())
    }
}

/// HTTP 索引后端
pub struct HttpImageIndexer {
    base_url: String,
    client: reqwest::Client,
    files: FileStore,
}

impl HttpImageIndexer {
    pub fn new(base_url: &str, files: FileStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            files,
        }
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> AppResult<()> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("{path}: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("{path}: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ImageIndexer for HttpImageIndexer {
    async fn handle(&self, event: IndexEvent) -> AppResult<()> {
        match event {
            IndexEvent::Index {
                product,
                image,
                target_group,
            } => {
                // 文件在提交与派发之间可能已被后续操作删掉
                let bytes = match self.files.read(&image).await {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        warn!("Skipping index of missing file: {}", image);
                        return Ok(());
                    }
                };
                let file_name = image
                    .rsplit('/')
                    .next()
                    .unwrap_or("image")
                    .to_string();
                let form = Form::new()
                    .text("product_id", product.to_string())
                    .text("image_path", image.clone())
                    .text("target_group", target_group.as_str())
                    .part("image", Part::bytes(bytes).file_name(file_name));

                let url = format!("{}/txt2img/index", self.base_url);
                self.client
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| AppError::ExternalService(format!("index: {e}")))?
                    .error_for_status()
                    .map_err(|e| AppError::ExternalService(format!("index: {e}")))?;
                debug!("Indexed image {} for {}", image, product);
                Ok(())
            }
            IndexEvent::RemoveBatch { product, images } => {
                self.post_json(
                    "/txt2img/delete-batch",
                    json!({
                        "product_id": product.to_string(),
                        "image_paths": images,
                    }),
                )
                .await
            }
            IndexEvent::RemoveProduct { product } => {
                self.post_json(
                    "/txt2img/delete-product",
                    json!({ "product_id": product.to_string() }),
                )
                .await
            }
            IndexEvent::ClearAll => self.post_json("/txt2img/clear", json!({})).await,
        }
    }
}

/// fire-and-forget 派发器
#[derive(Clone)]
pub struct IndexerService {
    indexer: Arc<dyn ImageIndexer>,
}

impl IndexerService {
    pub fn new(indexer: Arc<dyn ImageIndexer>) -> Self {
        Self { indexer }
    }

    /// 异步派发一个事件，调用方不等待结果
    pub fn enqueue(&self, event: IndexEvent) {
        let indexer = self.indexer.clone();
        tokio::spawn(async move {
            if let Err(e) = indexer.handle(event).await {
                warn!("Index event failed: {}", e);
            }
        });
    }

    /// 同步派发，维护任务用
    pub async fn dispatch(&self, event: IndexEvent) -> AppResult<()> {
        self.indexer.handle(event).await
    }
}
