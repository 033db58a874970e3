//! 集成测试共享脚手架：内存数据库 + 临时上传目录 + 录制型索引后端
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use surrealdb::RecordId;

use catalog_engine::core::AppResult;
use catalog_engine::db::models::AttributeValueCreate;
use catalog_engine::services::{ImageIndexer, IndexEvent};
use catalog_engine::{Config, Database, EngineState, FileStore};

/// 把事件记下来而不是发出去
#[derive(Default)]
pub struct RecordingIndexer {
    pub events: Mutex<Vec<IndexEvent>>,
}

#[async_trait]
impl ImageIndexer for RecordingIndexer {
    async fn handle(&self, event: IndexEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct TestEngine {
    pub state: EngineState,
    pub indexer_log: Arc<RecordingIndexer>,
    _upload_dir: tempfile::TempDir,
}

impl TestEngine {
    /// 等待 fire-and-forget 派发落地，最多 2 秒
    pub async fn wait_for_events(&self, at_least: usize) -> Vec<IndexEvent> {
        for _ in 0..100 {
            {
                let events = self.indexer_log.events.lock().unwrap();
                if events.len() >= at_least {
                    return events.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.indexer_log.events.lock().unwrap().clone()
    }

    /// 在上传区放一个假图片文件
    pub async fn seed_upload(&self, public_path: &str) {
        self.state
            .files
            .write(public_path, b"fake-image-bytes")
            .await
            .unwrap();
    }
}

pub async fn engine() -> TestEngine {
    let upload_dir = tempfile::tempdir().unwrap();
    let db = Database::memory().await.unwrap();
    let files = FileStore::new(upload_dir.path());
    let indexer_log = Arc::new(RecordingIndexer::default());
    let config = Config::with_overrides("unused", upload_dir.path().display().to_string());
    let state = EngineState::assemble(config, db, files, indexer_log.clone()).unwrap();
    TestEngine {
        state,
        indexer_log,
        _upload_dir: upload_dir,
    }
}

pub fn shop(key: &str) -> RecordId {
    RecordId::from_table_key("shop", key)
}

pub fn value_input(text: &str) -> AttributeValueCreate {
    AttributeValueCreate {
        value: text.to_string(),
        image: None,
        price_adjustment: None,
    }
}
