/// 引擎配置 - 目录引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATA_DIR | /var/lib/catalog/data | 文档存储目录 |
/// | UPLOAD_DIR | /var/lib/catalog/uploads | 上传文件根目录 |
/// | INDEXER_URL | http://localhost:8000 | 外部索引服务地址 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// UPLOAD_DIR=/data/uploads cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 文档存储目录 (RocksDB)
    pub data_dir: String,
    /// 上传文件根目录，对外暴露为 /uploads/... 相对路径
    pub upload_dir: String,
    /// 外部索引服务 URL
    pub indexer_url: String,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/var/lib/catalog/data".into()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "/var/lib/catalog/uploads".into()),
            indexer_url: std::env::var("INDEXER_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(data_dir: impl Into<String>, upload_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.upload_dir = upload_dir.into();
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
