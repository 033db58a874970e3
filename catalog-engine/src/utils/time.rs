//! 时间工具

/// 当前时间 (epoch 毫秒)
///
/// 模型的 created_at / updated_at 统一使用 i64 毫秒时间戳
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
