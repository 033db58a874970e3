//! 工具模块 - 日志与时间

pub mod logger;
pub mod time;

pub use time::now_millis;
