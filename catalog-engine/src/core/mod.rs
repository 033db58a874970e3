//! 核心模块 - 配置、错误、状态

pub mod actor;
pub mod config;
pub mod error;
pub mod state;

pub use actor::Actor;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::EngineState;
