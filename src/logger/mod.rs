//! 日志模块
//!
//! 基于 `log` 门面，所有日志写到 stderr，避免和 stdout 上镜像输出的子域名混在一起。

mod rlogger;

pub use rlogger::Logger;

use log::LevelFilter;

/// 初始化全局日志器，只能调用一次
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let logger = Logger::new(level);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}
