//! 错误类型
//!
//! 启动前的配置/输入错误全部是致命的，由 `main` 统一打印并以退出码 1 结束；
//! 运行期的写入失败只记录在每个输出端的报告里，运行结束后再汇总为 `FlushFailed`。

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, MksubError>;

#[derive(thiserror::Error, Debug)]
pub enum MksubError {
    /// 既没有 `--domain` 也没有 `--domain-file`
    #[error("没有提供任何域名输入 (--domain / --domain-file)")]
    NoDomainInput,

    #[error("没有提供字典文件 (--wordlist)")]
    MissingWordlist,

    #[error("子域名层级必须是正整数，当前值: {0}")]
    InvalidLevel(i64),

    #[error("线程数必须是正整数，当前值: {0}")]
    InvalidThreads(i64),

    #[error("输出文件数量必须是正整数，当前值: {0}")]
    InvalidFileCount(i64),

    #[error("输出缓冲区大小和通道容量必须大于 0")]
    InvalidBufferSize,

    #[error("无效的正则表达式 `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("无法读取输入文件 {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("无法创建输出目录 {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("无法打开输出文件 {}: {source}", path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("无法导出运行汇总到 {}: {source}", path.display())]
    ExportSummary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 并发许可池被关闭，生成任务无法继续调度
    #[error("并发许可池已关闭")]
    PermitPoolClosed,

    #[error("{sinks} 个输出文件写入失败，丢失 {lost_bytes} 字节")]
    FlushFailed { sinks: usize, lost_bytes: u64 },

    /// 有生成任务异常退出或候选没能送达输出端
    #[error("生成未完成: {failed_tasks} 个任务异常退出，{undelivered} 个候选未送达")]
    IncompleteRun { failed_tasks: u64, undelivered: u64 },

    #[error("日志初始化失败: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl MksubError {
    /// 是否属于启动前就能检测到的配置错误
    pub fn is_config_error(&self) -> bool {
        !matches!(
            self,
            MksubError::FlushFailed { .. }
                | MksubError::IncompleteRun { .. }
                | MksubError::PermitPoolClosed
                | MksubError::ExportSummary { .. }
        )
    }
}
