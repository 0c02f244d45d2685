//! 生成配置
//!
//! `MksubConfig` 是面向调用方的原始配置，数值字段保持有符号以便如实报告非法输入；
//! `GenerationSettings` 是校验后的配置，流水线内部只使用它。

use std::path::PathBuf;

use log::warn;

use crate::error::{MksubError, Result};

/// 并发上限，超过时会被截断
pub const MAX_THREADS: usize = 100_000;
pub const DEFAULT_THREADS: i64 = 100;
pub const DEFAULT_BUFFER_MB: usize = 100;
/// 每个输出通道可以暂存的候选数量
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100_000;

/// 子域名生成配置
#[derive(Debug, Clone)]
pub struct MksubConfig {
    /// 目标域名列表，优先于 `domain_file`
    pub domains: Vec<String>,
    /// 域名文件路径，一行一个
    pub domain_file: Option<PathBuf>,
    /// 字典文件路径
    pub wordlist: Option<PathBuf>,
    /// 字典过滤正则
    pub regex: Option<String>,
    /// 生成的子域名层级
    pub level: i64,
    /// 最大并发生成任务数
    pub threads: i64,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 输出文件数量
    pub num_files: i64,
    /// 是否静默（不镜像到 stdout）
    pub silent: bool,
    /// 每个输出文件的内存缓冲阈值（字节）
    pub buffer_size: usize,
    /// 每个输出通道的容量
    pub channel_capacity: usize,
}

impl Default for MksubConfig {
    fn default() -> Self {
        MksubConfig {
            domains: Vec::new(),
            domain_file: None,
            wordlist: None,
            regex: None,
            level: 1,
            threads: DEFAULT_THREADS,
            output_dir: PathBuf::from("mksub-out"),
            num_files: 1,
            silent: true,
            buffer_size: DEFAULT_BUFFER_MB * 1024 * 1024,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// 校验后的运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    pub level: usize,
    pub threads: usize,
    pub num_files: usize,
    pub buffer_size: usize,
    pub channel_capacity: usize,
    pub silent: bool,
}

impl GenerationSettings {
    pub fn new(level: usize, threads: usize, num_files: usize) -> Self {
        GenerationSettings {
            level,
            threads,
            num_files,
            buffer_size: DEFAULT_BUFFER_MB * 1024 * 1024,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            silent: true,
        }
    }
}

impl MksubConfig {
    /// 校验数值参数，不做任何 I/O
    pub fn settings(&self) -> Result<GenerationSettings> {
        if self.level <= 0 {
            return Err(MksubError::InvalidLevel(self.level));
        }
        if self.threads <= 0 {
            return Err(MksubError::InvalidThreads(self.threads));
        }
        if self.num_files <= 0 {
            return Err(MksubError::InvalidFileCount(self.num_files));
        }
        if self.buffer_size == 0 || self.channel_capacity == 0 {
            return Err(MksubError::InvalidBufferSize);
        }

        let mut threads = usize::try_from(self.threads).unwrap_or(MAX_THREADS);
        if threads > MAX_THREADS {
            warn!("线程数 {} 超过上限，已调整为 {}", threads, MAX_THREADS);
            threads = MAX_THREADS;
        }

        Ok(GenerationSettings {
            level: usize::try_from(self.level).map_err(|_| MksubError::InvalidLevel(self.level))?,
            threads,
            num_files: usize::try_from(self.num_files)
                .map_err(|_| MksubError::InvalidFileCount(self.num_files))?,
            buffer_size: self.buffer_size,
            channel_capacity: self.channel_capacity,
            silent: self.silent,
        })
    }
}
