use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use log::LevelFilter;

use crate::config::{MksubConfig, DEFAULT_BUFFER_MB, DEFAULT_CHANNEL_CAPACITY};

/// 汇总导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Txt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(format!("不支持的输出格式: {}。支持的格式: json, txt", s)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rmksub")]
#[command(version)]
#[command(about = "Generate subdomain combinations from a wordlist", long_about = None, arg_required_else_help = true)]
pub struct Opts {
    /// input domain, may be repeated
    #[arg(short, long)]
    pub domain: Vec<String>,

    /// input domain file, one domain per line
    #[arg(long, visible_alias = "df")]
    pub domain_file: Option<PathBuf>,

    /// wordlist file
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// regex to filter words from the wordlist file
    #[arg(short, long)]
    pub regex: Option<String>,

    /// subdomain level to generate
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub level: i64,

    /// maximum number of concurrent generation tasks
    #[arg(short, long, default_value_t = 100, allow_negative_numbers = true)]
    pub threads: i64,

    /// output folder (file(s) use the same name)
    #[arg(short, long, default_value = "mksub-out")]
    pub output: PathBuf,

    /// number of files to split the output into
    #[arg(long, visible_alias = "nf", default_value_t = 1, allow_negative_numbers = true)]
    pub num_files: i64,

    /// skip mirroring generated subdomains to stdout
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub silent: bool,

    /// per-file write buffer in MB
    #[arg(long, default_value_t = DEFAULT_BUFFER_MB)]
    pub buffer_mb: usize,

    /// pending candidates per output file
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// print run summary when finished
    #[arg(long)]
    pub summary: bool,

    /// export run summary to this file
    #[arg(long)]
    pub summary_file: Option<PathBuf>,

    /// summary export format (json, txt)
    #[arg(long, default_value = "json")]
    pub summary_format: OutputFormat,

    /// log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

/// 命令行解析失败时的退出码：帮助和版本信息为 0，其余（含缺少参数）为 1
pub fn usage_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

impl Opts {
    /// 转换为库配置
    pub fn to_config(&self) -> MksubConfig {
        MksubConfig {
            domains: self.domain.clone(),
            domain_file: self.domain_file.clone(),
            wordlist: self.wordlist.clone(),
            regex: self.regex.clone(),
            level: self.level,
            threads: self.threads,
            output_dir: self.output.clone(),
            num_files: self.num_files,
            silent: self.silent,
            buffer_size: self.buffer_mb.saturating_mul(1024 * 1024),
            channel_capacity: self.channel_capacity,
        }
    }
}
