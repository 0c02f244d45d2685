use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Serialize;

use crate::error::{MksubError, Result};
use crate::input::OutputFormat;
use crate::sink::SinkReport;

/// 一次运行的汇总
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub domains: usize,
    pub words: usize,
    pub level: usize,
    pub threads: usize,
    pub sinks: usize,
    /// 按公式计算的候选总数，溢出时为空
    pub expected_candidates: Option<u64>,
    pub emitted_candidates: u64,
    pub undelivered_candidates: u64,
    pub failed_tasks: u64,
    pub sink_reports: Vec<SinkReport>,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn total_received(&self) -> u64 {
        self.sink_reports.iter().map(|r| r.received).sum()
    }

    pub fn failed_sinks(&self) -> usize {
        self.sink_reports.iter().filter(|r| r.failed_flushes > 0).count()
    }

    pub fn lost_bytes(&self) -> u64 {
        self.sink_reports.iter().map(|r| r.lost_bytes).sum()
    }

    /// 运行是否完整：任务无异常、候选全部送达、写入全部成功
    pub fn check(&self) -> Result<()> {
        if self.failed_tasks > 0 || self.undelivered_candidates > 0 {
            return Err(MksubError::IncompleteRun {
                failed_tasks: self.failed_tasks,
                undelivered: self.undelivered_candidates,
            });
        }
        self.check_flushes()
    }

    /// 有写入失败时转为错误
    pub fn check_flushes(&self) -> Result<()> {
        match self.failed_sinks() {
            0 => Ok(()),
            sinks => Err(MksubError::FlushFailed {
                sinks,
                lost_bytes: self.lost_bytes(),
            }),
        }
    }
}

/// 确保输出目录存在
pub fn prepare_output_dir(path: &Path) -> Result<PathBuf> {
    let dir_err = |source: std::io::Error| MksubError::OutputDir { path: path.to_path_buf(), source };

    if path.exists() && !path.is_dir() {
        return Err(dir_err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "路径已存在且不是目录",
        )));
    }
    fs::create_dir_all(path).map_err(dir_err)?;
    Ok(path.to_path_buf())
}

/// 输出文件路径：文件名与目录同名，多个文件时加 `-序号` 后缀
pub fn sink_file_paths(dir: &Path, count: usize) -> Vec<PathBuf> {
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mksub-out".to_string());

    if count <= 1 {
        return vec![dir.join(base)];
    }
    (0..count).map(|i| dir.join(format!("{}-{}", base, i))).collect()
}

/// 创建所有输出文件
pub async fn open_sink_files(paths: &[PathBuf]) -> Result<Vec<tokio::fs::File>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = tokio::fs::File::create(path).await.map_err(|source| MksubError::OpenSink {
            path: path.clone(),
            source,
        })?;
        files.push(file);
    }
    Ok(files)
}

/// 导出汇总到文件
pub fn export_summary(summary: &RunSummary, output_path: &Path, format: OutputFormat) -> Result<()> {
    let export_err = |source: std::io::Error| MksubError::ExportSummary {
        path: output_path.to_path_buf(),
        source,
    };

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(summary).map_err(|e| export_err(e.into()))?,
        OutputFormat::Txt => summary_to_txt(summary),
    };

    let mut file = fs::File::create(output_path).map_err(export_err)?;
    file.write_all(content.as_bytes()).map_err(export_err)?;
    Ok(())
}

/// 文本格式汇总
pub fn summary_to_txt(summary: &RunSummary) -> String {
    let mut txt = String::new();

    txt.push_str("rmksub 运行汇总\n");
    txt.push_str(&format!("开始时间: {}\n", summary.started_at));
    txt.push_str(&format!("结束时间: {}\n", summary.finished_at));
    txt.push_str(&format!("{}\n", "=".repeat(60)));
    txt.push_str(&format!("  基础域名: {}\n", summary.domains));
    txt.push_str(&format!("  字典词数: {}\n", summary.words));
    txt.push_str(&format!("  层级: {}\n", summary.level));
    txt.push_str(&format!("  并发: {}\n", summary.threads));
    txt.push_str(&format!(
        "  预计候选: {}\n",
        summary
            .expected_candidates
            .map_or("溢出".to_string(), |n| n.to_string())
    ));
    txt.push_str(&format!("  实际产出: {}\n", summary.emitted_candidates));
    txt.push_str(&format!("  未送达: {}\n", summary.undelivered_candidates));
    txt.push_str(&format!("  耗时: {} ms\n", summary.elapsed_ms));
    txt.push('\n');

    txt.push_str(&format!(
        "{:<6} {:<12} {:<14} {:<8} {:<8}\n",
        "文件", "条数", "字节", "落盘", "失败"
    ));
    txt.push_str(&format!("{}\n", "-".repeat(60)));
    for report in &summary.sink_reports {
        txt.push_str(&format!(
            "{:<6} {:<12} {:<14} {:<8} {:<8}\n",
            report.id, report.received, report.bytes_written, report.flushes, report.failed_flushes
        ));
    }

    txt
}

/// 单行的各输出端条数，用于日志
pub fn sink_counts_line(reports: &[SinkReport]) -> String {
    reports
        .iter()
        .map(|r| format!("#{}={}", r.id, r.received))
        .join(", ")
}
