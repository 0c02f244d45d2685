use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::io::AsyncWrite;

use crate::concurrency::PermitPool;
use crate::config::{GenerationSettings, MksubConfig};
use crate::domains::resolve_domains;
use crate::error::{MksubError, Result};
use crate::gen::{candidate_count, Generator};
use crate::output::{open_sink_files, prepare_output_dir, sink_counts_line, sink_file_paths, RunSummary};
use crate::round_robin::{RoundRobin, RoundRobinSet};
use crate::sink::{shutdown_signal, sink_channel, SinkReport, SinkSender, SinkWriter};
use crate::wordlist::{compile_filter, WordSet};

/// 子域名组合生成引擎
pub struct MksubEngine {
    domains: Vec<String>,
    words: Arc<WordSet>,
    settings: GenerationSettings,
    output_dir: PathBuf,
}

impl MksubEngine {
    /// 校验配置并加载域名和字典
    pub fn new(config: MksubConfig) -> Result<Self> {
        let settings = config.settings()?;

        if config.domains.iter().all(|d| d.trim().is_empty()) && config.domain_file.is_none() {
            return Err(MksubError::NoDomainInput);
        }
        let wordlist = config.wordlist.as_deref().ok_or(MksubError::MissingWordlist)?;
        let filter = compile_filter(config.regex.as_deref())?;

        let domains = resolve_domains(&config.domains, config.domain_file.as_deref())?;
        let words = WordSet::load(wordlist, filter.as_ref())?;

        if words.is_empty() {
            warn!("过滤后字典为空，不会生成任何子域名");
        }

        Ok(Self::from_parts(domains, words, settings, config.output_dir))
    }

    pub fn from_parts(
        domains: Vec<String>,
        words: WordSet,
        settings: GenerationSettings,
        output_dir: PathBuf,
    ) -> Self {
        MksubEngine {
            domains,
            words: Arc::new(words),
            settings,
            output_dir,
        }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn words(&self) -> &WordSet {
        &self.words
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// 每个基础域名的候选数乘以域名数
    pub fn expected_candidates(&self) -> Option<u64> {
        let per_domain = candidate_count(self.words.len(), self.settings.level)?;
        per_domain.checked_mul(self.domains.len() as u64)
    }

    /// 创建输出目录和文件后执行生成
    pub async fn run(&self) -> Result<RunSummary> {
        let dir = prepare_output_dir(&self.output_dir)?;
        let paths = sink_file_paths(&dir, self.settings.num_files);
        let files = open_sink_files(&paths).await?;

        for path in &paths {
            debug!("输出文件: {}", path.display());
        }

        let (summary, _files) = self.run_with_writers(files).await?;
        Ok(summary)
    }

    /// 在任意异步写入器上执行完整流水线，结束后归还写入器
    ///
    /// 顺序：启动全部写入器 -> 生成并等待所有任务结束 -> 广播结束信号 -> 等待写入器排空落盘。
    pub async fn run_with_writers<W>(&self, writers: Vec<W>) -> Result<(RunSummary, Vec<W>)>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        if writers.is_empty() {
            return Err(MksubError::InvalidFileCount(0));
        }

        let started_at = chrono::Local::now();
        let timer = Instant::now();
        let expected = self.expected_candidates();

        info!(
            "基础域名 {} 个，字典 {} 个词，层级 {}，并发 {}，输出文件 {} 个",
            self.domains.len(),
            self.words.len(),
            self.settings.level,
            self.settings.threads,
            writers.len()
        );
        match expected {
            Some(n) => info!("预计生成 {} 个子域名", n),
            None => warn!("预计候选数量超出 u64 范围"),
        }

        let (done_tx, done_rx) = shutdown_signal();
        let mut rotation = RoundRobinSet::default();
        let mut handles = Vec::with_capacity(writers.len());

        for (id, writer) in writers.into_iter().enumerate() {
            let (tx, rx) = sink_channel(self.settings.channel_capacity);
            let sink = SinkWriter::new(
                id,
                rx,
                done_rx.clone(),
                writer,
                self.settings.buffer_size,
                self.settings.silent,
            );
            handles.push(tokio::spawn(sink.run()));
            rotation.add(tx);
        }

        let sinks: Arc<dyn RoundRobin<SinkSender>> = Arc::new(rotation);
        let generator = Generator::new(
            Arc::clone(&self.words),
            sinks,
            PermitPool::new(self.settings.threads),
        );
        let generated = generator.generate(&self.domains, self.settings.level).await;

        // 生成已全部结束（或失败），通知写入器排空并落盘
        let _ = done_tx.send(true);
        let emitted = generator.emitted();
        let undelivered = generator.undelivered();
        let failed_tasks = generator.failed_tasks();
        drop(generator);

        let mut reports: Vec<SinkReport> = Vec::with_capacity(handles.len());
        let mut writers = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok((report, writer)) => {
                    reports.push(report);
                    writers.push(writer);
                }
                Err(e) => warn!("输出任务异常退出: {}", e),
            }
        }
        generated?;

        let summary = RunSummary {
            domains: self.domains.len(),
            words: self.words.len(),
            level: self.settings.level,
            threads: self.settings.threads,
            sinks: reports.len(),
            expected_candidates: expected,
            emitted_candidates: emitted,
            undelivered_candidates: undelivered,
            failed_tasks,
            sink_reports: reports,
            started_at: started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            finished_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            elapsed_ms: timer.elapsed().as_millis() as u64,
        };

        info!(
            "生成完成: {} 个子域名，耗时 {} ms ({})",
            summary.emitted_candidates,
            summary.elapsed_ms,
            sink_counts_line(&summary.sink_reports)
        );
        if summary.failed_tasks > 0 {
            warn!("{} 个生成任务异常退出，输出可能不完整", summary.failed_tasks);
        }

        Ok((summary, writers))
    }
}

/// 便捷函数：在内存中生成全部候选，仅适合小规模输入
pub async fn generate_subdomains(domains: Vec<String>, words: Vec<String>, level: usize) -> Result<Vec<String>> {
    let config = MksubConfig {
        level: i64::try_from(level).map_err(|_| MksubError::InvalidLevel(i64::MAX))?,
        ..Default::default()
    };
    let settings = config.settings()?;
    if domains.is_empty() {
        return Err(MksubError::NoDomainInput);
    }

    let engine = MksubEngine::from_parts(domains, WordSet::from_words(words, None), settings, PathBuf::new());
    let (summary, mut writers) = engine.run_with_writers(vec![Vec::<u8>::new()]).await?;
    summary.check()?;

    let out = writers.pop().unwrap_or_default();
    Ok(String::from_utf8_lossy(&out).lines().map(str::to_string).collect())
}
