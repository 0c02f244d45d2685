//! 子域名组合生成
//!
//! 对基础域名 D 和层级 L，生成 k = 1..L 层的所有组合 `w1.w2...wk.D`（允许重复取词），
//! 总数为 Σ m^k。生成采用递归展开，每个任务只持有自己的前缀路径，产出即发送，
//! 不在内存中累积结果。
//!
//! 调度方式：根任务（每个基础域名一个）由编排者阻塞等待许可后启动；
//! 任务内部展开下一层时，只有拿到空闲许可才派生新任务，否则就在当前任务里直接递归。
//! 所以存活任务数永远不超过许可数，父任务也不会因为等待子任务许可而死锁。
//! 父任务会等全部子任务结束后才释放自己的许可。

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use itertools::Itertools;
use log::{debug, warn};

use crate::concurrency::{PermitPool, TaskGroup};
use crate::error::Result;
use crate::round_robin::RoundRobin;
use crate::sink::SinkSender;
use crate::wordlist::WordSet;

type Expansion = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 每个基础域名的候选总数 Σ_{k=1..level} words^k，溢出时返回 `None`
pub fn candidate_count(words: usize, level: usize) -> Option<u64> {
    let m = u64::try_from(words).ok()?;
    let mut total: u64 = 0;
    let mut power: u64 = 1;
    for _ in 0..level {
        power = power.checked_mul(m)?;
        total = total.checked_add(power)?;
    }
    Some(total)
}

/// 单线程惰性遍历某个域名的全部候选，顺序为先按层级、再按字典序
pub fn iter_candidates<'a>(
    words: &'a WordSet,
    domain: &'a str,
    level: usize,
) -> impl Iterator<Item = String> + 'a {
    (1..=level).flat_map(move |k| {
        itertools::repeat_n(words.iter(), k)
            .multi_cartesian_product()
            .map(move |labels| format!("{}.{}", labels.iter().join("."), domain))
    })
}

/// 并发组合生成器
pub struct Generator {
    words: Arc<WordSet>,
    sinks: Arc<dyn RoundRobin<SinkSender>>,
    pool: PermitPool,
    emitted: AtomicU64,
    undelivered: AtomicU64,
    failed_tasks: AtomicU64,
}

impl Generator {
    pub fn new(words: Arc<WordSet>, sinks: Arc<dyn RoundRobin<SinkSender>>, pool: PermitPool) -> Arc<Self> {
        Arc::new(Generator {
            words,
            sinks,
            pool,
            emitted: AtomicU64::new(0),
            undelivered: AtomicU64::new(0),
            failed_tasks: AtomicU64::new(0),
        })
    }

    /// 为所有基础域名生成候选，返回时全部任务（含子任务）都已结束
    pub async fn generate(self: &Arc<Self>, domains: &[String], level: usize) -> Result<()> {
        let mut roots = TaskGroup::new();
        for domain in domains {
            self.spawn_domain(&mut roots, domain.clone(), level).await?;
        }

        let failed = roots.join().await;
        if failed > 0 {
            self.failed_tasks.fetch_add(failed as u64, Ordering::Relaxed);
        }
        debug!("全部生成任务结束，共产出 {} 个候选", self.emitted());
        Ok(())
    }

    /// 等待许可后为一个基础域名启动根任务
    pub async fn spawn_domain(self: &Arc<Self>, group: &mut TaskGroup, domain: String, level: usize) -> Result<()> {
        let permit = self.pool.acquire().await?;
        group.spawn(permit, Arc::clone(self).expand(domain, level, false));
        Ok(())
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// 因输出端已关闭而没能送出的候选数
    pub fn undelivered(&self) -> u64 {
        self.undelivered.load(Ordering::Relaxed)
    }

    pub fn failed_tasks(&self) -> u64 {
        self.failed_tasks.load(Ordering::Relaxed)
    }

    /// `suffix` 是已经拼好的部分（含基础域名），`remaining` 是还能往前加的层数。
    /// 根任务的 `suffix` 就是基础域名本身，不输出。
    fn expand(self: Arc<Self>, suffix: String, remaining: usize, emit_self: bool) -> Expansion {
        Box::pin(async move {
            if emit_self {
                self.emit(&suffix).await;
            }

            if remaining == 0 {
                return;
            }

            if remaining == 1 {
                for word in self.words.iter() {
                    self.emit(&format!("{}.{}", word, suffix)).await;
                }
                return;
            }

            let mut children = TaskGroup::new();
            for word in self.words.iter() {
                let child = format!("{}.{}", word, suffix);
                match self.pool.try_acquire() {
                    Some(permit) => children.spawn(permit, Arc::clone(&self).expand(child, remaining - 1, true)),
                    None => Arc::clone(&self).expand(child, remaining - 1, true).await,
                }
            }

            let failed = children.join().await;
            if failed > 0 {
                self.failed_tasks.fetch_add(failed as u64, Ordering::Relaxed);
            }
        })
    }

    async fn emit(&self, candidate: &str) {
        let Some(sink) = self.sinks.next() else {
            self.undelivered.fetch_add(1, Ordering::Relaxed);
            return;
        };

        match sink.send(format!("{}\n", candidate)).await {
            Ok(()) => {
                self.emitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                // 只在第一次丢失时告警，避免刷屏
                if self.undelivered.fetch_add(1, Ordering::Relaxed) == 0 {
                    warn!("输出端已关闭，候选 {} 无法写出", candidate);
                }
            }
        }
    }
}
