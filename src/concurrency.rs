//! 并发控制
//!
//! `PermitPool` 是计数信号量，限制同时存活的生成任务数量；
//! `TaskGroup` 相当于一个等待组，持有一批子任务并在 `join` 时等待全部结束。
//! 许可随任务一起移动，任务结束（包括 panic）时自动归还，且只归还一次。

use std::future::Future;
use std::sync::Arc;

use log::error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::error::{MksubError, Result};

pub type Permit = OwnedSemaphorePermit;

/// 并发许可池
#[derive(Debug, Clone)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl PermitPool {
    pub fn new(capacity: usize) -> Self {
        PermitPool {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// 等待直到拿到一个许可
    pub async fn acquire(&self) -> Result<Permit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MksubError::PermitPoolClosed)
    }

    /// 立即尝试获取许可，没有空闲许可时返回 `None`
    pub fn try_acquire(&self) -> Option<Permit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }
}

/// 等待组
#[derive(Default)]
pub struct TaskGroup {
    tasks: JoinSet<()>,
}

impl TaskGroup {
    pub fn new() -> Self {
        TaskGroup { tasks: JoinSet::new() }
    }

    /// 启动一个持有许可的任务，任务完成后许可才释放
    pub fn spawn<F>(&mut self, permit: Permit, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(async move {
            let _permit = permit;
            task.await;
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 等待所有任务结束，返回异常退出的任务数
    pub async fn join(mut self) -> usize {
        let mut failed = 0;
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                error!("生成任务异常退出: {}", e);
                failed += 1;
            }
        }
        failed
    }
}
