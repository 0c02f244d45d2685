//! 轮询分发
//!
//! 生成任务每产出一个候选就调用 `next()` 取下一个输出端，
//! 计数器只做原子自增，不需要加锁。`add()` 只在启动阶段使用。

use std::sync::atomic::{AtomicUsize, Ordering};

/// 轮询选择器
pub trait RoundRobin<T>: Send + Sync {
    /// 返回轮转中的下一个元素，集合为空时返回 `None`
    fn next(&self) -> Option<&T>;

    /// 追加一个元素到轮转中
    fn add(&mut self, item: T);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct RoundRobinSet<T> {
    items: Vec<T>,
    next: AtomicUsize,
}

impl<T> RoundRobinSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        RoundRobinSet {
            items,
            next: AtomicUsize::new(0),
        }
    }
}

impl<T> Default for RoundRobinSet<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Send + Sync> RoundRobin<T> for RoundRobinSet<T> {
    fn next(&self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        self.items.get(n % self.items.len())
    }

    fn add(&mut self, item: T) {
        self.items.push(item);
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_rotation_order() {
        let mut rr = RoundRobinSet::new(vec!['a']);
        rr.add('b');
        rr.add('c');

        let picked: String = (0..7).filter_map(|_| rr.next().copied()).collect();
        assert_eq!(picked, "abcabca");
    }

    #[test]
    fn test_empty_returns_none() {
        let rr: RoundRobinSet<u8> = RoundRobinSet::default();
        assert!(rr.is_empty());
        assert!(rr.next().is_none());
    }

    #[test]
    fn test_fairness_under_concurrency() {
        let sinks = 3;
        let per_thread = 1001;
        let threads = 8;
        let rr = Arc::new(RoundRobinSet::new((0..sinks).collect::<Vec<usize>>()));
        let mut handles = vec![];

        for _ in 0..threads {
            let rr = rr.clone();
            handles.push(thread::spawn(move || {
                let mut counts = vec![0usize; sinks];
                for _ in 0..per_thread {
                    counts[*rr.next().unwrap()] += 1;
                }
                counts
            }));
        }

        let mut totals = vec![0usize; sinks];
        for handle in handles {
            for (i, c) in handle.join().unwrap().into_iter().enumerate() {
                totals[i] += c;
            }
        }

        let k = per_thread * threads;
        for total in totals {
            assert!(total == k / sinks || total == (k + sinks - 1) / sinks);
        }
    }
}
