//! 输出端写入器
//!
//! 每个输出文件对应一个 `SinkWriter`，独占自己的缓冲区和文件句柄。
//! 状态流转: Accepting -> Draining -> Flushing -> Closed。
//! 收到结束信号后先把通道里已经排队的候选全部取出，再做最后一次落盘。

use std::io::Write;

use log::{debug, error};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};

pub type SinkSender = mpsc::Sender<String>;
pub type SinkReceiver = mpsc::Receiver<String>;

/// 创建一个输出通道
pub fn sink_channel(capacity: usize) -> (SinkSender, SinkReceiver) {
    mpsc::channel(capacity)
}

/// 结束广播，生成全部完成后由编排者发送 `true`
pub fn shutdown_signal() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SinkState {
    Accepting,
    Draining,
    Flushing,
    Closed,
}

/// 单个输出端的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub id: usize,
    /// 收到的候选数
    pub received: u64,
    pub bytes_written: u64,
    pub flushes: u64,
    pub failed_flushes: u64,
    pub lost_bytes: u64,
}

pub struct SinkWriter<W> {
    rx: SinkReceiver,
    done: watch::Receiver<bool>,
    writer: W,
    buffer: Vec<u8>,
    threshold: usize,
    /// 非静默模式下候选同时写到这里（默认标准输出）
    mirror: Option<Box<dyn Write + Send>>,
    state: SinkState,
    report: SinkReport,
}

impl<W> SinkWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        id: usize,
        rx: SinkReceiver,
        done: watch::Receiver<bool>,
        writer: W,
        threshold: usize,
        silent: bool,
    ) -> Self {
        SinkWriter {
            rx,
            done,
            writer,
            buffer: Vec::new(),
            threshold,
            mirror: (!silent).then(|| Box::new(std::io::stdout()) as Box<dyn Write + Send>),
            state: SinkState::Accepting,
            report: SinkReport { id, ..Default::default() },
        }
    }

    /// 替换镜像输出目标
    pub fn with_mirror<M: Write + Send + 'static>(mut self, mirror: M) -> Self {
        self.mirror = Some(Box::new(mirror));
        self
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// 运行写入循环直到关闭，返回统计和底层写入器
    pub async fn run(mut self) -> (SinkReport, W) {
        debug!("输出端 {} 开始接收", self.report.id);

        while self.state == SinkState::Accepting {
            let next = tokio::select! {
                biased;
                line = self.rx.recv() => line,
                // 发送端被丢弃同样视为结束
                _ = self.done.changed() => None,
            };

            match next {
                Some(line) => self.accept(line).await,
                None => self.state = SinkState::Draining,
            }
        }

        self.drain().await;

        self.state = SinkState::Flushing;
        self.flush().await;
        if let Err(e) = self.writer.flush().await {
            error!("输出端 {} 最终落盘失败: {}", self.report.id, e);
            self.report.failed_flushes += 1;
        }
        if let Some(mirror) = self.mirror.as_mut() {
            let _ = mirror.flush();
        }
        self.state = SinkState::Closed;

        debug!(
            "输出端 {} 已关闭，共 {} 条，{} 字节",
            self.report.id, self.report.received, self.report.bytes_written
        );
        (self.report, self.writer)
    }

    async fn accept(&mut self, line: String) {
        if let Some(mirror) = self.mirror.as_mut() {
            let _ = mirror.write_all(line.as_bytes());
        }

        self.buffer.extend_from_slice(line.as_bytes());
        self.report.received += 1;

        if self.buffer.len() >= self.threshold {
            self.flush().await;
        }
    }

    /// 非阻塞地取完通道里剩余的候选
    async fn drain(&mut self) {
        while let Ok(line) = self.rx.try_recv() {
            self.accept(line).await;
        }
    }

    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let len = self.buffer.len() as u64;
        match self.writer.write_all(&self.buffer).await {
            Ok(()) => {
                self.report.bytes_written += len;
                self.report.flushes += 1;
            }
            Err(e) => {
                error!("输出端 {} 写入 {} 字节失败: {}", self.report.id, len, e);
                self.report.failed_flushes += 1;
                self.report.lost_bytes += len;
            }
        }
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk full")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_flushes_when_threshold_crossed() {
        let (tx, rx) = sink_channel(16);
        let (_done_tx, done_rx) = shutdown_signal();
        let writer = SinkWriter::new(0, rx, done_rx, Vec::new(), 10, true);

        for _ in 0..3 {
            tx.send("aaaa.com\n".to_string()).await.unwrap();
        }
        drop(tx);

        let (report, out) = writer.run().await;
        assert_eq!(report.received, 3);
        assert_eq!(report.bytes_written, 27);
        // 一次阈值落盘加一次关闭时落盘
        assert_eq!(report.flushes, 2);
        assert_eq!(out, b"aaaa.com\naaaa.com\naaaa.com\n".to_vec());
    }

    #[tokio::test]
    async fn test_drains_queued_items_after_done() {
        let (tx, rx) = sink_channel(16);
        let (done_tx, done_rx) = shutdown_signal();

        for i in 0..5 {
            tx.send(format!("w{}.example.com\n", i)).await.unwrap();
        }
        done_tx.send(true).unwrap();

        // 发送端仍然存活，只靠结束信号终止
        let writer = SinkWriter::new(1, rx, done_rx, Vec::new(), usize::MAX, true);
        let (report, out) = writer.run().await;

        assert_eq!(report.received, 5);
        assert_eq!(report.flushes, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 5);
        drop(tx);
    }

    #[test]
    fn test_write_failures_are_counted() {
        tokio_test::block_on(async {
            let (tx, rx) = sink_channel(4);
            let (_done_tx, done_rx) = shutdown_signal();
            let writer = SinkWriter::new(2, rx, done_rx, BrokenWriter, 1, true);

            tx.send("a.example.com\n".to_string()).await.unwrap();
            tx.send("b.example.com\n".to_string()).await.unwrap();
            drop(tx);

            let (report, _) = writer.run().await;
            assert_eq!(report.received, 2);
            assert_eq!(report.failed_flushes, 2);
            assert_eq!(report.lost_bytes, 28);
            assert_eq!(report.bytes_written, 0);
        });
    }

    #[tokio::test]
    async fn test_mirror_copies_every_candidate() {
        let (tx, rx) = sink_channel(8);
        let (_done_tx, done_rx) = shutdown_signal();
        let mirror = SharedBuf::default();
        let writer = SinkWriter::new(3, rx, done_rx, Vec::new(), 16, false).with_mirror(mirror.clone());

        for name in ["www", "mail", "api"] {
            tx.send(format!("{}.example.com\n", name)).await.unwrap();
        }
        drop(tx);

        let (report, out) = writer.run().await;
        let mirrored = mirror.0.lock().unwrap().clone();
        assert_eq!(report.received, 3);
        assert_eq!(mirrored, out);
        assert_eq!(String::from_utf8(mirrored).unwrap().lines().count(), 3);
    }

    #[tokio::test]
    async fn test_silent_writer_has_no_mirror() {
        let (tx, rx) = sink_channel(2);
        let (_done_tx, done_rx) = shutdown_signal();
        let writer = SinkWriter::new(0, rx, done_rx, Vec::new(), 1, true);
        assert!(writer.mirror.is_none());

        tx.send("a.example.com\n".to_string()).await.unwrap();
        drop(tx);
        let (report, out) = writer.run().await;
        assert_eq!(report.received, 1);
        assert_eq!(out, b"a.example.com\n".to_vec());
    }

    #[test]
    fn test_initial_state() {
        let (_tx, rx) = sink_channel(1);
        let (_done_tx, done_rx) = shutdown_signal();
        let writer = SinkWriter::new(0, rx, done_rx, Vec::new(), 1, true);
        assert_eq!(writer.state(), SinkState::Accepting);
    }
}
