use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;
use std::sync::Mutex;

/// 带颜色标签的日志器，统一输出到 stderr
pub struct Logger {
    use_colors: bool,
    max_level: LevelFilter,
    mutex: Mutex<()>,
}

impl Logger {
    pub fn new(max_level: LevelFilter) -> Self {
        Logger {
            use_colors: true,
            max_level,
            mutex: Mutex::new(()),
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn label(level: Level) -> &'static str {
        match level {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    fn wrap(&self, level: Level) -> String {
        let label = Self::label(level);
        if !self.use_colors {
            return label.to_string();
        }

        match level {
            Level::Error => label.red().to_string(),
            Level::Warn => label.yellow().to_string(),
            Level::Info => label.blue().to_string(),
            Level::Debug => label.magenta().to_string(),
            Level::Trace => label.normal().to_string(),
        }
    }

    /// 格式化一条日志
    pub fn format(&self, level: Level, args: &std::fmt::Arguments) -> String {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        format!("{} [{}] {}", now, self.wrap(level), args)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record.level(), record.args());
        // 锁中毒时照样输出
        let _guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
