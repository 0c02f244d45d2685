//! # rmksub
//!
//! 基于字典组合生成子域名的工具库。
//!
//! 给定基础域名、字典和层级 L，生成 1..L 层所有 `w1.w2...wk.domain` 组合，
//! 通过有界并发的任务树流式产出，再按轮询方式分发到多个带缓冲的输出文件。
//! 候选集合不会整体驻留内存。
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use rmksub::generate_subdomains;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let domains = vec!["example.com".to_string()];
//!     let words = vec!["dev".to_string(), "api".to_string()];
//!     let results = generate_subdomains(domains, words, 2).await?;
//!
//!     println!("生成 {} 个子域名", results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## 写入文件
//!
//! ```rust,no_run
//! use rmksub::{MksubConfig, MksubEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MksubConfig {
//!         domains: vec!["example.com".to_string()],
//!         wordlist: Some("words.txt".into()),
//!         level: 2,
//!         num_files: 4,
//!         ..Default::default()
//!     };
//!
//!     let engine = MksubEngine::new(config)?;
//!     let summary = engine.run().await?;
//!     println!("写出 {} 个子域名", summary.total_received());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod concurrency;
pub mod config;
pub mod domains;
pub mod error;
pub mod gen;
pub mod input;
pub mod logger;
pub mod output;
pub mod round_robin;
pub mod sink;
pub mod wordlist;

// 重新导出主要的公共API
pub use api::{generate_subdomains, MksubEngine};
pub use config::{GenerationSettings, MksubConfig};
pub use error::{MksubError, Result};
pub use output::RunSummary;

// 导出其他有用的类型
pub use concurrency::{PermitPool, TaskGroup};
pub use gen::{candidate_count, iter_candidates, Generator};
pub use input::OutputFormat;
pub use round_robin::{RoundRobin, RoundRobinSet};
pub use sink::{SinkReport, SinkState, SinkWriter};
pub use wordlist::WordSet;
