use std::process;

use clap::Parser;
use log::{error, info};

use rmksub::api::MksubEngine;
use rmksub::error::Result;
use rmksub::input::{usage_exit_code, Opts};
use rmksub::logger;
use rmksub::output::{export_summary, summary_to_txt};

#[tokio::main]
async fn main() {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let code = usage_exit_code(e.kind());
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = logger::init_logger(opts.log_level) {
        eprintln!("{}", e);
        process::exit(1);
    }

    // 中断时直接退出，不保证缓冲区内容落盘
    tokio::spawn(async {
        wait_for_interrupt().await;
        eprintln!("程序被中断，正在退出...");
        process::exit(130);
    });

    if let Err(e) = run(opts).await {
        if e.is_config_error() {
            error!("配置错误: {}", e);
        } else {
            error!("{}", e);
        }
        process::exit(1);
    }
}

async fn run(opts: Opts) -> Result<()> {
    let engine = MksubEngine::new(opts.to_config())?;
    let summary = engine.run().await?;

    if opts.summary {
        info!("运行汇总:\n{}", summary_to_txt(&summary));
    }
    if let Some(path) = &opts.summary_file {
        export_summary(&summary, path, opts.summary_format)?;
        info!("汇总已导出到: {}", path.display());
    }

    summary.check()
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    let _ = tokio::signal::ctrl_c().await;
}

