use clap::Parser;

mod cli;
mod runner;
mod view;

#[tokio::main]
async fn main() {
    // 1. 初始化日志（这是入口点的职责）
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = cli::Cli::parse();

    // 2. 调用面板逻辑
    if let Err(e) = runner::run(cli).await {
        // 3. 处理顶层错误
        tracing::error!("❌ Panel command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
