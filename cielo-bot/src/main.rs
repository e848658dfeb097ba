use cielo_bot::{config, logging, runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Missing or incomplete configuration is fatal: exit before any run work.
    let config = match config::read_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: incomplete configuration ({e:#})");
            std::process::exit(1);
        }
    };

    let _logging_guard = logging::init_logging("logs", "cielo-bot", &config.log_level);

    tracing::info!("cielo-bot starting...");

    runner::run_once(config).await?;

    Ok(())
}
