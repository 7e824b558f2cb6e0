use clap::Parser;
use triad_loader::utils::{logger, validation::Validate};
use triad_loader::{CliConfig, ConfigProvider, LoaderEngine, SessionState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting triad-loader");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 合併並驗證配置
    let config = match cli.into_loader_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 Memory monitoring enabled");
    }

    let engine = LoaderEngine::new_with_monitoring(config, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            let report = outcome.report;
            tracing::info!(
                "Session ended: {:?} ({} bytes, {:.1}%)",
                report.state,
                report.bytes_seen,
                report.percent
            );

            if let Some(manifest) = &outcome.manifest {
                println!("📁 Staged {} files", manifest.files.len());
                for file in &manifest.files {
                    println!("   {} ({} bytes)", file.name, file.bytes);
                }
            }

            // 依會話狀態決定退出碼
            let exit_code = match report.state {
                SessionState::HandedOff => 0,
                SessionState::Errored => 1,
                SessionState::Complete | SessionState::Loading => 2,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Loader failed: {} (Category: {:?})",
                e,
                e.category()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    }

    Ok(())
}
