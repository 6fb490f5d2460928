use clap::Parser;
use domain_compare::app::{server, service};
use domain_compare::utils::error::ErrorSeverity;
use domain_compare::utils::{logger, validation::Validate};
use domain_compare::{ChromeLauncher, CliConfig};
use std::sync::Arc;

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入 TOML 與命令列設定
    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    // 初始化日誌
    if settings.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting domain-compare service");
    if cli.verbose {
        tracing::debug!("Resolved settings: {:?}", settings);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(e.severity()));
    }

    if settings.monitor {
        tracing::info!("🔍 Resource monitoring enabled");
    }
    if let Some(dir) = &settings.diagnostics_dir {
        tracing::info!("📁 Diagnostics snapshots will be written to {}", dir.display());
    }

    let launcher = ChromeLauncher::new()
        .with_executable(settings.chrome_executable.clone())
        .with_force_headful(settings.headful);
    let comparator = Arc::new(service::build_comparator(&settings, Arc::new(launcher)));

    let addr = settings.socket_addr()?;
    if let Err(e) = server::serve(addr, server::router(comparator.clone()), server::shutdown_signal()).await {
        tracing::error!("❌ Server stopped: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(e.severity()).max(1));
    }

    comparator.monitor().log_final_stats();
    Ok(())
}
