use clap::Parser;
use req2dom::app::{build_models, build_pipeline};
use req2dom::config::toml_config::TomlConfig;
use req2dom::utils::error::{ErrorSeverity, Req2DomError};
use req2dom::utils::{logger, validation::Validate};
use req2dom::{CliConfig, GenerationEngine, GenerationResponse, LocalStorage};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 載入 TOML 配置並套用命令列覆蓋
    let config = match args.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load config file '{}': {}",
                args.config.as_deref().unwrap_or("-"),
                e
            );
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let json_logs = config
        .monitoring
        .as_ref()
        .and_then(|m| m.log_format.as_deref())
        .is_some_and(|format| format.eq_ignore_ascii_case("json"));
    if json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting req2dom");
    if let Some(path) = &args.config {
        tracing::info!("📁 Configuration loaded from: {}", path);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No generation will occur");
        display_config_summary(&config, &args);
        return Ok(());
    }
    if !args.json && !args.stdout {
        display_config_summary(&config, &args);
    }

    let text = match read_input(&args.input).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("❌ Failed to read requirements from '{}': {}", args.input, e);
            std::process::exit(3);
        }
    };

    let pipeline = match build_models(&config).and_then(|models| build_pipeline(&config, models)) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(&e, args.json),
    };

    // 只輸出文件內容，不寫檔
    if args.stdout {
        match pipeline.run(&text).await {
            Ok(output) => {
                for warning in &output.warnings {
                    eprintln!("⚠️ {}", warning);
                }
                println!("{}", output.document.content);
                return Ok(());
            }
            Err(e) => fail(&e, args.json),
        }
    }

    let storage = LocalStorage::new(config.output.path.clone());
    let engine = GenerationEngine::new(pipeline, storage, config.output.filename.clone());

    match engine.run(&text).await {
        Ok(report) => {
            tracing::info!("✅ Generation completed successfully!");
            if args.json {
                let response = GenerationResponse::success(&report.output)
                    .with_output_path(report.output_path.clone())
                    .without_document();
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                let stats = report.output.model.stats();
                for warning in &report.output.warnings {
                    println!("⚠️ {}", warning);
                }
                println!("✅ Generation completed successfully!");
                println!(
                    "📊 {} classes, {} attributes, {} relationships from {} requirements ({:?})",
                    stats.classes,
                    stats.attributes,
                    stats.relationships,
                    report.output.units.len(),
                    report.output.produced_by
                );
                println!("📁 Output saved to: {}", report.output_path);
            }
        }
        Err(e) => fail(&e, args.json),
    }

    Ok(())
}

async fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(input).await
    }
}

/// Reports the error and exits with a code matching its severity.
fn fail(e: &Req2DomError, json: bool) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Generation failed: {} (Stage: {}, Severity: {:?})",
        e,
        e.stage().map(|s| s.as_str()).unwrap_or("-"),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    if json {
        let response = GenerationResponse::failure(e);
        match serde_json::to_string_pretty(&response) {
            Ok(body) => println!("{}", body),
            Err(_) => eprintln!("❌ {}", e.user_friendly_message()),
        }
    } else {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());
    }

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,      // 輸入問題，但流程正常結束
        ErrorSeverity::Medium => 2,   // 可重試錯誤
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    };
    std::process::exit(exit_code);
}

fn display_config_summary(config: &TomlConfig, args: &CliConfig) {
    println!("📋 Configuration Summary:");
    println!("  Strategy: {}", config.pipeline.strategy);
    println!("  Language: {}", config.pipeline.language);
    if config.pipeline.strategy != "grammar" || config.hybrid.structural == "generative" {
        println!("  Provider: {}", config.generative.provider);
        if let Ok(endpoint) = config.endpoint() {
            println!("  Endpoint: {}", endpoint);
        }
        if let Ok(model) = config.model() {
            println!("  Model: {}", model);
        }
        if let Ok(timeout) = config.timeout_seconds() {
            println!("  Timeout: {}s", timeout);
        }
        println!(
            "  Batching: {} units / {} chars per request",
            config.generative.max_units_per_request, config.generative.max_chars_per_request
        );
    }
    if config.pipeline.strategy == "hybrid" {
        println!("  Structural Stage: {}", config.hybrid.structural);
    }
    println!("  Input: {}", if args.input == "-" { "stdin" } else { args.input.as_str() });
    println!(
        "  Output: {}/{}",
        config.output.path,
        config.output_file().unwrap_or_else(|_| config.output.filename.clone())
    );
    println!("  Layout: up to {} columns", config.layout.max_columns);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
