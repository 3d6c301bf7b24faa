//! epub-translator 命令行入口

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use epub_translator::core::{translate_document, DocumentRequest, DEFAULT_OUTPUT_PATH};
use epub_translator::env::{core::LogLevel, generate_env_docs, storage::UseCache, EnvVar};
use epub_translator::epub::load_document;
use epub_translator::parsers::StructureProcessor;
use epub_translator::translation::error::helpers::log_error;
use epub_translator::translation::{
    estimate_cost, ConfigManager, OpenRouterClient, RedbCache, TranslationError,
    TranslationResult, TranslationService,
};

/// 参考价格场景（美元/百万token）
const COST_SCENARIOS: &[(&str, f64)] = &[("economy", 0.10), ("standard", 0.60), ("premium", 5.0)];

#[derive(Debug, Parser)]
#[command(name = "epub-translator", version, about = "Translate EPUB/HTML documents while preserving their markup")]
struct Cli {
    /// Input document (.epub, .html, .xhtml)
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Target language key
    #[arg(short = 'l', long = "lang", default_value = "spanish")]
    language: String,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Skip cache lookups (new translations are still stored)
    #[arg(long)]
    no_cache: bool,

    /// Translate only the first N fragments
    #[arg(long)]
    limit: Option<usize>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail when translated fragments and placeholders do not line up
    #[arg(long)]
    strict: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_docs: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log_error(&error);
            eprintln!("错误: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LogLevel::get_or_default("info".to_string())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> TranslationResult<()> {
    if cli.env_docs {
        print!("{}", generate_env_docs());
        return Ok(());
    }

    if let Some(path) = &cli.init_config {
        ConfigManager::generate_example_config(path)?;
        println!("已生成示例配置: {}", path.display());
        return Ok(());
    }

    let Some(input) = &cli.input else {
        return Err(TranslationError::Config("缺少输入文件".to_string()));
    };

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::load()?,
    };
    if let Some(source) = manager.source() {
        tracing::info!("使用配置文件: {}", source.display());
    }

    let mut config = manager.into_config();
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if cli.strict {
        config.strict_rebuild = true;
    }
    config.validate()?;

    let markup = load_document(input)?;
    tracing::info!("已加载 {} ({} 字节)", input.display(), markup.len());

    let processor = StructureProcessor::new(&config)?;

    let mut client = OpenRouterClient::new(&config)?;
    client.fetch_model_prices();
    let cache = RedbCache::open(&config.database_path)?;
    let mut service = TranslationService::new(client, cache);

    let document_id = input.to_string_lossy();
    let request = DocumentRequest {
        document_id: &document_id,
        target_language: &cli.language,
        use_cache: !cli.no_cache && UseCache::get_or_default(true),
        limit: cli.limit,
    };

    let outcome = translate_document(&markup, &request, &processor, &mut service)?;

    for (name, price) in COST_SCENARIOS {
        tracing::info!(
            "预估费用 ({}, ${}/1M): ${:.4}",
            name,
            price,
            estimate_cost(outcome.estimated_tokens, *price)
        );
    }

    fs::write(&cli.output, &outcome.html)?;
    tracing::info!("已写入 {}", cli.output.display());

    let usage = service.client().usage();
    tracing::info!("==============================");
    tracing::info!("用量汇总");
    tracing::info!("总token: {}", usage.total_tokens);
    tracing::info!("费用: ${:.6}", usage.total_cost_usd);
    tracing::info!("==============================");

    Ok(())
}
