use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

// Import from normcontrol-core
use normcontrol_core::{
    AuditOutcome, AuditProcessor, ConfigManager, DocumentCodeCatalog, ReportFormat, ReportSnapshot,
};

// Import CLI utilities
use normcontrol::config_locator;

#[derive(Parser)]
#[command(name = "normcontrol")]
#[command(about = "Audit engineering drawing page models against drafting-standard rules")]
struct Args {
    /// Path to the page-model file (JSON or YAML) written by the extractor
    #[arg(short, long)]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Config profile to audit with: default, strict, lenient, or a loaded one
    #[arg(short = 'p', long)]
    profile_name: Option<String>,

    /// YAML map of extra document type codes to names
    #[arg(long)]
    catalog: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format: json, yaml, or text
    #[arg(short = 'f', long, default_value = "json")]
    format: String,

    /// Wrap the report in a snapshot envelope (id, timestamp, fingerprints)
    #[arg(long)]
    snapshot: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Skip cache and force a fresh audit
    #[arg(long)]
    skip_cache: bool,

    /// Report cache directory (default: the user cache directory)
    #[arg(long)]
    cache_dir: Option<String>,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    println!("📐 Normcontrol Drawing Audit");

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Audit failed: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("normcontrol_core=debug,normcontrol=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("normcontrol_core=info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut manager = ConfigManager::new();

    // Load config: --config, else the user config file, else built-in profiles
    let loaded_profile = match config_locator::resolve_config_path(args.config.as_deref()) {
        Some(source) => {
            let name = config_locator::load_config(&mut manager, &source)?;
            if let Some(name) = &name {
                println!("📋 Loaded config '{}' from: {}", name, source.path().display());
            }
            name
        }
        None => None,
    };

    if args.show_configs {
        show_help(&manager);
        return Ok(ExitCode::SUCCESS);
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("--input <path> is required"))?;
    if !Path::new(input).exists() {
        println!("⚠️  Input page-model file not found at: {input}");
        println!("   Please check the file path.");
        return Ok(ExitCode::from(1));
    }

    let format: ReportFormat = args.format.parse()?;

    let profile_name = args
        .profile_name
        .clone()
        .or(loaded_profile)
        .unwrap_or_else(|| "default".to_string());
    let config = manager.get_config(&profile_name).clone();
    println!("📋 Using profile: {}", config.profile);

    let catalog = match &args.catalog {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)?;
            let catalog = DocumentCodeCatalog::builtin().extended_with_yaml(&yaml)?;
            println!("📚 Catalog extended from {} ({} codes)", path, catalog.len());
            catalog
        }
        None => DocumentCodeCatalog::builtin(),
    };

    let cache_dir = config_locator::resolve_cache_dir(args.cache_dir.as_deref())?;
    debug!("Report cache directory: {}", cache_dir.display());
    let processor = AuditProcessor::new_with_cache(
        config,
        Arc::new(catalog),
        &cache_dir.to_string_lossy(),
    )?;

    println!("📄 Auditing: {input}");
    let outcome = processor.audit_file(Path::new(input), args.profile, args.skip_cache)?;
    print_summary(&outcome);

    let output_path = match &args.output {
        Some(output) => PathBuf::from(output),
        None => config_locator::default_output_path(Path::new(input), extension(format)),
    };
    save_report(&outcome, &output_path, format, args.snapshot)?;

    Ok(if outcome.report.is_compliant {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn print_summary(outcome: &AuditOutcome) {
    let report = &outcome.report;
    if outcome.cached {
        println!("🎯 Report served from cache");
    }
    println!("📊 Audit results:");
    println!("   - Violations: {}", report.statistics.total_violations);
    println!("   - High: {}", report.statistics.high_severity);
    println!("   - Medium: {}", report.statistics.medium_severity);
    println!("   - Low: {}", report.statistics.low_severity);
    if report.is_compliant {
        println!("✅ Drawing complies with the checked rules");
    } else {
        println!("⚠️  Drawing does not comply");
    }
}

fn extension(format: ReportFormat) -> &'static str {
    match format {
        ReportFormat::Json => "json",
        ReportFormat::Yaml => "yaml",
        ReportFormat::Text => "txt",
    }
}

fn save_report(outcome: &AuditOutcome, output_path: &Path, format: ReportFormat, snapshot: bool) -> Result<()> {
    let path = output_path.to_string_lossy();
    if snapshot {
        let snapshot = ReportSnapshot::new(outcome.report.clone(), outcome.fingerprints.clone());
        std::fs::write(output_path, snapshot.render(format)?)?;
        println!("💾 Snapshot {} saved to: {}", snapshot.id, path);
    } else {
        std::fs::write(output_path, outcome.report.render(format)?)?;
        println!("💾 Report saved to: {path}");
    }
    Ok(())
}

fn show_help(manager: &ConfigManager) {
    println!("\n📋 Available Configuration Options:");
    println!("  --input <path>          Page-model file to audit (JSON or YAML)");
    println!("  --config <path>         Load custom config file");
    println!("  --profile-name <name>   Config profile to use");
    println!("  --catalog <path>        Extra document type codes (YAML map)");
    println!("  --output <path>         Output file path (auto-generated if not specified)");
    println!("  --format <fmt>          Output format: json, yaml, or text");
    println!("  --snapshot              Wrap the report with id, timestamp and fingerprints");
    println!("  --cache-dir <dir>       Report cache directory");

    println!("\n🗂️  Profiles:");
    for name in manager.profile_names() {
        let config = manager.get_config(name);
        let rules: Vec<&str> = config.pipeline.enabled_rules().collect();
        println!("  {:<10} {}", name, rules.join(", "));
    }

    if let Some(path) = config_locator::user_config_path() {
        println!("\n📁 User config file: {}", path.display());
    }

    println!("\n📝 Usage Examples:");
    println!("  normcontrol -i pages.json");
    println!("  normcontrol -i pages.json -p strict -f text -o report.txt");
    println!("  normcontrol -i pages.yaml -c config.yaml --snapshot");

    println!("\n🚦 Exit codes: 0 compliant, 2 violations found, 1 failure");
}
