use std::path::PathBuf;

use capstan_core::{Error, ParserSettings, Script};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod catalog;

/// Output format for `describe`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "capstan")]
#[command(version)]
#[command(about = "Run entry points through a command line derived from their signatures")]
struct Cli {
    /// Parser settings YAML file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List runnable entry points with their summaries.
    List,
    /// Print the resolved argument schema of an entry point.
    Describe(DescribeArgs),
    /// Parse arguments for an entry point and invoke it.
    #[command(disable_help_flag = true)]
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Entry point name.
    name: String,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Entry point name.
    name: String,
    /// Arguments handed to the entry point's own parser.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = load_settings(cli.config.as_ref()).and_then(|settings| match cli.command {
        Command::List => run_list(&settings),
        Command::Describe(args) => run_describe(args, &settings),
        Command::Run(args) => run_script(args, &settings),
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<ParserSettings, String> {
    match path {
        Some(path) => {
            let settings = ParserSettings::load(path)
                .map_err(|e| format!("Failed to load config {}: {e}", path.display()))?;
            debug!(path = %path.display(), ?settings, "Loaded parser settings");
            Ok(settings)
        }
        None => Ok(ParserSettings::default()),
    }
}

fn script_for(name: &str, settings: &ParserSettings) -> Result<Script, String> {
    let entry = catalog::find(name).ok_or_else(|| format!("No entry point named '{name}'"))?;
    let script = Script::with_settings(entry, settings.clone());
    if !script.is_cli() {
        if let Err(err) = script.specs() {
            return Err(format!("'{name}' cannot be used as a script: {err}"));
        }
        return Err(format!("'{name}' is not marked as a script"));
    }
    Ok(script)
}

fn run_list(settings: &ParserSettings) -> Result<i32, String> {
    let scripts: Vec<Script> = catalog::entries()
        .into_iter()
        .map(|entry| Script::with_settings(entry, settings.clone()))
        .filter(Script::is_cli)
        .collect();

    let width = scripts.iter().map(|s| s.name().len()).max().unwrap_or(0);
    for script in &scripts {
        println!("{:width$}  {}", script.name(), script.summary());
    }
    Ok(0)
}

fn run_describe(args: DescribeArgs, settings: &ParserSettings) -> Result<i32, String> {
    let script = script_for(&args.name, settings)?;
    let schema = script.schema().map_err(|e| e.to_string())?;

    match args.format {
        CliOutputFormat::Json => {
            let json = serde_json::to_string_pretty(&schema)
                .map_err(|e| format!("Failed to serialize schema: {e}"))?;
            println!("{json}");
        }
        CliOutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&schema)
                .map_err(|e| format!("Failed to serialize schema: {e}"))?;
            print!("{yaml}");
        }
    }
    Ok(0)
}

fn run_script(args: RunArgs, settings: &ParserSettings) -> Result<i32, String> {
    let script = script_for(&args.name, settings)?;

    match script.run(&args.args) {
        Ok(code) => Ok(code),
        Err(Error::Usage(usage)) => {
            usage
                .print()
                .map_err(|e| format!("Failed to write usage: {e}"))?;
            Ok(usage.exit_code())
        }
        Err(err) => Err(err.to_string()),
    }
}
