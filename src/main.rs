use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use goshim::config::GoshimConfig;
use goshim::resolve::{resolve_import_path, resolve_target, ResolveError, Target};
use goshim::{generate_for_dir, load_package};
use goshim_reexport::{classify_package, GenerateOptions};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod diagnostic;

#[derive(Parser, Debug)]
#[command(name = "goshim", version, about = "Generate Go packages that re-export another package")]
struct Cli {
    /// Enable verbose debug logging (or set GOSHIM_LOG=debug)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Project configuration file
    #[arg(long, global = true, default_value = "goshim.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a shim for one package
    Generate {
        /// Directory of the package
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Import path of the package; derived from go.mod or GOPATH when omitted
        #[arg(long)]
        pkg: Option<String>,
        /// Output file, or stdout if omitted or `-`
        #[arg(long)]
        out: Option<PathBuf>,
        /// Local name of the original package's import
        #[arg(long)]
        alias: Option<String>,
        /// Package clause of the shim
        #[arg(long)]
        package: Option<String>,
        /// Forward every function through a wrapper
        #[arg(long)]
        wrap_functions: bool,
        /// Omit the generated-code header
        #[arg(long)]
        no_header: bool,
    },
    /// List exported symbols and how each is forwarded
    Inspect {
        /// Directory of the package
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Regenerate the shims listed in the config file
    Update {
        /// Only regenerate the entry with this name
        name: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        diagnostic::report_error(&err);
        process::exit(255);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GOSHIM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Generate {
            dir,
            pkg,
            out,
            alias,
            package,
            wrap_functions,
            no_header,
        } => {
            let config = GoshimConfig::load_or_default(&cli.config)?;
            let mut options = config.defaults.options();
            options.alias = alias.or(options.alias);
            options.package_name = package;
            options.wrap_functions |= wrap_functions;
            options.header &= !no_header;
            let target = resolve_target(dir.as_deref(), pkg.as_deref())?;
            run_generate(&target, out.as_deref(), &options)
        }
        Command::Inspect { dir, json } => run_inspect(&dir, json),
        Command::Update { name } => run_update(&cli.config, name.as_deref()),
    }
}

fn run_generate(
    target: &Target,
    out: Option<&Path>,
    options: &GenerateOptions,
) -> anyhow::Result<()> {
    let code = generate_for_dir(&target.dir, &target.import_path, options)
        .with_context(|| format!("generating shim for {}", target.import_path))?;
    match out.filter(|p| *p != Path::new("-") && !p.as_os_str().is_empty()) {
        Some(path) => write_output(path, &code),
        None => {
            io::stdout()
                .write_all(code.as_bytes())
                .context("writing to stdout")?;
            Ok(())
        }
    }
}

fn write_output(path: &Path, code: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, code).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote shim");
    Ok(())
}

#[derive(Serialize)]
struct SymbolRow {
    name: String,
    kind: &'static str,
    strategy: String,
    signature: String,
}

fn run_inspect(dir: &Path, json: bool) -> anyhow::Result<()> {
    let package = load_package(dir)?;
    let symbols = classify_package(&package, &GenerateOptions::default())?;
    let mut rows: Vec<SymbolRow> = symbols
        .iter()
        .map(|s| SymbolRow {
            name: s.record.name.to_string(),
            kind: s.record.kind.as_str(),
            strategy: s.strategy.to_string(),
            signature: s.record.describe(),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &rows)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let import_path = match resolve_import_path(dir) {
        Ok(path) => path,
        Err(ResolveError::NoGoPath | ResolveError::NotInGoPath | ResolveError::JustGoPath) => {
            "?".to_string()
        }
        Err(err) => return Err(err.into()),
    };
    writeln!(stdout, "package {} ({import_path})", package.name)?;
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in &rows {
        writeln!(
            stdout,
            "  {:width$}  {:<15}  {:<24}  {}",
            row.name, row.kind, row.strategy, row.signature
        )?;
    }
    Ok(())
}

fn run_update(config_path: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let Some(config) = GoshimConfig::load_from_path(config_path)? else {
        bail!("config file {} not found", config_path.display());
    };
    let root = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let entries = config.select(name);
    if entries.is_empty() {
        match name {
            Some(name) => bail!("no shim named `{name}` in {}", config_path.display()),
            None => {
                tracing::warn!(config = %config_path.display(), "no shims configured");
                return Ok(());
            }
        }
    }

    for entry in entries {
        let label = entry.label();
        let dir = entry.dir_in(root);
        let target = resolve_target(dir.as_deref(), entry.pkg.as_deref())
            .with_context(|| format!("shim `{label}`"))?;
        let out = entry.out_in(root);
        let options = entry.options(&config.defaults);
        let code = generate_for_dir(&target.dir, &target.import_path, &options)
            .with_context(|| format!("shim `{label}`"))?;
        write_output(&out, &code)?;
        eprintln!("updated {label} -> {}", out.display());
    }
    Ok(())
}
