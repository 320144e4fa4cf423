//! Command-line interface for chromesync.
//!
//! Every subcommand works on one config file, resolved from `--config`, then
//! `CHROMESYNC_CONFIG`, then the platform config directory. `check`, `show`
//! and `browsers` only read; the other commands go through
//! [`ConfigStore`], which creates, backs up and rewrites the file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chromesync_config::{
    Config, ConfigError, ConfigLoader, ConfigStore, ConfigWatcher, DocumentFormat, Environment,
    InvalidFieldPolicy, LoadOptions, LogLevel, Loaded, Opened, PlaceholderScope,
    ProcessEnvironment, defaults,
};
use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::{self, LogSettings};

/// chromesync - manage the ChromeSync configuration file
#[derive(Parser, Debug)]
#[command(name = "chromesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reject fields that are not part of the config schema
    #[arg(long, global = true)]
    pub strict: bool,

    /// Replace invalid fields with their defaults instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Let %NAME% placeholders read any environment variable
    #[arg(long, global = true)]
    pub allow_all_env: bool,

    /// Override logs.level (DEBUG, INFO, WARN, ERROR)
    #[arg(long, global = true, value_name = "LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate the config file
    Check,
    /// Print the resolved config
    Show {
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,
    },
    /// Print the config file path
    Path,
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Restore the default config
    Reset,
    /// Write the current config to another file
    Export {
        path: PathBuf,
        /// Keep password sync enabled in the exported file
        #[arg(long)]
        include_sensitive: bool,
    },
    /// Replace the config with a validated copy of another file
    Import { path: PathBuf },
    /// Check that browser executables and profile directories exist
    Browsers,
    /// Reload the config whenever the file changes
    Watch {
        #[arg(long, default_value_t = 500, value_name = "MS")]
        debounce_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Yaml,
    Toml,
}

impl From<FormatArg> for DocumentFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => DocumentFormat::Json,
            FormatArg::Yaml => DocumentFormat::Yaml,
            FormatArg::Toml => DocumentFormat::Toml,
        }
    }
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    s.to_ascii_uppercase().parse().map_err(|e| format!("{e}"))
}

/// Whether `run` installs the file logger once a config is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logging {
    Install,
    Disabled,
}

/// Parse process arguments, run the selected subcommand and return the
/// process exit code.
pub fn process_cli() -> i32 {
    let cli = Cli::parse();
    let mut out = io::stdout().lock();
    match run(&cli, ProcessEnvironment, &mut out, Logging::Install) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("chromesync: error: {e:#}");
            1
        }
    }
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict: self.strict,
            invalid_fields: if self.lenient {
                InvalidFieldPolicy::UseDefault
            } else {
                InvalidFieldPolicy::Reject
            },
            placeholders: if self.allow_all_env {
                PlaceholderScope::Any
            } else {
                PlaceholderScope::Allowlisted
            },
        }
    }

    pub fn config_path(&self, env: &dyn Environment) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| defaults::config_file(env))
    }
}

/// Run `cli` against `env`, writing command output to `out`.
///
/// Returns the process exit code. Errors are returned for failures the
/// command cannot report on its own (I/O, a broken template).
pub fn run<E, W>(cli: &Cli, env: E, out: &mut W, logging: Logging) -> Result<i32>
where
    E: Environment,
    W: Write,
{
    let path = cli.config_path(&env);
    let loader = ConfigLoader::with_environment(env).with_options(cli.load_options());

    match &cli.command {
        Commands::Path => {
            writeln!(out, "{}", path.display())?;
            Ok(0)
        }
        Commands::Check => {
            let Some(loaded) = load_read_only(&loader, &path, out)? else {
                return Ok(1);
            };
            init_logging(cli, &loaded.config, logging);
            for warning in &loaded.warnings {
                writeln!(out, "warning: {warning} (default used)")?;
            }
            writeln!(out, "OK: {}", path.display())?;
            Ok(0)
        }
        Commands::Show { format } => {
            let Some(loaded) = load_read_only(&loader, &path, out)? else {
                return Ok(1);
            };
            let text = DocumentFormat::from(*format).render(&loaded.config)?;
            write!(out, "{text}")?;
            Ok(0)
        }
        Commands::Browsers => {
            let Some(loaded) = load_read_only(&loader, &path, out)? else {
                return Ok(1);
            };
            init_logging(cli, &loaded.config, logging);
            Ok(report_browsers(&loaded.config, out)?)
        }
        Commands::Init { force } => {
            if path.exists() && !force {
                writeln!(
                    out,
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )?;
                return Ok(1);
            }
            let existed = path.exists();
            let store = open_store(&path, loader, out)?;
            if existed {
                store.reset()?;
            }
            writeln!(out, "Wrote default config to {}", path.display())?;
            Ok(0)
        }
        Commands::Reset => {
            let store = open_store(&path, loader, out)?;
            init_logging(cli, &store.current(), logging);
            store.reset()?;
            writeln!(out, "Config reset to defaults: {}", path.display())?;
            Ok(0)
        }
        Commands::Export {
            path: target,
            include_sensitive,
        } => {
            let store = open_store(&path, loader, out)?;
            init_logging(cli, &store.current(), logging);
            store.export(target, *include_sensitive)?;
            writeln!(out, "Exported config to {}", target.display())?;
            Ok(0)
        }
        Commands::Import { path: source } => {
            let store = open_store(&path, loader, out)?;
            init_logging(cli, &store.current(), logging);
            match store.import(source) {
                Ok(_) => {
                    writeln!(out, "Imported config from {}", source.display())?;
                    Ok(0)
                }
                Err(e) if e.is_document_error() => {
                    write_config_error(out, source, &e)?;
                    Ok(1)
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Watch { debounce_ms } => {
            let store = open_store(&path, loader, out)?;
            init_logging(cli, &store.current(), logging);
            watch(&store, Duration::from_millis(*debounce_ms), out)
        }
    }
}

/// Load without touching the file. A missing file means the template alone.
fn load_read_only<E: Environment>(
    loader: &ConfigLoader<E>,
    path: &Path,
    out: &mut impl Write,
) -> Result<Option<Loaded>> {
    let result = if path.exists() {
        loader.load_file(path)
    } else {
        writeln!(out, "note: {} does not exist; using defaults", path.display())?;
        loader.load_defaults()
    };

    match result {
        Ok(loaded) => Ok(Some(loaded)),
        Err(e) if e.is_document_error() => {
            write_config_error(out, path, &e)?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn open_store<E: Environment>(
    path: &Path,
    loader: ConfigLoader<E>,
    out: &mut impl Write,
) -> Result<ConfigStore<E>> {
    let store = ConfigStore::open(path, loader)
        .with_context(|| format!("Failed to open config file {}", path.display()))?;
    match store.opened() {
        Opened::Recovered { backup, error } => {
            writeln!(out, "warning: {} was invalid: {error}", path.display())?;
            writeln!(out, "warning: previous file saved as {}", backup.display())?;
        }
        Opened::Loaded { warnings } => {
            for warning in warnings {
                writeln!(out, "warning: {warning} (default used)")?;
            }
        }
        Opened::Created => {}
    }
    Ok(store)
}

fn write_config_error(out: &mut impl Write, path: &Path, error: &ConfigError) -> io::Result<()> {
    let fields = error.field_errors();
    if fields.is_empty() {
        return writeln!(out, "error: {}: {error}", path.display());
    }
    writeln!(out, "error: {} has {} invalid field(s):", path.display(), fields.len())?;
    for field in fields {
        writeln!(out, "  {field}")?;
    }
    Ok(())
}

fn report_browsers(config: &Config, out: &mut impl Write) -> io::Result<i32> {
    if config.browsers.is_empty() {
        writeln!(out, "No browsers configured")?;
        return Ok(1);
    }

    let problems = config.check_browser_paths();
    for (name, browser) in &config.browsers {
        let status = if problems.iter().any(|p| &p.browser == name) {
            "FAIL"
        } else {
            "ok"
        };
        writeln!(
            out,
            "{name}: {status} ({}, profile {})",
            browser.path.display(),
            browser.profile_dir().display()
        )?;
    }
    for problem in &problems {
        writeln!(out, "  {problem}")?;
    }
    Ok(if problems.is_empty() { 0 } else { 1 })
}

fn watch<E: Environment>(store: &ConfigStore<E>, debounce: Duration, out: &mut impl Write) -> Result<i32> {
    let watcher = ConfigWatcher::new(store.path(), debounce)?;
    writeln!(out, "Watching {} (Ctrl+C to stop)", watcher.path().display())?;
    out.flush()?;

    loop {
        let Some(event) = watcher.recv_timeout(Duration::from_secs(1)) else {
            continue;
        };
        match store.reload() {
            Ok(warnings) => {
                writeln!(out, "Reloaded {}", event.path.display())?;
                for warning in warnings {
                    writeln!(out, "warning: {warning} (default used)")?;
                }
            }
            Err(e) => write_config_error(out, &event.path, &e)?,
        }
        out.flush()?;
    }
}

fn init_logging(cli: &Cli, config: &Config, logging: Logging) {
    if logging == Logging::Disabled {
        return;
    }
    let mut settings = LogSettings::from_config(&config.logs, &config.security);
    if let Some(level) = cli.log_level {
        settings.level = level.to_level_filter();
    }
    settings.mirror_stderr = std::env::var_os("RUST_LOG").is_some();

    match logging::init(settings) {
        Ok(path) => log::debug!("Logging to {:?}", path),
        Err(e) => eprintln!("chromesync: warning: file logging disabled: {e:#}"),
    }
}
