use anyhow::{anyhow, bail, Context, Error, Result};
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use son::{Son, SonConfig, Tag, Value, Visit};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "son")]
#[command(about = "Inspect, export and edit SON documents")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// JSON configuration file (stack_size, json_indent)
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    /// Maximum container depth, overrides the configuration file
    #[clap(long, global = true)]
    stack_size: Option<usize>,
}

/// How a value is read from or written to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ValueKind {
    Str,
    Num,
    Unum,
    Float,
    Bool,
    Data,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export a document as JSON
    Json {
        /// The SON file to export
        file: PathBuf,
        /// Write to this file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
        /// Spaces per nesting level; 0 prints compact JSON
        #[clap(long)]
        indent: Option<usize>,
    },
    /// Read the value at an access path, e.g. `stuff.hour` or `list[2]`
    Get {
        file: PathBuf,
        path: String,
        /// Conversion applied to the stored value; data is printed as Base64
        #[clap(long = "as", value_enum, default_value = "str")]
        kind: ValueKind,
    },
    /// Print the record tree with types and payload sizes
    Tree {
        file: PathBuf,
    },
    /// Overwrite a value in place without changing the file size
    Set {
        file: PathBuf,
        path: String,
        /// New value; data is given as Base64
        value: String,
        /// Defaults to the type of the stored record
        #[clap(long = "as", value_enum)]
        kind: Option<ValueKind>,
    },
    /// Prints the effective configuration
    Config,
    /// Prints the version of the son binary
    Version,
}

pub fn run() -> Result<()> {
    son::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    son::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // RUST_LOG may already be set from SON_LOG; CLI flags take precedence.
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let config = load_config(cmd.config.as_deref(), cmd.stack_size)?;
    debug!("using {:?}", config);

    match cmd.command {
        Commands::Json {
            file,
            output,
            indent,
        } => {
            let mut config = config;
            if let Some(indent) = indent {
                config.json_indent = indent;
            }
            let mut son = open(&file, &config)?;
            match output {
                Some(out) => {
                    son.to_json_file(&out)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    info!("exported {} to {}", file.display(), out.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut lock = stdout.lock();
                    son.to_json(&mut lock)?;
                    lock.flush()?;
                }
            }
            son.close(false)?;
        }
        Commands::Get { file, path, kind } => {
            let mut son = open(&file, &config)?;
            let text = get_value(&mut son, &path, kind)?;
            son.close(false)?;
            println!("{}", text);
        }
        Commands::Tree { file } => {
            let mut son = open(&file, &config)?;
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            print_tree(&mut son, &mut lock)?;
            son.close(false)?;
        }
        Commands::Set {
            file,
            path,
            value,
            kind,
        } => {
            let mut son = Son::with_config(&config);
            son.edit_file(&file)
                .with_context(|| format!("failed to open {} for editing", file.display()))?;
            let result = set_value(&mut son, &path, &value, kind);
            son.close(false)?;
            result?;
            info!("set {} in {}", path, file.display());
        }
        Commands::Config => config.print(),
        Commands::Version => {
            println!("son {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}

fn load_config(file: Option<&Path>, stack_size: Option<usize>) -> Result<SonConfig> {
    let mut config = match file {
        Some(path) => SonConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SonConfig::default(),
    };
    if let Some(size) = stack_size {
        if size == 0 {
            bail!("--stack-size must be at least 1");
        }
        config.stack_size = size;
    }
    Ok(config)
}

fn open(file: &Path, config: &SonConfig) -> Result<Son<File>> {
    let mut son = Son::with_config(config);
    son.open_file(file)
        .with_context(|| format!("failed to open {}", file.display()))?;
    Ok(son)
}

fn not_found(path: &str, err: son::SonError) -> Error {
    if err.is_not_found() {
        anyhow!("no record at '{}'", path)
    } else {
        Error::from(err)
    }
}

fn get_value(son: &mut Son<File>, path: &str, kind: ValueKind) -> Result<String> {
    let text = match kind {
        ValueKind::Str => son.read_str(path).map_err(|e| not_found(path, e))?,
        ValueKind::Num => son.read_num(path).map_err(|e| not_found(path, e))?.to_string(),
        ValueKind::Unum => son
            .read_unum(path)
            .map_err(|e| not_found(path, e))?
            .to_string(),
        ValueKind::Float => son
            .read_float(path)
            .map_err(|e| not_found(path, e))?
            .to_string(),
        ValueKind::Bool => match son.read(path).map_err(|e| not_found(path, e))? {
            Value::Bool(b) => b.to_string(),
            other => bail!("'{}' holds {}, not a boolean", path, kind_name(&other)),
        },
        ValueKind::Data => {
            let value = son.read(path).map_err(|e| not_found(path, e))?;
            base64::engine::general_purpose::STANDARD.encode(value.to_bytes())
        }
    };
    Ok(text)
}

fn kind_for_tag(tag: Tag) -> Option<ValueKind> {
    match tag {
        Tag::Str => Some(ValueKind::Str),
        Tag::Num => Some(ValueKind::Num),
        Tag::Unum => Some(ValueKind::Unum),
        Tag::Float => Some(ValueKind::Float),
        Tag::True | Tag::False => Some(ValueKind::Bool),
        Tag::Data => Some(ValueKind::Data),
        Tag::Obj | Tag::Array | Tag::Null => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Obj { .. } => "an object",
        Value::Array { .. } => "an array",
        Value::Data(_) => "data",
        Value::Str(_) => "a string",
        Value::Num(_) => "a signed number",
        Value::Unum(_) => "an unsigned number",
        Value::Float(_) => "a float",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
    }
}

fn set_value(son: &mut Son<File>, path: &str, raw: &str, kind: Option<ValueKind>) -> Result<()> {
    let kind = match kind {
        Some(kind) => kind,
        None => {
            let entry = son.locate(path).map_err(|e| not_found(path, e))?;
            kind_for_tag(entry.tag()).ok_or_else(|| {
                anyhow!("cannot edit {} record at '{}'", entry.tag().name(), path)
            })?
        }
    };
    debug!("editing '{}' as {:?}", path, kind);
    match kind {
        ValueKind::Str => son.edit_str(path, raw)?,
        ValueKind::Num => son.edit_num(path, raw.parse().context("expected a signed number")?)?,
        ValueKind::Unum => {
            son.edit_unum(path, raw.parse().context("expected an unsigned number")?)?
        }
        ValueKind::Float => son.edit_float(path, raw.parse().context("expected a float")?)?,
        ValueKind::Bool => son.edit_bool(path, raw.parse().context("expected true or false")?)?,
        ValueKind::Data => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(raw)
                .context("expected Base64 data")?;
            son.edit_data(path, &bytes)?
        }
    }
    Ok(())
}

fn print_tree<W: Write>(son: &mut Son<File>, out: &mut W) -> Result<()> {
    son.walk(|visit| {
        let line = match visit {
            Visit::Enter(entry, value) => {
                let count = match value {
                    Value::Obj { count } => *count,
                    Value::Array { count, .. } => *count,
                    _ => 0,
                };
                let open = if entry.header.is_open() { " (open)" } else { "" };
                Some(format!(
                    "{:indent$}{} <{}> {} children{}",
                    "",
                    label(&entry.key().to_string()),
                    entry.tag().name(),
                    count,
                    open,
                    indent = entry.depth * 2
                ))
            }
            Visit::Leaf(entry, value) => Some(format!(
                "{:indent$}{} <{}> {} bytes = {}",
                "",
                label(&entry.key().to_string()),
                entry.tag().name(),
                entry.payload_len,
                value.to_text(),
                indent = entry.depth * 2
            )),
            Visit::Exit(_) => None,
        };
        if let Some(line) = line {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}

fn label(key: &str) -> &str {
    if key.is_empty() {
        "-"
    } else {
        key
    }
}
