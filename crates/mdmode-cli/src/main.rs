use anyhow::{Context, Result, bail};
use mdmode_config::Config;
use mdmode_engine::HighlightedDocument;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, process};

const USAGE: &str = "Usage: mdmode [--config PATH] [--formatting] FILE\n       mdmode [--config PATH] --init-config";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config_path: Option<PathBuf>,
    formatting: bool,
    /// Write a default config file instead of tokenizing.
    init_config: bool,
    file: Option<PathBuf>,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut config_path = None;
        let mut formatting = false;
        let mut init_config = false;
        let mut file = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let Some(path) = args.next() else {
                        bail!("--config needs a path");
                    };
                    config_path = Some(PathBuf::from(path));
                }
                "--formatting" => formatting = true,
                "--init-config" => init_config = true,
                flag if flag.starts_with("--") => bail!("Unknown option {flag}"),
                _ if file.is_some() => bail!("Only one file can be tokenized at a time"),
                _ => file = Some(PathBuf::from(arg)),
            }
        }

        if file.is_none() && !init_config {
            bail!("No file given");
        }
        Ok(Self {
            config_path,
            formatting,
            init_config,
            file,
        })
    }

    /// The `--config` path with `~` and variables expanded.
    fn explicit_config_path(&self) -> Option<PathBuf> {
        self.config_path
            .as_ref()
            .map(|path| Config::expand_path(path).unwrap_or_else(|| path.clone()))
    }
}

/// One output line per token: `line:start-end<TAB>style<TAB>text`.
///
/// Lines are numbered from 1 and offsets are bytes within the line.
fn render(doc: &HighlightedDocument) -> String {
    let mut out = String::new();
    for (idx, line) in doc.lines().iter().enumerate() {
        for token in &line.tokens {
            let _ = writeln!(
                out,
                "{}:{}-{}\t{}\t{}",
                idx + 1,
                token.start,
                token.end,
                token.style.as_deref().unwrap_or("-"),
                token.text(&line.text)
            );
        }
    }
    out
}

fn load_config(args: &Args) -> Result<Config> {
    let Some(config_path) = args.explicit_config_path() else {
        log::info!("Config path: {}", Config::config_path().display());
        return Ok(Config::load()?.unwrap_or_default());
    };
    log::info!("Config path: {}", config_path.display());

    match Config::load_from_path(&config_path)? {
        Some(config) => Ok(config),
        None => bail!("Config file {} does not exist", config_path.display()),
    }
}

/// Writes the default config and returns where it went. An existing file is left alone.
fn init_config(args: &Args) -> Result<PathBuf> {
    let explicit = args.explicit_config_path();
    let config_path = explicit.clone().unwrap_or_else(Config::config_path);
    if config_path.exists() {
        bail!("Config file {} already exists", config_path.display());
    }

    let config = Config::default();
    match explicit {
        Some(path) => config.save_to_path(&path)?,
        None => config.save()?,
    }
    Ok(config_path)
}

fn run(args: Args) -> Result<()> {
    if args.init_config {
        let config_path = init_config(&args)?;
        log::info!("Wrote default config to {}", config_path.display());
        return Ok(());
    }
    let Some(file) = &args.file else {
        bail!("No file given");
    };

    let mut config = load_config(&args)?;
    if args.formatting {
        config.markdown.highlight_formatting = true;
    }
    let mode = config
        .markdown_mode()
        .context("Invalid [markdown] section in config")?;

    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let doc = HighlightedDocument::from_bytes(Arc::new(mode), &bytes)
        .with_context(|| format!("Failed to tokenize {}", file.display()))?;
    log::info!("Tokenized {} lines of {}", doc.line_count(), file.display());

    print!("{}", render(&doc));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = match Args::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    run(args)
}
