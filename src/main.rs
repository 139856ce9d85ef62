//! chromafuzz - fuzzy RGB classifier
//!
//! Command-line interface for classifying colors and inspecting the model.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info, warn};

use chromafuzz::config::{ChromaConfig, LogLevel, OutputFormat};
use chromafuzz::fuzzy::{LinguisticVariable, Shape};
use chromafuzz::{
    fired_explanations, load_rules_from_file, DefuzzificationMethod, InferenceModel, LoadReport, ModelSettings,
    ShapeKind,
};

#[derive(Parser)]
#[command(name = "chromafuzz")]
#[command(version)]
#[command(about = "Mamdani fuzzy classifier for RGB colors", long_about = None)]
struct Cli {
    /// Config file (defaults to the standard search paths)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one RGB color
    #[command(allow_negative_numbers = true)]
    Classify {
        /// Red intensity, 0-255
        r: f64,
        /// Green intensity, 0-255
        g: f64,
        /// Blue intensity, 0-255
        b: f64,

        /// Rule-set file to use instead of a configured set
        #[arg(long, value_name = "FILE", conflicts_with = "set")]
        rules: Option<PathBuf>,

        /// Configured rule set name
        #[arg(long, value_name = "NAME")]
        set: Option<String>,

        /// Membership function shape (triangular, trapezoidal)
        #[arg(long, value_parser = parse_shape)]
        shape: Option<ShapeKind>,

        /// Defuzzification method (centroid, bisector, mom)
        #[arg(long, value_parser = parse_defuzz)]
        defuzz: Option<DefuzzificationMethod>,

        /// Show how every fired rule contributed
        #[arg(long)]
        explain: bool,

        /// Output format (text, json)
        #[arg(long, value_parser = parse_format)]
        format: Option<OutputFormat>,
    },

    /// Print the membership functions of the model
    Curves {
        #[arg(long, value_parser = parse_shape)]
        shape: Option<ShapeKind>,

        /// Which variable to print (input, output)
        #[arg(long, default_value = "input")]
        variable: String,

        #[arg(long, value_parser = parse_format)]
        format: Option<OutputFormat>,
    },

    /// List rule sets, or the rules of one set
    Rules {
        /// Rule set to print
        #[arg(long, value_name = "NAME")]
        set: Option<String>,
    },

    /// Show or create the configuration file
    Config {
        /// Write a commented default config to ./chromafuzz.toml
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

fn parse_shape(s: &str) -> Result<ShapeKind, String> {
    ShapeKind::from_str(s).ok_or_else(|| format!("unknown shape '{}' (expected triangular or trapezoidal)", s))
}

fn parse_defuzz(s: &str) -> Result<DefuzzificationMethod, String> {
    DefuzzificationMethod::from_str(s)
        .ok_or_else(|| format!("unknown method '{}' (expected centroid, bisector or mom)", s))
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_str(s).ok_or_else(|| format!("unknown format '{}' (expected text or json)", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChromaConfig::load_from_file(path).map(|mut c| {
            c.apply_env_overrides();
            c
        }),
        None => ChromaConfig::load(),
    }
    .context("failed to load configuration")?;

    init_logging(config.general.log_level.adjusted(cli.verbose, cli.quiet));
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Classify { r, g, b, rules, set, shape, defuzz, explain, format } => {
            let mut settings = config.model_settings();
            if let Some(shape) = shape {
                settings.shape = shape;
            }
            if let Some(method) = defuzz {
                settings.defuzzification = method;
            }
            let (name, path) = resolve_rule_set(&config, rules, set.as_deref())?;
            let format = format.unwrap_or(config.general.format);
            classify(&config, &settings, &name, &path, [r, g, b], explain, format)
        }
        Command::Curves { shape, variable, format } => {
            let mut settings = config.model_settings();
            if let Some(shape) = shape {
                settings.shape = shape;
            }
            let format = format.unwrap_or(config.general.format);
            curves(&config, &settings, &variable, format)
        }
        Command::Rules { set } => match set {
            Some(name) => show_rule_set(&config, &name),
            None => list_rule_sets(&config),
        },
        Command::Config { init, force, show } => {
            if init {
                init_config(force)?;
            }
            if show || !init {
                print!("{}", config.to_toml()?);
            }
            Ok(())
        }
    }
}

fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(level.max_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_rule_set(config: &ChromaConfig, file: Option<PathBuf>, set: Option<&str>) -> Result<(String, PathBuf)> {
    if let Some(path) = file {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Ok((name, path));
    }
    let name = set.unwrap_or(&config.rules.default).to_string();
    let path = config.rule_set_path(Some(&name))?;
    Ok((name, path))
}

fn load_model(config: &ChromaConfig, settings: &ModelSettings, path: &Path) -> Result<InferenceModel> {
    let catalog = config.catalog()?;
    let report = match load_rules_from_file(path, &catalog) {
        Ok(report) => report,
        Err(err) => {
            // Assembly substitutes the fallback rule for the empty set
            warn!(path = %path.display(), error = %err, "rule set could not be loaded");
            LoadReport::default()
        }
    };
    if !report.is_clean() {
        info!(rejected = report.rejected.len(), path = %path.display(), "some rules were dropped");
    }
    Ok(InferenceModel::assemble(&catalog, report.rules, settings)?)
}

fn classify(
    config: &ChromaConfig,
    settings: &ModelSettings,
    name: &str,
    path: &Path,
    rgb: [f64; 3],
    explain: bool,
    format: OutputFormat,
) -> Result<()> {
    let model = load_model(config, settings, path)?;
    let [r, g, b] = rgb;
    let result = model.infer(r, g, b);

    let explanations = if explain {
        fired_explanations(&model, r, g, b, config.diagnostics.workers)
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Json => {
            let mut doc = json!({
                "input": { "r": r, "g": g, "b": b },
                "rule_set": name,
                "shape": settings.shape,
                "defuzzification": settings.defuzzification,
                "fallback": model.uses_fallback(),
                "result": result,
            });
            if explain {
                doc["explanations"] = serde_json::to_value(&explanations)?;
            }
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!("RGB({}, {}, {})", r, g, b);
            println!("{}", model.rules().summary(name, model.input(chromafuzz::Channel::Red).len()));
            println!("Shape: {}", settings.shape.display_name());
            println!("{}", result.summary());
            println!("Fired rules: {} of {}", result.fired.len(), model.rules().len());
            if model.uses_fallback() {
                println!("(no usable rules, fallback rule in effect)");
            }
            for explanation in &explanations {
                println!();
                print!("{}", explanation);
            }
        }
    }
    Ok(())
}

fn curves(config: &ChromaConfig, settings: &ModelSettings, variable: &str, format: OutputFormat) -> Result<()> {
    let catalog = config.catalog()?;
    let model = InferenceModel::assemble(&catalog, chromafuzz::RuleSet::new(), settings)?;

    let (var, table, shoulder): (&LinguisticVariable, _, f64) = match variable.to_lowercase().as_str() {
        "input" | "in" => (model.input(chromafuzz::Channel::Red), &catalog.inputs, settings.input_shoulder),
        "output" | "out" => (model.output(), &catalog.outputs, settings.output_shoulder),
        other => bail!("unknown variable '{}' (expected input or output)", other),
    };

    match format {
        OutputFormat::Json => {
            let terms: Vec<_> = var
                .terms()
                .map(|(label, curve)| json!({ "label": label, "values": curve }))
                .collect();
            let doc = json!({
                "variable": var.name,
                "shape": settings.shape,
                "universe": var.universe,
                "terms": terms,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!(
                "{} over [{}, {}], {}",
                var.name,
                var.universe.min(),
                var.universe.max(),
                settings.shape.display_name()
            );
            for term in table {
                let shape = Shape::derive(settings.shape, term.points, &var.universe, shoulder);
                let (core_lo, core_hi) = shape.core();
                let (sup_lo, sup_hi) = shape.support();
                println!(
                    "  {:<10} support [{:>5.1}, {:>5.1}]  core [{:>5.1}, {:>5.1}]",
                    term.label, sup_lo, sup_hi, core_lo, core_hi
                );
            }
        }
    }
    Ok(())
}

fn list_rule_sets(config: &ChromaConfig) -> Result<()> {
    let catalog = config.catalog()?;
    for entry in &config.rules.sets {
        let marker = if entry.name == config.rules.default { "*" } else { " " };
        let path = config.rule_set_path(Some(&entry.name))?;
        let status = match load_rules_from_file(&path, &catalog) {
            Ok(report) if report.is_clean() => format!("{} rules", report.rules.len()),
            Ok(report) => format!("{} rules, {} rejected", report.rules.len(), report.rejected.len()),
            Err(err) => format!("unavailable: {}", err.message),
        };
        println!("{} {:<12} {:<30} {}", marker, entry.name, entry.label, status);
    }
    Ok(())
}

fn show_rule_set(config: &ChromaConfig, name: &str) -> Result<()> {
    let catalog = config.catalog()?;
    let path = config.rule_set_path(Some(name))?;
    let report = load_rules_from_file(&path, &catalog)?;

    println!("{}", report.rules.summary(name, catalog.inputs.len()));
    for (index, rule) in report.rules.iter().enumerate() {
        println!("{:>3}. {}", index + 1, rule);
    }
    for rejected in &report.rejected {
        println!("  dropped record {}: {} ({})", rejected.index, rejected.record, rejected.reason);
    }
    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = PathBuf::from("./chromafuzz.toml");
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(&path, ChromaConfig::default_config_content())
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
