use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, CommandFactory};
use tracing_subscriber::EnvFilter;

use wclv::config::{FrontEndOptions, ValidatorConfig};
use wclv::diagnostic::render_diagnostics;

#[derive(Args)]
pub struct ValidateArgs {
    /// TOML file overriding the validator configuration
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Also write the kernel descriptors as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub descriptors: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace); defaults to RUST_LOG or "warn"
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
    /// OpenCL C source file, or "-" for standard input
    pub input: String,
    /// Arguments for the front end (-Werror, -w)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub front_end_args: Vec<String>,
}

/// Spellings that ask for usage instead of validation.
const HELP_FLAGS: &[&str] = &["-h", "-help", "--help"];

/// Print usage to stderr and exit with failure when there is nothing to
/// validate or help was requested.
pub fn usage_requested<C: CommandFactory>(args: &[String]) {
    if args.len() > 1 && !args.iter().skip(1).any(|a| HELP_FLAGS.contains(&a.as_str())) {
        return;
    }
    let mut command = C::command();
    eprintln!("{}", command.render_help());
    process::exit(1);
}

pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|e| {
            eprintln!("error: invalid log level '{}': {}", level, e);
            process::exit(1);
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn cmd_validate(args: ValidateArgs) {
    let ValidateArgs {
        config,
        descriptors,
        log_level: _,
        input,
        front_end_args,
    } = args;

    let config = match &config {
        Some(path) => ValidatorConfig::load(path).unwrap_or_else(|diag| {
            eprintln!("error: {}", diag.message);
            process::exit(1);
        }),
        None => ValidatorConfig::webcl(),
    };
    let (filename, source) = read_input(&input);
    let options = FrontEndOptions::from_args(&front_end_args);

    let program = wclv::validate_with_options(&source, &config, &options);
    render_diagnostics(program.diagnostics(), &filename, &source);

    let Some(output) = program.validated_source() else {
        process::exit(1);
    };
    if let Some(path) = descriptors {
        write_descriptors(&path, program.kernels());
    }
    print!("{}", output);
}

fn read_input(input: &str) -> (String, String) {
    if input == "-" {
        let mut source = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut source) {
            eprintln!("error: cannot read standard input: {}", e);
            process::exit(1);
        }
        return ("<stdin>".to_string(), source);
    }
    match std::fs::read_to_string(input) {
        Ok(source) => (input.to_string(), source),
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", input, e);
            process::exit(1);
        }
    }
}

fn write_descriptors(path: &Path, kernels: &[wclv::passes::KernelDescriptor]) {
    let json = match serde_json::to_string_pretty(kernels) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("error: cannot serialize kernel descriptors: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = std::fs::write(path, json + "\n") {
        eprintln!("error: cannot write '{}': {}", path.display(), e);
        process::exit(1);
    }
}
