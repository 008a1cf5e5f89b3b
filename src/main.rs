//! hidlc CLI
//!
//! Command-line front end: parse a package, bind its type graph, and run
//! one or more target drivers over it.

use clap::{CommandFactory, Parser as ClapParser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use hidlc::config::{Config, TargetKind};
use hidlc::coordinator::Coordinator;
use hidlc::fqname::FQName;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "hidlc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler front-end and multi-target code generator for HIDL interface packages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, ValueEnum)]
enum TargetArg {
    NativeHeader,
    NativeSource,
    Managed,
    Descriptor,
}

impl From<TargetArg> for TargetKind {
    fn from(t: TargetArg) -> Self {
        match t {
            TargetArg::NativeHeader => TargetKind::NativeHeader,
            TargetArg::NativeSource => TargetKind::NativeSource,
            TargetArg::Managed => TargetKind::Managed,
            TargetArg::Descriptor => TargetKind::Descriptor,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and bind a package, then emit one or more target outputs
    Generate {
        /// Fully qualified interface or package name, e.g. foo.bar@1.0::IBaz
        fqname: String,

        /// Directory to write generated files into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Package-prefix root mapping, `prefix:directory`; repeatable
        #[arg(short = 'r', long = "root", value_name = "PREFIX:DIR")]
        roots: Vec<String>,

        /// Target(s) to emit; repeatable (defaults to all four)
        #[arg(short = 'L', long = "lang", value_enum)]
        targets: Vec<TargetArg>,

        /// Write a Makefile-rule dependency file listing every .hal opened
        #[arg(short = 'd', long = "dep-file")]
        dep_file: Option<PathBuf>,
    },

    /// Parse and bind a package without emitting any output
    Check {
        fqname: String,

        #[arg(short = 'r', long = "root", value_name = "PREFIX:DIR")]
        roots: Vec<String>,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hidlc=info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            fqname,
            output,
            roots,
            targets,
            dep_file,
        } => run_generate(&fqname, &output, &roots, &targets, dep_file.as_deref()),
        Commands::Check { fqname, roots } => run_check(&fqname, &roots),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "hidlc", &mut io::stdout());
}

fn build_config(output: &Path, roots: &[String], targets: &[TargetArg], dep_file: Option<&Path>) -> Result<Config, String> {
    let mut config = Config::new().with_output_root(output);
    for root in roots {
        let (prefix, dir) = root
            .split_once(':')
            .ok_or_else(|| format!("malformed root mapping '{root}', expected PREFIX:DIR"))?;
        config = config.with_mapping(prefix, dir)?;
    }
    let kinds: Vec<TargetKind> = if targets.is_empty() {
        vec![TargetKind::NativeHeader, TargetKind::NativeSource, TargetKind::Managed, TargetKind::Descriptor]
    } else {
        targets.iter().map(|t| (*t).into()).collect()
    };
    config = config.with_targets(kinds);
    if let Some(path) = dep_file {
        config = config.with_dep_file(path);
    }
    Ok(config)
}

fn run_generate(fqname: &str, output: &Path, roots: &[String], targets: &[TargetArg], dep_file: Option<&Path>) {
    let config = match build_config(output, roots, targets, dep_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = generate_impl(fqname, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn generate_impl(fqname: &str, config: &Config) -> hidlc::Result<()> {
    let fq = FQName::parse(fqname).ok_or_else(|| hidlc::HidlError::TypeConstraint(format!("invalid name '{fqname}'")))?;

    let mut coordinator = Coordinator::new();
    for mapping in &config.roots {
        tracing::debug!(prefix = %mapping.prefix, dir = %mapping.directory.display(), "registering root mapping");
        coordinator.add_prefix(mapping.prefix.clone(), mapping.directory.clone());
    }

    let handle = coordinator.parse(&fq)?;
    tracing::info!(fqname = %fq, "parsed and bound package");

    fs::create_dir_all(&config.output_root).map_err(|e| hidlc::HidlError::io(config.output_root.clone(), e))?;

    let basename = fq.tail();
    for target in &config.targets {
        match target {
            TargetKind::NativeHeader => {
                let content = hidlc::targets::native::emit_header(coordinator.ast(handle), coordinator.type_arena(), coordinator.scope_arena(), &fq, basename)?;
                write_generated(&config.output_root, &format!("{basename}.h"), &content)?;
            }
            TargetKind::NativeSource => {
                let content = hidlc::targets::native::emit_source(coordinator.ast(handle), coordinator.type_arena(), coordinator.scope_arena(), basename)?;
                write_generated(&config.output_root, &format!("{basename}.cpp"), &content)?;
            }
            TargetKind::Managed => {
                match hidlc::targets::managed::emit_units(coordinator.ast(handle), coordinator.type_arena(), coordinator.scope_arena(), &fq) {
                    Ok(units) => {
                        for unit in &units {
                            write_generated(&config.output_root, &format!("{}.java", unit.name), &unit.content)?;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(target = "managed", error = %e, "skipping incompatible target, no partial output written");
                    }
                }
            }
            TargetKind::Descriptor => {
                let content = hidlc::targets::descriptor::emit(coordinator.ast(handle), coordinator.type_arena(), coordinator.scope_arena());
                write_generated(&config.output_root, &format!("{basename}.txt"), &content)?;
            }
        }
    }

    if let Some(dep_path) = &config.dep_file {
        write_dep_file(dep_path, &config.output_root, basename, &coordinator)?;
    }

    Ok(())
}

fn write_generated(output_root: &Path, file_name: &str, content: &str) -> hidlc::Result<()> {
    let out_path = output_root.join(file_name);
    fs::write(&out_path, content).map_err(|e| hidlc::HidlError::io(out_path.clone(), e))?;
    tracing::debug!(file = %out_path.display(), "wrote generated file");
    Ok(())
}

/// A Makefile rule listing every `.hal` actually opened while resolving
/// this package, in parse order — so a build system can invalidate
/// generated output when any transitively-imported file changes.
fn write_dep_file(dep_path: &Path, output_root: &Path, basename: &str, coordinator: &Coordinator) -> hidlc::Result<()> {
    let mut body = format!("{}: \\\n", output_root.join(format!("{basename}.h")).display());
    let files = coordinator.opened_files();
    for (i, file) in files.iter().enumerate() {
        let sep = if i + 1 == files.len() { "\n" } else { " \\\n" };
        body.push_str(&format!("  {}{sep}", file.display()));
    }
    fs::write(dep_path, body).map_err(|e| hidlc::HidlError::io(dep_path.to_path_buf(), e))
}

fn run_check(fqname: &str, roots: &[String]) {
    let config = match build_config(Path::new("."), roots, &[], None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let fq = match FQName::parse(fqname) {
        Some(fq) => fq,
        None => {
            eprintln!("Error: invalid name '{fqname}'");
            process::exit(1);
        }
    };

    let mut coordinator = Coordinator::new();
    for mapping in &config.roots {
        coordinator.add_prefix(mapping.prefix.clone(), mapping.directory.clone());
    }

    match coordinator.parse(&fq) {
        Ok(_) => println!("OK: {fqname}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
