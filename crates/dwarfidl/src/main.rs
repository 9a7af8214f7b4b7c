use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use dwarfidl_core::{
    jidl, DebugInfoFile, InputSelection, Language, Pipeline, PipelineOptions, Result as PipelineResult,
};
use dwarfidl_utils::{info, init_logging_to_dir, init_logging_with, LogLevel, LoggingConfig, LoggingGuard};

/// Generate JIDL type descriptions from DWARF debug information.
#[derive(Parser, Debug)]
#[command(name = "dwarfidl")]
#[command(version)]
#[command(about = "Generate JIDL type descriptions from DWARF debug information", long_about = None)]
struct Cli
{
    #[command(flatten)]
    logging: LoggingArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct LoggingArgs
{
    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG
    #[arg(long, global = true, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
    /// Also write logs to a dated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Resolve the types of every input file and write JIDL
    Jidl
    {
        #[command(flatten)]
        inputs: InputArgs,
        /// Write JIDL to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write compact JSON instead of indented
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// List the compilation units of each input file
    Units
    {
        /// Object files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct InputArgs
{
    /// Object files to read, in order
    files: Vec<PathBuf>,
    /// Object file to read (repeatable)
    #[arg(long = "object", value_name = "PATH")]
    objects: Vec<PathBuf>,
    /// Directory scanned recursively for .o/.obj files (repeatable)
    #[arg(long = "object-dir", value_name = "DIR")]
    object_dirs: Vec<PathBuf>,
    /// Manifest with one object path per line, relative to the manifest (repeatable)
    #[arg(long = "object-file", visible_alias = "file-list", value_name = "FILE")]
    object_files: Vec<PathBuf>,
    /// Object file to leave out (repeatable)
    #[arg(long = "ignore-object", value_name = "PATH")]
    ignore_objects: Vec<PathBuf>,
    /// Directory whose objects are left out (repeatable)
    #[arg(long = "ignore-object-dir", value_name = "DIR")]
    ignore_object_dirs: Vec<PathBuf>,
    /// Manifest of objects to leave out (repeatable)
    #[arg(long = "ignore-object-file", value_name = "FILE")]
    ignore_object_files: Vec<PathBuf>,
    /// Warn about missing inputs instead of failing
    #[arg(long, visible_alias = "ignore-missing-entries", default_value_t = false)]
    ignore_missing: bool,
}

impl InputArgs
{
    fn into_selection(self) -> InputSelection
    {
        let mut objects = self.files;
        objects.extend(self.objects);
        InputSelection {
            objects,
            object_dirs: self.object_dirs,
            object_files: self.object_files,
            ignore_objects: self.ignore_objects,
            ignore_object_dirs: self.ignore_object_dirs,
            ignore_object_files: self.ignore_object_files,
            ignore_missing: self.ignore_missing,
        }
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String>
{
    value.parse().map_err(|err: dwarfidl_utils::LoggingError| err.to_string())
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match init_cli_logging(&cli.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_cli_logging(args: &LoggingArgs) -> Result<LoggingGuard, dwarfidl_utils::LoggingError>
{
    if let Some(dir) = &args.log_dir {
        let (guard, file) = init_logging_to_dir(dir, args.log_level)?;
        info!("Writing logs to {}", file.display());
        return Ok(guard);
    }
    init_logging_with(&LoggingConfig::from_env()?.with_level(args.log_level))
}

fn run_command(command: Commands) -> PipelineResult<()>
{
    match command {
        Commands::Jidl {
            inputs,
            output,
            compact,
        } => {
            let selection = inputs.into_selection();
            if selection.is_empty() {
                return Err(dwarfidl_core::DwarfIdlError::InvalidArgument(
                    "no input files given".to_string(),
                ));
            }
            let files = selection.resolve()?;
            info!("Reading {} object files", files.len());

            let mut pipeline = Pipeline::new(PipelineOptions {
                lenient_missing_files: selection.ignore_missing,
            });
            for file in &files {
                pipeline.process_file(file)?;
            }
            let stats = pipeline.stats();
            info!(
                "Processed {} files, {} units ({} skipped), {} resolved, {} unresolved",
                stats.files, stats.units, stats.skipped_units, stats.resolved, stats.unresolved
            );

            let namespace = pipeline.into_namespace();
            let mut text = if compact {
                jidl::to_string(&namespace)?
            } else {
                jidl::to_string_pretty(&namespace)?
            };
            text.push('\n');

            match output {
                Some(path) => {
                    fs::write(&path, text)?;
                    info!("Wrote JIDL to {}", path.display());
                }
                None => io::stdout().lock().write_all(text.as_bytes())?,
            }
            Ok(())
        }
        Commands::Units { files } => {
            for path in &files {
                let file = DebugInfoFile::open(path)?;
                println!("{}:", file.path().display());
                for unit in file.units() {
                    print_unit(unit);
                }
            }
            Ok(())
        }
    }
}

fn print_unit(unit: &dwarfidl_core::CompileUnit)
{
    let root = unit.tree.root();
    let name = root.name().unwrap_or("<unnamed>");
    let code = root.language().unwrap_or(0);
    let language = Language::from_code(code).map_or_else(|| format!("unknown (0x{code:04x})"), |lang| lang.to_string());
    let supported = if Language::from_code(code).is_some() { "yes" } else { "no" };
    println!(
        "  {} {name}: DWARF {}, language {language}, supported: {supported}",
        unit.offset, unit.version
    );
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn parse(args: &[&str]) -> Cli
    {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_jidl_input_selection_flags()
    {
        let cli = parse(&[
            "dwarfidl",
            "jidl",
            "a.o",
            "--object",
            "b.o",
            "--object-dir",
            "build",
            "--object-dir",
            "out",
            "--file-list",
            "objects.txt",
            "--ignore-object",
            "build/skip.o",
            "--ignore-object-dir",
            "build/vendor",
            "--ignore-object-file",
            "ignore.txt",
            "--ignore-missing-entries",
        ]);
        let Commands::Jidl { inputs, .. } = cli.command else {
            panic!("expected the jidl command");
        };
        let selection = inputs.into_selection();
        assert_eq!(selection.objects, vec![PathBuf::from("a.o"), PathBuf::from("b.o")]);
        assert_eq!(selection.object_dirs, vec![PathBuf::from("build"), PathBuf::from("out")]);
        assert_eq!(selection.object_files, vec![PathBuf::from("objects.txt")]);
        assert_eq!(selection.ignore_objects, vec![PathBuf::from("build/skip.o")]);
        assert_eq!(selection.ignore_object_dirs, vec![PathBuf::from("build/vendor")]);
        assert_eq!(selection.ignore_object_files, vec![PathBuf::from("ignore.txt")]);
        assert!(selection.ignore_missing);
    }

    #[test]
    fn test_jidl_without_inputs_is_rejected()
    {
        let cli = parse(&["dwarfidl", "jidl", "--compact"]);
        let err = run_command(cli.command).unwrap_err();
        assert!(matches!(err, dwarfidl_core::DwarfIdlError::InvalidArgument(_)));
    }

    #[test]
    fn test_global_log_level()
    {
        let cli = parse(&["dwarfidl", "units", "a.o", "--log-level", "debug"]);
        assert_eq!(cli.logging.log_level, Some(LogLevel::Debug));
    }
}
