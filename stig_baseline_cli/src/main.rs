//! # STIG Baseline CLI
//!
//! Interactive tailoring of a vendor STIG archive: walk the rules of a
//! chosen profile, accept or reject each one, and repackage the archive
//! with the resulting custom profile plus a rationale record for every
//! rejection. Optionally filters the vendor's Ansible remediation role and
//! drives the external SCAP evaluator against the tailored benchmark.

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use stig_baseline::ansible::{self, AnsibleError};
use stig_baseline::benchmark::{self, ParseError};
use stig_baseline::packaging::{self, PackagingError};
use stig_baseline::scap::{ScapError, ScapRunner};
use stig_baseline::selection::{
    CheckpointError, CheckpointStore, ConsolePrompter, Prompter, SelectionEngine, SelectionError,
};
use stig_baseline::synthesis;
use stig_baseline::tree::{self, TreeError};
use stig_baseline::validation::{self, InputValidationError};

const CHECKPOINT_FILE_NAME: &str = ".stig_baseline_checkpoint";
const CANCELLED_MESSAGE: &str = "Cancelled by user.";
const RATIONALE_FILE_NAME: &str = "rationale.xml";
const ANSIBLE_TASKS_FILE_NAME: &str = "custom.tasks.main.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScapAction {
    /// Evaluate the tailored profile and write an HTML audit report
    Report,
    /// Generate an Ansible remediation playbook from an evaluation
    Remediation,
}

#[derive(Debug, Parser)]
#[command(
    name = "stig-baseline",
    version,
    about = "Tailor a vendor STIG archive into a custom compliance baseline"
)]
struct Args {
    /// Vendor STIG archive (U_<product>_V<n>R<m>_STIG.zip)
    #[arg(short, long)]
    input: PathBuf,

    /// Existing directory for generated artifacts
    #[arg(short, long)]
    output: PathBuf,

    /// Archive containing the vendor's *-ansible.zip remediation role
    #[arg(short, long)]
    ansible: Option<PathBuf>,

    /// Run the external SCAP evaluator after repackaging
    #[arg(long, value_enum)]
    scap: Option<ScapAction>,

    /// Checkpoint file location (default: <output>/.stig_baseline_checkpoint)
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Validation(#[from] InputValidationError),
    #[error(transparent)]
    Packaging(#[from] PackagingError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Ansible(#[from] AnsibleError),
    #[error(transparent)]
    Scap(#[from] ScapError),
    #[error("I/O failure at '{path}': {message}")]
    Io { path: String, message: String },
}

impl CliError {
    fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // An interrupt mid-walk is operator cancellation, same as EOF on stdin:
    // the checkpoint on disk already covers the last recorded rule
    if let Err(error) = ctrlc::set_handler(|| {
        println!("\n{}", CANCELLED_MESSAGE);
        std::process::exit(0);
    }) {
        log::warn!("could not install interrupt handler: {}", error);
    }

    let args = Args::parse();
    match run(&args, ConsolePrompter) {
        Ok(()) => {}
        Err(CliError::Selection(SelectionError::Cancelled)) => {
            // Checkpoint stays on disk so the next run resumes the walk
            println!("\n{}", CANCELLED_MESSAGE);
        }
        Err(error) => {
            eprintln!("ERROR: {}", error);
            std::process::exit(1);
        }
    }
}

fn run<P: Prompter>(args: &Args, prompter: P) -> Result<(), CliError> {
    validation::validate_archive_path(&args.input)?;
    validation::validate_output_dir(&args.output)?;
    if let Some(ansible_path) = &args.ansible {
        validation::validate_archive_path(ansible_path)?;
    }

    let original_xml = packaging::read_benchmark_entry(&args.input)?;
    let document = tree::decode_document(&original_xml)?;
    let bench = benchmark::bind_benchmark(&document)?;
    benchmark::validate_references(&bench)?;
    log::info!(
        "loaded benchmark '{}' with {} groups and {} profiles",
        bench.id,
        bench.groups.len(),
        bench.profiles.len()
    );

    let store = CheckpointStore::new(checkpoint_path(args));
    let mut engine = SelectionEngine::new(prompter, store);

    let chosen = engine.choose_profile(&bench)?;
    let groups = SelectionEngine::<P>::filter_groups(&bench, chosen);
    println!(
        "\n{} rules selected out of {} total rules in the benchmark.\n",
        groups.len(),
        bench.groups.len()
    );

    let preferences = engine.collect_preferences(&groups)?;

    let custom = synthesis::build_custom_profile(engine.prompter_mut(), &preferences)?;
    let rationale = synthesis::build_rationale(&custom.title, &preferences);

    let patched_xml = packaging::patch_benchmark_xml(&original_xml, &custom)?;
    let archive_path = packaging::repackage_archive(&args.input, &args.output, &patched_xml)?;
    println!("Custom archive: {}", archive_path.display());

    let rationale_path = args.output.join(RATIONALE_FILE_NAME);
    packaging::write_rationale(&rationale, &rationale_path)?;
    println!("Rationale record: {}", rationale_path.display());

    if let Some(ansible_path) = &args.ansible {
        let tasks_path = filter_ansible_tasks(ansible_path, &args.output, &rationale)?;
        println!("Filtered remediation tasks: {}", tasks_path.display());
    }

    if let Some(action) = args.scap {
        let artifact = run_scap(action, &args.input, &args.output, &patched_xml, &custom)?;
        println!("Evaluator artifact: {}", artifact.display());
    }

    // Every artifact is on disk; only now is the checkpoint expendable. A
    // failure in any step above exits with it preserved.
    engine.close()?;

    Ok(())
}

fn checkpoint_path(args: &Args) -> PathBuf {
    args.checkpoint
        .clone()
        .unwrap_or_else(|| args.output.join(CHECKPOINT_FILE_NAME))
}

/// Drop rejected rules from the vendor remediation role and write the rest
fn filter_ansible_tasks(
    ansible_path: &Path,
    output_dir: &Path,
    rationale: &stig_baseline::RationaleRecord,
) -> Result<PathBuf, CliError> {
    let text = packaging::read_ansible_tasks(ansible_path)?;
    let tasks = ansible::load(&text)?;
    let total = tasks.len();

    let denylist = ansible::denylist(rationale);
    let kept = ansible::filter_denied(tasks, &denylist);
    println!(
        "\n{} of {} remediation tasks kept ({} rejected rules).",
        kept.len(),
        total,
        denylist.len()
    );

    let tasks_path = output_dir.join(ANSIBLE_TASKS_FILE_NAME);
    ansible::dump(&kept, &tasks_path)?;
    Ok(tasks_path)
}

/// Run the external evaluator against the tailored benchmark
///
/// The evaluator reads plain files, so the patched document is written next
/// to the other artifacts under its vendor file name first.
fn run_scap(
    action: ScapAction,
    input: &Path,
    output_dir: &Path,
    patched_xml: &str,
    custom: &stig_baseline::Profile,
) -> Result<PathBuf, CliError> {
    let entry = packaging::naming::benchmark_entry(input)?;
    let xccdf_path = output_dir.join(&entry.file);
    fs::write(&xccdf_path, patched_xml).map_err(|e| CliError::io(xccdf_path.display(), &e))?;

    let runner = ScapRunner::new();
    let artifact = match action {
        ScapAction::Report => {
            runner.generate_audit_report(&xccdf_path, output_dir, &custom.id, &custom.title)?
        }
        ScapAction::Remediation => {
            runner.generate_remediation(&xccdf_path, output_dir, &custom.id, &custom.title)?
        }
    };
    Ok(artifact)
}
