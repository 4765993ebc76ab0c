//! External scanner boundary
//!
//! Shells out to the SCAP evaluator to produce audit and remediation
//! artifacts from a patched benchmark document. The tool's command surface
//! and intermediate ARF format are opaque here; the runner only builds the
//! invocations, captures output, and surfaces failures verbatim.

pub mod error;

pub use error::ScapError;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const ARF_FILE_NAME: &str = "arf.xml";

/// Runner for the external `oscap` evaluator
#[derive(Debug, Clone)]
pub struct ScapRunner {
    program: String,
    fetch_remote_resources: bool,
}

impl Default for ScapRunner {
    fn default() -> Self {
        Self {
            program: "oscap".to_string(),
            fetch_remote_resources: true,
        }
    }
}

impl ScapRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the evaluator binary (test seam, alternate install paths)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn without_remote_resources(mut self) -> Self {
        self.fetch_remote_resources = false;
        self
    }

    /// Produce an Ansible remediation playbook for the given profile
    ///
    /// Evaluates the benchmark into an ARF intermediate, then generates the
    /// fix playbook from it. Returns the playbook path.
    pub fn generate_remediation(
        &self,
        benchmark_xml: &Path,
        output_dir: &Path,
        profile_id: &str,
        name: &str,
    ) -> Result<PathBuf, ScapError> {
        let arf_path = output_dir.join(ARF_FILE_NAME);
        self.run(&self.eval_args(benchmark_xml, &arf_path, profile_id, None))?;

        let playbook = output_dir.join(format!("{}.yml", sanitize_name(name)));
        let output = self.run(&[
            "xccdf".to_string(),
            "generate".to_string(),
            "fix".to_string(),
            "--fetch-remote-resources".to_string(),
            "--fix-type".to_string(),
            "ansible".to_string(),
            "--result-id".to_string(),
            String::new(),
            arf_path.display().to_string(),
        ])?;
        fs::write(&playbook, output).map_err(|e| ScapError::io(playbook.display(), &e))?;

        let _ = fs::remove_file(&arf_path);
        Ok(playbook)
    }

    /// Produce an HTML audit report for the given profile
    pub fn generate_audit_report(
        &self,
        benchmark_xml: &Path,
        output_dir: &Path,
        profile_id: &str,
        name: &str,
    ) -> Result<PathBuf, ScapError> {
        let arf_path = output_dir.join(ARF_FILE_NAME);
        self.run(&self.eval_args(benchmark_xml, &arf_path, profile_id, None))?;

        let report = output_dir.join(format!("{}.html", sanitize_name(name)));
        self.run(&self.eval_args(benchmark_xml, &arf_path, profile_id, Some(&report)))?;

        let _ = fs::remove_file(&arf_path);
        Ok(report)
    }

    fn eval_args(
        &self,
        benchmark_xml: &Path,
        arf_path: &Path,
        profile_id: &str,
        report: Option<&Path>,
    ) -> Vec<String> {
        let mut args = vec!["xccdf".to_string(), "eval".to_string()];
        if self.fetch_remote_resources {
            args.push("--fetch-remote-resources".to_string());
        }
        args.push("--profile".to_string());
        args.push(profile_id.to_string());
        args.push("--results-arf".to_string());
        args.push(arf_path.display().to_string());
        if let Some(report) = report {
            args.push("--report".to_string());
            args.push(report.display().to_string());
        }
        args.push(benchmark_xml.display().to_string());
        args
    }

    /// Run the evaluator, returning captured stdout on success
    fn run(&self, args: &[String]) -> Result<Vec<u8>, ScapError> {
        let rendered = format!("{} {}", self.program, args.join(" "));
        log::info!("running external evaluator: {}", rendered);

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScapError::ProgramNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    ScapError::Launch {
                        program: self.program.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(ScapError::ExternalToolFailure {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(output.stdout)
    }
}

fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
}
