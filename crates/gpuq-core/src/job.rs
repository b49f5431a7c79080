//! Job commands, job files and launch tickets

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::{GpuqError, GpuqResult, ResourceId};

/// Executable command: a program and its arguments
///
/// The command is run directly, without a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCommand {
    /// Program path or name looked up on `PATH`
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl JobCommand {
    /// Create a command from a program and its arguments
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a command from an argv vector (program first)
    pub fn from_argv<I, S>(argv: I) -> GpuqResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv
            .next()
            .ok_or_else(|| GpuqError::InvalidCommand("command has no program".to_string()))?;
        if program.is_empty() {
            return Err(GpuqError::InvalidCommand(
                "program name is empty".to_string(),
            ));
        }
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }
}

impl std::fmt::Display for JobCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where a submitted job landed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTicket {
    /// Job identifier assigned at launch
    pub id: Uuid,
    /// Slot the job occupies
    pub slot: usize,
    /// Resource exported to the job
    pub resource: ResourceId,
    /// OS process id, when the platform reports one
    pub pid: Option<u32>,
}

/// Job file format (TOML)
///
/// ```toml
/// [[jobs]]
/// name = "baseline"
/// command = ["python", "train.py", "--lr", "0.1"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// A single entry of a job file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub name: Option<String>,
    pub command: Vec<String>,
}

impl JobEntry {
    /// Label used in logs: the explicit name, or the program
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.command.first().cloned().unwrap_or_default(),
        }
    }
}

impl JobFile {
    /// Load a job file from disk
    pub fn from_file(path: &Path) -> GpuqResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GpuqError::JobFile(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse a job file from TOML text
    pub fn parse(content: &str) -> GpuqResult<Self> {
        toml::from_str(content)
            .map_err(|e| GpuqError::JobFile(format!("Failed to parse job file: {}", e)))
    }

    /// Resolve every entry into a labelled command
    pub fn commands(&self) -> GpuqResult<Vec<(String, JobCommand)>> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let command = JobCommand::from_argv(entry.command.iter().cloned()).map_err(
                    |e| GpuqError::JobFile(format!("Job #{} ({}): {}", i, entry.label(), e)),
                )?;
                Ok((entry.label(), command))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_argv() {
        let cmd = JobCommand::from_argv(["python", "train.py", "--lr", "0.1"]).unwrap();
        assert_eq!(cmd.program, "python");
        assert_eq!(cmd.args, vec!["train.py", "--lr", "0.1"]);
        assert_eq!(cmd.to_string(), "python train.py --lr 0.1");
    }

    #[test]
    fn test_from_argv_rejects_empty() {
        let err = JobCommand::from_argv(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, GpuqError::InvalidCommand(_)));
        assert!(JobCommand::from_argv([""]).is_err());
    }

    #[test]
    fn test_job_file_parse() {
        let file = JobFile::parse(
            r#"
[[jobs]]
name = "baseline"
command = ["python", "train.py"]

[[jobs]]
command = ["sleep", "5"]
"#,
        )
        .unwrap();

        let commands = file.commands().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].0, "baseline");
        assert_eq!(commands[1].0, "sleep");
        assert_eq!(commands[1].1.args, vec!["5"]);
    }

    #[test]
    fn test_job_file_empty_command() {
        let file = JobFile::parse("[[jobs]]\nname = \"broken\"\ncommand = []\n").unwrap();
        let err = file.commands().unwrap_err();
        assert!(matches!(err, GpuqError::JobFile(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_job_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[jobs]]\ncommand = [\"true\"]").unwrap();

        let jobs = JobFile::from_file(file.path()).unwrap();
        assert_eq!(jobs.jobs.len(), 1);

        let missing = JobFile::from_file(Path::new("/nonexistent/jobs.toml"));
        assert!(matches!(missing, Err(GpuqError::JobFile(_))));
    }
}
