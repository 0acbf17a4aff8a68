//! Backend driving the external `git` binary
//!
//! Every operation spawns one `git` process and captures its stdout,
//! stderr and exit status verbatim. The authorization header travels as a
//! per-invocation `http.extraHeader` so nothing is written to the
//! repository configuration.

use std::path::Path;
use std::process::Command;

use crate::error::{PmrError, Result};
use crate::models::VcsOutput;
use crate::services::vcs::{WorkspaceBinding, WorkspaceVcs};

pub struct NativeGit {
    authorization: Option<String>,
}

impl NativeGit {
    pub fn new() -> Self {
        Self {
            authorization: None,
        }
    }

    /// A `git` command that never prompts and never opens a console
    /// window on Windows.
    fn git_command(&self) -> Command {
        let mut cmd = Command::new("git");

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NO_WINDOW
            cmd.creation_flags(0x08000000);
        }

        cmd.env("GIT_TERMINAL_PROMPT", "0");

        if let Some(header) = &self.authorization {
            cmd.arg("-c")
                .arg(format!("http.extraHeader=Authorization: {header}"));
        }

        cmd
    }

    fn run(&self, cwd: &Path, args: &[&str]) -> Result<VcsOutput> {
        let output = self
            .git_command()
            .current_dir(cwd)
            .args(args)
            .output()
            .map_err(|e| PmrError::unexpected(format!("failed to run git: {e}")))?;

        Ok(VcsOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.code().unwrap_or(-1),
        })
    }
}

impl Default for NativeGit {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceVcs for NativeGit {
    fn bind(&self, local_dir: &Path) -> Result<WorkspaceBinding> {
        if !local_dir.join(".git").is_dir() {
            std::fs::create_dir_all(local_dir)?;
            let output = self.run(local_dir, &["init"])?;
            if !output.success() {
                return Err(PmrError::unexpected(format!(
                    "git init failed: {}",
                    output.stderr.trim()
                )));
            }
        }
        Ok(WorkspaceBinding::new(local_dir))
    }

    fn clone_from(&self, remote_url: &str, local_dir: &Path) -> Result<VcsOutput> {
        std::fs::create_dir_all(local_dir)?;
        self.run(local_dir, &["clone", remote_url, "."])
    }

    fn set_authorization(&mut self, header: String) {
        self.authorization = Some(header);
    }

    fn write_remote(&self, binding: &WorkspaceBinding) -> Result<()> {
        let remote_url = binding.remote_url().ok_or_else(|| {
            PmrError::unexpected("no remote URL associated with the workspace binding")
        })?;
        let output = self.run(binding.local_dir(), &["remote", "add", "origin", remote_url])?;
        if !output.success() {
            // origin already exists; repoint it
            let output = self.run(
                binding.local_dir(),
                &["remote", "set-url", "origin", remote_url],
            )?;
            if !output.success() {
                return Err(PmrError::unexpected(format!(
                    "could not register remote: {}",
                    output.stderr.trim()
                )));
            }
        }
        Ok(())
    }

    fn add(&self, binding: &WorkspaceBinding, filename: &str) -> Result<()> {
        let output = self.run(binding.local_dir(), &["add", filename])?;
        if !output.success() {
            return Err(PmrError::unexpected(format!(
                "could not stage {filename}: {}",
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    fn commit(&self, binding: &WorkspaceBinding, message: &str) -> Result<VcsOutput> {
        self.run(binding.local_dir(), &["commit", "-m", message])
    }

    fn push(&self, binding: &WorkspaceBinding) -> Result<VcsOutput> {
        self.run(binding.local_dir(), &["push", "origin"])
    }

    fn pull(&self, binding: &WorkspaceBinding) -> Result<VcsOutput> {
        self.run(binding.local_dir(), &["pull"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_travels_as_extra_header() {
        let mut backend = NativeGit::new();
        backend.set_authorization("Basic YWxpY2U6c2VjcmV0".to_string());
        let cmd = backend.git_command();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args[0], "-c");
        assert_eq!(
            args[1],
            "http.extraHeader=Authorization: Basic YWxpY2U6c2VjcmV0"
        );
    }

    #[test]
    fn test_unauthorized_command_has_no_extra_header() {
        let backend = NativeGit::new();
        let cmd = backend.git_command();
        assert_eq!(cmd.get_args().count(), 0);
    }
}
