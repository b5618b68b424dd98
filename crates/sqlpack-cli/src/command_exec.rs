use sqlpack::{ExecError, ExecResult, StatementExecutor};
use std::io;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

/// Runs each statement by piping it to a fresh client process, e.g.
/// `mysql --user=root mydb`.
///
/// The process exit status decides success. Affected row counts are not
/// available this way, so every success reports `0`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(command: &[String]) -> anyhow::Result<Self> {
        let Some((program, args)) = command.split_first() else {
            anyhow::bail!("exec.command must name a program");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl StatementExecutor for CommandExecutor {
    async fn execute(&self, statement: &str) -> ExecResult<u64> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::execution(format!("failed to start {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match feed(&mut stdin, statement).await {
                Ok(()) => {}
                // The client quit early; its exit status explains why.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    return Err(ExecError::execution(format!(
                        "failed to write statement to {}: {e}",
                        self.program
                    )));
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::execution(format!("failed to wait for {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecError::execution(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        tracing::trace!(target: "sqlpack.cli", bytes = statement.len(), "client accepted statement");
        Ok(0)
    }
}

/// Write one statement and close stdin so the client sees end of input.
async fn feed(stdin: &mut ChildStdin, statement: &str) -> io::Result<()> {
    stdin.write_all(statement.as_bytes()).await?;
    stdin.write_all(b";\n").await?;
    stdin.shutdown().await
}
