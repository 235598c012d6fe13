use super::base::{Plugin, PluginError, PluginOutput, PluginRequest};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Out-of-process plugin speaking JSON over stdin/stdout
///
/// The child receives the request on stdin, the kernel config as `GPTR_*`
/// variables, and any extra environment (model routing) on top of the
/// inherited environment. It runs to completion: there is no timeout.
pub struct ProcessPlugin {
    name: String,
    description: String,
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ProcessPlugin {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let program = program.into();
        Self {
            description: format!("External plugin ({})", program.display()),
            name,
            program,
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Extra variables for the child, applied after the config variables
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait::async_trait]
impl Plugin for ProcessPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, request: &PluginRequest) -> Result<PluginOutput, PluginError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| PluginError::InvalidInput(e.to_string()))?;

        tracing::debug!(
            plugin = %self.name,
            program = %self.program.display(),
            args = ?self.args,
            "spawning plugin process"
        );

        // 1. Create plugin process
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .envs(request.config.to_env())
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PluginError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("plugin stdin was not captured"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("plugin stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("plugin stderr was not captured"))?;

        // 2. Feed the request and drain both streams concurrently
        let feed = async move {
            let result = stdin.write_all(&payload).await;
            drop(stdin); // close so the plugin sees EOF
            match result {
                // A plugin that exits without reading its input is not our failure.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        let (feed_result, stdout_result, stderr_result) = tokio::join!(
            feed,
            read_to_string(&mut stdout),
            read_to_string(&mut stderr)
        );
        feed_result?;

        // 3. Wait for the process to exit
        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(1);

        tracing::debug!(plugin = %self.name, exit_code, "plugin process finished");

        Ok(PluginOutput {
            stdout: stdout_result?,
            stderr: stderr_result?,
            exit_code,
        })
    }
}

/// Helper function to read a stream to string
async fn read_to_string<R: AsyncReadExt + Unpin>(reader: &mut R) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(String::from_utf8_lossy(&buffer).to_string())
}
