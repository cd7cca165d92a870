//! Subprocess generator.
//!
//! Runs a CLI (by default `claude -p --output-format json`), writes the
//! prompt to its stdin and parses the plan out of its stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::parse::parse_response;
use super::prompt::build_prompt;
use super::trait_def::PlanGenerator;
use super::types::{GenerationRequest, GeneratorError, GeneratorResponse};

/// Stderr is truncated to this many bytes in error messages.
const STDERR_SNIPPET_BYTES: usize = 1024;

/// Generator backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub const DEFAULT_PROGRAM: &str = "claude";

    /// Default arguments for the `claude` CLI.
    pub fn default_args() -> Vec<String> {
        ["-p", "--output-format", "json"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Use `claude` from `$PATH` with [`Self::default_args`].
    pub fn new() -> Self {
        Self::with_command(Self::DEFAULT_PROGRAM, Self::default_args())
    }

    /// Use a custom command, e.g. a wrapper script or a different model CLI.
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for CommandGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanGenerator for CommandGenerator {
    fn name(&self) -> &str {
        &self.program
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratorResponse, GeneratorError> {
        let prompt = build_prompt(request);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out attempt drops this future; take the child with it.
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| GeneratorError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A command that exits without reading its input closes the pipe;
            // its exit status is the more useful error.
            match stdin.write_all(prompt.as_bytes()).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GeneratorError::Exit {
                status: output.status.to_string(),
                stderr: truncate_snippet(stderr.trim(), STDERR_SNIPPET_BYTES),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(
            program = %self.program,
            prompt_bytes = prompt.len(),
            output_bytes = stdout.len(),
            "generator finished"
        );
        parse_response(&stdout)
    }
}

/// Truncate on a char boundary at or below `max_bytes`.
fn truncate_snippet(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mealplan_db::models::PlanningRules;
    use uuid::Uuid;

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            PlanningRules::default(),
        )
    }

    fn sh(script: &str) -> CommandGenerator {
        CommandGenerator::with_command("sh", vec!["-c".to_owned(), script.to_owned()])
    }

    #[test]
    fn default_runs_claude_json() {
        let generator = CommandGenerator::default();
        assert_eq!(generator.name(), "claude");
        assert_eq!(generator.args, vec!["-p", "--output-format", "json"]);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_snippet("short", 10), "short");
        assert_eq!(truncate_snippet("héllo", 2), "h...");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn parses_stdout_of_command() {
        let generator = sh(
            r#"cat > /dev/null; echo '{"meals": [{"day": "monday", "meal_type": "dinner", "recipe_name": "Chili"}], "summary": "ok"}'"#,
        );
        let response = generator.generate(&request()).await.unwrap();
        assert_eq!(response.meals.len(), 1);
        assert_eq!(response.summary, "ok");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn prompt_is_written_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("prompt.txt");
        let script = format!(
            r#"cat > '{}'; echo '{{"meals": []}}'"#,
            capture.display()
        );
        sh(&script).generate(&request()).await.unwrap();

        let prompt = std::fs::read_to_string(&capture).unwrap();
        assert!(prompt.starts_with("# Weekly Meal Planner"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let generator = sh("cat > /dev/null; echo 'quota exceeded' >&2; exit 3");
        let err = generator.generate(&request()).await.unwrap_err();
        match err {
            GeneratorError::Exit { stderr, .. } => assert_eq!(stderr, "quota exceeded"),
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let generator =
            CommandGenerator::with_command("/nonexistent/mealplan-generator", Vec::new());
        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Spawn { .. }));
    }
}
