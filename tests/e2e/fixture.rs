//! Isolated workspace for driving the `config-learn` binary end to end.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use chrono::Utc;
use serde_json::{Value, json};
use tempfile::TempDir;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

pub struct E2EFixture {
    pub scenario: String,
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub data_root: PathBuf,
    pub project: PathBuf,
    step: usize,
}

impl E2EFixture {
    pub fn new(scenario: &str) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let data_root = root.join("data");
        let project = root.join("project");
        std::fs::create_dir_all(data_root.join("candidates")).expect("data root");
        std::fs::create_dir_all(&project).expect("project dir");
        println!("[E2E] Scenario {scenario} in {}", root.display());
        Self {
            scenario: scenario.to_string(),
            _temp_dir: temp_dir,
            root,
            data_root,
            project,
            step: 0,
        }
    }

    pub fn log_step(&mut self, description: &str) {
        self.step += 1;
        println!("[E2E] {} step {}: {description}", self.scenario, self.step);
    }

    /// Append permission candidates observed today.
    pub fn add_permission_candidates(&self, rules: &[&str]) {
        let lines: Vec<Value> = rules
            .iter()
            .map(|rule| {
                json!({
                    "description": format!("Allow {rule} without prompting"),
                    "priority": 1,
                    "payload": {"kind": "permission", "rule": rule, "occurrences": 6},
                    "occurrences": 6,
                    "confidence": 0.9,
                    "observed_at": Utc::now().to_rfc3339(),
                })
            })
            .collect();
        self.write_candidates("permission", &lines);
    }

    pub fn write_candidates(&self, category: &str, lines: &[Value]) {
        let body: String = lines.iter().map(|line| format!("{line}\n")).collect();
        std::fs::write(
            self.data_root.join("candidates").join(format!("{category}.jsonl")),
            body,
        )
        .expect("write candidates");
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_config-learn"));
        cmd.current_dir(&self.root)
            .env("CONFIG_LEARN_ROOT", &self.data_root)
            .env("CONFIG_LEARN_CONFIG", self.root.join("no-such-config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .args(args);
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .expect("run config-learn");
        CommandOutput::from_output(&output)
    }

    /// Run with `input` piped to stdin, then closed.
    pub fn run_with_input(&self, args: &[&str], input: &str) -> CommandOutput {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn config-learn");
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(input.as_bytes())
            .expect("write stdin");
        let output = child.wait_with_output().expect("wait config-learn");
        CommandOutput::from_output(&output)
    }

    pub fn assert_success(&self, output: &CommandOutput, label: &str) {
        assert_eq!(
            output.exit_code, 0,
            "{label} failed\nstdout:\n{}\nstderr:\n{}",
            output.stdout, output.stderr
        );
    }

    pub fn read_project(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.project.join(relative)).ok()
    }

    pub fn rejection_lines(&self) -> Vec<Value> {
        std::fs::read_to_string(self.data_root.join("rejections.jsonl"))
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).expect("rejection line"))
            .collect()
    }
}
