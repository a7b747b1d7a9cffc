//! Integration tests for Specify

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Isolated config, cache and working directory
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            fs::create_dir_all(temp.path().join("work")).unwrap();
            // Unroutable source so nothing reaches the network
            fs::write(
                temp.path().join("config.toml"),
                "[templates]\napi_base = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n",
            )
            .unwrap();
            Self { temp }
        }

        fn path(&self) -> &Path {
            self.temp.path()
        }

        fn work(&self) -> PathBuf {
            self.path().join("work")
        }

        fn cache(&self) -> PathBuf {
            self.path().join("cache")
        }

        fn specify(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("specify");
            cmd.current_dir(self.work())
                .env("SPECIFY_CONFIG", self.path().join("config.toml"))
                .env("SPECIFY_CACHE_DIR", self.cache())
                .env_remove("CI");
            cmd
        }

        /// A release archive with a wrapper directory and a mixed layout
        fn template_zip(&self) -> PathBuf {
            let path = self.path().join("spec-kit-cache-template.zip");
            let file = File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::FileOptions::default();

            let files = [
                (
                    "spec-kit-templates/.claude/commands/specify.md",
                    "Templates live in {{.AIAssistantFolder}}/templates\n",
                ),
                (
                    "spec-kit-templates/.gemini/commands/specify.toml",
                    "description = \"Specify for {{.AIAssistantName}}\"\n",
                ),
                (
                    "spec-kit-templates/templates/spec-template.md",
                    "# Feature Specification: [FEATURE NAME]\n",
                ),
                (
                    "spec-kit-templates/memory/constitution.md",
                    "# Project Constitution\n",
                ),
                (
                    "spec-kit-templates/content/agents-template.md",
                    "# Agents\n\n<specify>\nCommands for {{.AIAssistant}} live in {{.AIAssistantFolder}}/commands\n</specify>\n",
                ),
            ];
            for (name, content) in files {
                zip.start_file(name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
            path
        }

        fn sync(&self) {
            self.specify()
                .args(["templates", "sync", "--archive"])
                .arg(self.template_zip())
                .assert()
                .success()
                .stdout(predicate::str::contains("Synced 5 template files"));
        }
    }

    #[test]
    fn help_displays() {
        Sandbox::new()
            .specify()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("spec-driven development"));
    }

    #[test]
    fn version_displays() {
        Sandbox::new()
            .specify()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("specify"));
    }

    #[test]
    fn config_path() {
        let sandbox = Sandbox::new();
        sandbox
            .specify()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        Sandbox::new()
            .specify()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[templates]"))
            .stdout(predicate::str::contains("http://127.0.0.1:9"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        Sandbox::new()
            .specify()
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_set_updates_file() {
        let sandbox = Sandbox::new();
        sandbox
            .specify()
            .args(["config", "set", "init.default_agent", "gemini"])
            .assert()
            .success();

        let text = fs::read_to_string(sandbox.path().join("config.toml")).unwrap();
        assert!(text.contains("default_agent = \"gemini\""));
        assert!(text.contains("api_base = \"http://127.0.0.1:9\""));
    }

    #[test]
    fn completions_bash() {
        Sandbox::new()
            .specify()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("_specify"));
    }

    #[test]
    fn status_of_empty_cache() {
        Sandbox::new()
            .specify()
            .args(["templates", "status", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"empty\": true"));
    }

    #[test]
    fn sync_from_archive_then_status() {
        let sandbox = Sandbox::new();
        sandbox.sync();

        assert!(sandbox.cache().join(".manifest.json").is_file());
        assert!(sandbox.cache().join("memory/constitution.md").is_file());
        assert!(!sandbox.cache().join("spec-kit-templates").exists());

        sandbox
            .specify()
            .args(["templates", "status", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"valid\": true"))
            .stdout(predicate::str::contains("\"entries\": 5"));

        // Second sync is a no-op without --force
        sandbox
            .specify()
            .args(["templates", "sync"])
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));
    }

    #[test]
    fn init_from_cache() {
        let sandbox = Sandbox::new();
        sandbox.sync();

        sandbox
            .specify()
            .args(["init", "demo", "--ai", "gemini", "--no-git", "--ignore-agent-tools"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Project ready"));

        let project = sandbox.work().join("demo");
        assert_eq!(
            fs::read_to_string(project.join(".gemini/commands/specify.toml")).unwrap(),
            "description = \"Specify for Gemini CLI\"\n"
        );
        assert!(project.join(".gemini/templates/spec-template.md").is_file());
        assert!(project.join("memory/constitution.md").is_file());
        assert!(!project.join(".claude").exists());
        assert!(!project.join("content").exists());
        assert!(!project.join(".manifest.json").exists());

        let agents = fs::read_to_string(project.join("AGENTS.md")).unwrap();
        assert!(agents.starts_with("# Agent Instructions\n"));
        assert!(agents.contains("Commands for gemini live in .gemini/commands"));
        assert!(!project.join("CLAUDE.md").exists());
    }

    #[test]
    fn init_claude_writes_pointer_document() {
        let sandbox = Sandbox::new();
        sandbox.sync();

        sandbox
            .specify()
            .args(["init", "demo", "--ai", "claude", "--no-git", "--ignore-agent-tools"])
            .assert()
            .success();

        let project = sandbox.work().join("demo");
        assert_eq!(
            fs::read_to_string(project.join(".claude/commands/specify.md")).unwrap(),
            "Templates live in .claude/templates\n"
        );
        let claude = fs::read_to_string(project.join("CLAUDE.md")).unwrap();
        assert!(claude.contains("<specify>you MUST follow the RULES in AGENTS.md</specify>"));
    }

    #[test]
    fn init_here_requires_force_when_not_empty() {
        let sandbox = Sandbox::new();
        sandbox.sync();
        fs::write(sandbox.work().join("AGENTS.md"), "# Team notes\n").unwrap();

        sandbox
            .specify()
            .args(["init", "--here", "--ai", "codex", "--no-git"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cancelled"));
        assert!(!sandbox.work().join(".codex").exists());

        sandbox
            .specify()
            .args(["init", "--here", "--ai", "codex", "--no-git", "--force"])
            .assert()
            .success();

        let agents = fs::read_to_string(sandbox.work().join("AGENTS.md")).unwrap();
        assert!(agents.starts_with("# Team notes\n\n<specify>"));
        assert!(sandbox.work().join(".codex/templates/spec-template.md").is_file());
    }

    #[test]
    fn init_existing_directory_fails() {
        let sandbox = Sandbox::new();
        fs::create_dir_all(sandbox.work().join("taken")).unwrap();

        sandbox
            .specify()
            .args(["init", "taken", "--ai", "claude", "--no-git"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Directory already exists"));
    }

    #[test]
    fn init_without_cache_or_network_cleans_up() {
        let sandbox = Sandbox::new();

        sandbox
            .specify()
            .args(["init", "demo", "--ai", "claude", "--no-git", "--ignore-agent-tools"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to prepare templates automatically"))
            .stderr(predicate::str::contains("specify templates sync"));

        assert!(!sandbox.work().join("demo").exists());
    }

    #[test]
    fn init_rejects_unknown_agent() {
        Sandbox::new()
            .specify()
            .args(["init", "demo", "--ai", "cursor", "--no-git"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("claude, codex, copilot, gemini"));
    }

    #[test]
    fn feature_outside_repository_fails() {
        Sandbox::new()
            .specify()
            .args(["feature", "paths"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not inside a git repository"));
    }

    #[test]
    fn check_reports_without_failing() {
        Sandbox::new()
            .specify()
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("Template cache"))
            .stdout(predicate::str::contains("Unreachable"));
    }
}
