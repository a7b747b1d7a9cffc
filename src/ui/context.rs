//! Terminal detection: rich output on a TTY, plain lines in CI and pipes

use std::io::IsTerminal;

/// Variables set by common CI systems
const CI_VARS: [&str; 9] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// How a command talks to the user
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    /// Prompts, spinners and progress bars are drawn
    interactive: bool,
    /// Merge into a non-empty `--here` directory without asking
    force: bool,
}

impl UiContext {
    /// Interactive only when stdin and stdout are terminals outside CI
    pub fn detect() -> Self {
        let interactive = std::io::stdin().is_terminal()
            && std::io::stdout().is_terminal()
            && !running_in_ci(|var| std::env::var_os(var).is_some());
        Self {
            interactive,
            force: false,
        }
    }

    /// Plain lines and default answers
    pub fn plain() -> Self {
        Self {
            interactive: false,
            force: false,
        }
    }

    /// Set from `init --force`
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

fn running_in_ci(is_set: impl Fn(&str) -> bool) -> bool {
    CI_VARS.iter().any(|var| is_set(var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_context_never_prompts() {
        let ctx = UiContext::plain();
        assert!(!ctx.is_interactive());
        assert!(!ctx.use_fancy_output());
        assert!(!ctx.force());
    }

    #[test]
    fn force_comes_from_init_flag() {
        assert!(UiContext::plain().with_force(true).force());
        assert!(!UiContext::plain().with_force(false).force());
    }

    #[test]
    fn ci_variables_disable_prompts() {
        assert!(running_in_ci(|var| var == "GITHUB_ACTIONS"));
        assert!(running_in_ci(|var| var == "CI"));
        assert!(!running_in_ci(|var| var == "HOME"));
    }
}
