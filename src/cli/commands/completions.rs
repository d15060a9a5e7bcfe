//! Completions command - generate shell completion scripts.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io;

/// Arguments for the completions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai completions bash > ~/.local/share/bash-completion/completions/wikai\n    \
    wikai completions zsh > ~/.zfunc/_wikai\n    \
    wikai completions fish > ~/.config/fish/completions/wikai.fish")]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Writes completions for `cmd` to stdout.
pub fn generate_completions(cmd: &mut Command, shell: Shell) {
    generate(shell, cmd, "wikai", &mut io::stdout());
}
