// RFIDE - Robot Framework IDE core
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shell completion scripts

use crate::error::CliError;
use clap::Command;
use clap_complete::{generate, Generator};
use std::io;

/// Write the completion script of `cmd` for `generator` to stdout.
///
/// # Examples
///
/// ```no_run
/// use clap::Command;
/// use clap_complete::shells::Bash;
/// use rfide_cli::commands::generate_completion_for_command;
///
/// # fn main() -> Result<(), rfide_cli::error::CliError> {
/// let mut cmd = Command::new("rfide");
/// generate_completion_for_command(Bash, &mut cmd)?;
/// # Ok(())
/// # }
/// ```
pub fn generate_completion_for_command<G: Generator>(
    generator: G,
    cmd: &mut Command,
) -> Result<(), CliError> {
    let name = cmd.get_name().to_string();
    generate(generator, cmd, name, &mut io::stdout());
    Ok(())
}

/// Installation instructions for the completions of `shell`.
///
/// Shell names are case-insensitive. Unknown shells get
/// `"Unsupported shell"`.
///
/// ```
/// use rfide_cli::commands::print_installation_instructions;
///
/// assert!(print_installation_instructions("Zsh").contains("zsh"));
/// assert_eq!(print_installation_instructions("tcsh"), "Unsupported shell");
/// ```
pub fn print_installation_instructions(shell: &str) -> String {
    match shell.to_lowercase().as_str() {
        "bash" => {
            r#"# Bash completion installation:

# For current session only:
eval "$(rfide completion bash)"

# For persistent installation:
rfide completion bash > ~/.local/share/bash-completion/completions/rfide
"#
        }
        "zsh" => {
            r#"# Zsh completion installation:

# For current session only:
eval "$(rfide completion zsh)"

# For persistent installation (directory must be in $fpath):
rfide completion zsh > ~/.zsh/completions/_rfide
"#
        }
        "fish" => {
            r#"# Fish completion installation:

rfide completion fish > ~/.config/fish/completions/rfide.fish
"#
        }
        "powershell" | "pwsh" => {
            r#"# PowerShell completion installation:

# Add this line to the profile at $PROFILE:
rfide completion powershell | Out-String | Invoke-Expression
"#
        }
        "elvish" => {
            r#"# Elvish completion installation:

# Add this line to ~/.elvish/rc.elv:
eval (rfide completion elvish)
"#
        }
        _ => "Unsupported shell",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installation_instructions_per_shell() {
        for shell in ["bash", "zsh", "fish", "elvish"] {
            let text = print_installation_instructions(shell);
            assert!(text.contains(shell), "{shell}");
            assert!(text.contains("rfide completion"));
        }
        assert!(print_installation_instructions("pwsh").contains("PowerShell"));
    }

    #[test]
    fn test_installation_instructions_case_insensitive() {
        assert_eq!(
            print_installation_instructions("bash"),
            print_installation_instructions("BASH")
        );
    }
}
