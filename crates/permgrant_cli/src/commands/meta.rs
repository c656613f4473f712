use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

use crate::Cli;

const BIN_NAME: &str = "permgrant";

fn completion_script(shell: clap_complete::Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut out = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut out);
    out
}

fn render(cmd: clap::Command) -> Result<Vec<u8>, std::io::Error> {
    let mut out = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut out)?;
    Ok(out)
}

/// Write `permgrant.1` plus one page per subcommand (`permgrant-invoke.1`, ...).
fn write_man_pages(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    std::fs::create_dir_all(dir)?;

    let mut cmd = Cli::command();
    cmd.build();

    let mut written = Vec::new();
    let main_page = dir.join(format!("{BIN_NAME}.1"));
    std::fs::write(&main_page, render(cmd.clone())?)?;
    written.push(main_page);

    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        // build() sets display names like "permgrant-invoke"
        let name = sub.get_display_name().unwrap_or(sub.get_name());
        let path = dir.join(format!("{name}.1"));
        std::fs::write(&path, render(sub.clone())?)?;
        written.push(path);
    }

    Ok(written)
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    std::io::stdout().write_all(&completion_script(shell))?;
    Ok(())
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(dir) => {
            let pages = write_man_pages(&dir)?;
            tracing::info!("Wrote {} man pages to {}", pages.len(), dir.display());
        }
        None => {
            std::io::stdout().write_all(&render(Cli::command())?)?;
        }
    }

    Ok(())
}
