//! Build script for generating the `achim` man pages.
//!
//! Packaging picks the pages up from the build output directory: `achim.1`
//! for the top-level command plus one `achim-<subcommand>.1` per subcommand.

use std::env;
use std::io::Write;

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn render(command: clap::Command, title: &str) -> Result<Vec<u8>, std::io::Error> {
    let mut buffer = Vec::new();
    Man::new(command).title(title).render(&mut buffer)?;
    Ok(buffer)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var("OUT_DIR").map(Utf8PathBuf::from).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
    })?;
    let dir = Dir::open_ambient_dir(&out_dir, ambient_authority())?;

    let command = Cli::command();
    dir.write("achim.1", render(command.clone(), "achim")?)?;
    for sub in command.get_subcommands() {
        let name = format!("achim-{}", sub.get_name());
        let page = render(sub.clone(), &name)?;
        dir.write(format!("{name}.1"), page)?;
    }

    Ok(())
}
