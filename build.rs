//! Build script generating manual pages from the CLI definition.
//!
//! Writes `chunkwire.1` plus one page per subcommand, e.g.
//! `chunkwire-listen.1`, into `target/generated-man`.

use std::{fs, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
#[expect(dead_code, reason = "only the clap definitions are needed here")]
mod cli;

fn render(man: &Man, page: &str, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf: Vec<u8> = Vec::new();
    man.render(&mut buf)?;
    fs::write(out_dir.join(format!("{page}.1")), buf)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = Path::new("target/generated-man");
    fs::create_dir_all(out_dir)?;

    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        let page = format!("{}-{}", cmd.get_name(), sub.get_name());
        render(&Man::new(sub.clone()).title(page.clone()), &page, out_dir)?;
    }
    let page = cmd.get_name().to_owned();
    render(&Man::new(cmd), &page, out_dir)
}
