use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use beef_generator::{GlobalGenerator, Profile, Registry};
use clap::Parser;

/// Generates Beef OpenGL bindings from the Khronos gl.xml registry.
#[derive(Parser, Debug)]
#[command(author, about)]
struct Cli {
    /// OpenGL registry XML (gl.xml)
    xml: PathBuf,

    /// Target OpenGL version, e.g. "3.3"
    #[arg(short, long)]
    version: String,

    /// API profile of the target version: none, core or compatibility
    #[arg(short, long, default_value = "none")]
    profile: String,

    /// Namespace of the generated GL class
    #[arg(short, long, default_value = "opengl")]
    namespace: String,

    /// Output file
    #[arg(short, long, default_value = "GL.bf")]
    out: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();

    let profile = match args.profile.as_str() {
        "none" => Profile::None,
        "core" => Profile::Core,
        "compatibility" => Profile::Compatibility,
        other => bail!("unknown profile `{}` (expected none, core or compatibility)", other),
    };

    println!("Parsing OpenGL specification.");
    let file = File::open(&args.xml)
        .with_context(|| format!("Reading {}", args.xml.display()))?;
    let registry = Registry::parse(BufReader::new(file)).context("Parsing registry XML")?;

    let full = registry
        .full_version(&args.version, profile)
        .with_context(|| format!("Composing OpenGL {}", args.version))?;

    println!("Generating Beef file.");
    let mut bindings = Vec::new();
    full.write_bindings(GlobalGenerator::new(args.namespace.clone()), &mut bindings)
        .context("Generating bindings")?;

    // rendered fully in memory first, so a failed run leaves no partial file behind
    fs::write(&args.out, bindings).with_context(|| format!("Writing {}", args.out.display()))?;

    println!(
        "Wrote {} enums and {} functions for OpenGL {} to {}.",
        full.enums.len(),
        full.cmds.len(),
        full.version,
        args.out.display()
    );

    Ok(())
}
