use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use hershel::{apply_patch, select_patch, ChecksumKey};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hershel")]
#[command(about = "NDS ROM patcher supporting OpenPatch's patch format", long_about = None)]
#[command(version)]
struct Cli {
    /// The ROM to patch
    input: PathBuf,

    /// The patch or database where the patch can be found
    patch: PathBuf,

    /// The path where to put the patched ROM
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Apply the patch to the input file itself
    #[arg(short, long)]
    in_place: bool,

    /// Force the patch for the ROM matching this CRC-32 to be used
    #[arg(short, long)]
    crc32: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "✗".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let dest = resolve_destination(&cli);

    if !cli.input.exists() {
        bail!("the ROM does not exist: {}", cli.input.display());
    }
    if !cli.patch.exists() {
        bail!("the patch file does not exist: {}", cli.patch.display());
    }

    // A supplied CRC-32 is authoritative: if it is malformed the run dies
    // rather than falling back to recomputation.
    let key = match &cli.crc32 {
        Some(raw) => ChecksumKey::normalize(raw)?,
        None => {
            println!("{}", "Computing the ROM's CRC-32...".dimmed());
            let rom = fs::read(&cli.input)
                .with_context(|| format!("failed to read {}", cli.input.display()))?;
            ChecksumKey::of_bytes(&rom)
        }
    };

    let database = fs::read_to_string(&cli.patch)
        .with_context(|| format!("failed to read {}", cli.patch.display()))?;
    let record = select_patch(&database, &key)?;

    println!("{}", format!("Patching (CRC-32 {key})...").bold());

    apply_patch(&cli.input, &dest, &record, |edit| {
        println!(
            "{} 0x{:08x}: {} -> {}",
            "✓".green(),
            edit.offset,
            edit.expected_hex(),
            edit.replacement_hex()
        );
    })?;

    println!(
        "\n{} The patched ROM is at {}",
        "Patching completed.".green().bold(),
        dest.display()
    );

    Ok(())
}

/// Destination precedence: explicit --output, then --in-place, then a
/// `<input> (Patched).nds` sibling of the input.
fn resolve_destination(cli: &Cli) -> PathBuf {
    if let Some(output) = &cli.output {
        output.clone()
    } else if cli.in_place {
        cli.input.clone()
    } else {
        default_output_path(&cli.input)
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let name = input.to_string_lossy();
    let stem = name.strip_suffix(".nds").unwrap_or(&name).to_string();
    PathBuf::from(format!("{stem} (Patched).nds"))
}
