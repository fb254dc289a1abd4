//! stormview - command-line tool for inspecting MPQ game archives

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

use stormview::crypto::{hash_string, HashType};
use stormview::{blp, glb, Archive};

#[derive(Parser)]
#[command(name = "stormview")]
#[command(about = "Inspect MPQ archives and the assets inside them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display archive header and table information
    Info {
        /// Path to the MPQ archive
        archive: PathBuf,
    },
    /// List file names from the archive's (listfile)
    List {
        /// Path to the MPQ archive
        archive: PathBuf,
    },
    /// Extract a file by its archive-internal name
    Extract {
        /// Path to the MPQ archive
        archive: PathBuf,
        /// Archive-internal file name, e.g. "units\\custom.txt"
        name: String,
        /// Output path; defaults to the name's final component
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the lookup hashes of a file name
    Hash {
        /// File name to hash
        name: String,
    },
    /// Decode a BLP2/DXT1 texture from the archive and report on it
    Texture {
        /// Path to the MPQ archive
        archive: PathBuf,
        /// Archive-internal texture name
        name: String,
    },
    /// Split a binary glTF model from the archive and report on it
    Model {
        /// Path to the MPQ archive
        archive: PathBuf,
        /// Archive-internal model name
        name: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { archive } => info(&archive),
        Commands::List { archive } => list(&archive),
        Commands::Extract {
            archive,
            name,
            output,
        } => extract(&archive, &name, output),
        Commands::Hash { name } => {
            print_hashes(&name);
            Ok(())
        }
        Commands::Texture { archive, name } => texture(&archive, &name),
        Commands::Model { archive, name } => model(&archive, &name),
    }
}

fn open(path: &PathBuf) -> Result<(Archive, File)> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let archive = Archive::load(&mut file)
        .with_context(|| format!("failed to load archive {}", path.display()))?;
    Ok((archive, file))
}

fn info(path: &PathBuf) -> Result<()> {
    let (archive, _) = open(path)?;
    let header = archive.header();

    println!("Archive:             {}", path.display());
    println!("Format version:      {}", header.format_version);
    println!("Header size:         {} bytes", header.header_size);
    println!("Archive size:        {} bytes", header.archive_size);
    println!("Sector size:         {} bytes", header.sector_size());
    println!("Hash table:          {} entries at {:#x}",
        header.hash_table_entries,
        header.hash_table_offset_64()
    );
    println!("Block table:         {} entries at {:#x}",
        header.block_table_entries,
        header.block_table_offset_64()
    );
    println!("Live files:          {}", archive.file_count());
    Ok(())
}

fn list(path: &PathBuf) -> Result<()> {
    let (archive, mut file) = open(path)?;
    let names = archive
        .read_listfile(&mut file)
        .context("archive has no readable (listfile)")?;

    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn extract(path: &PathBuf, name: &str, output: Option<PathBuf>) -> Result<()> {
    let (archive, mut file) = open(path)?;
    let data = archive
        .read_file(&mut file, name)
        .with_context(|| format!("failed to extract {name}"))?;

    let output = output.unwrap_or_else(|| {
        let last = name.rsplit(['\\', '/']).next().unwrap_or(name);
        PathBuf::from(last)
    });
    std::fs::write(&output, &data)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("{} bytes -> {}", data.len(), output.display());
    Ok(())
}

fn print_hashes(name: &str) {
    println!("TableOffset: {:#010x}", hash_string(name, HashType::TableOffset));
    println!("NameA:       {:#010x}", hash_string(name, HashType::NameA));
    println!("NameB:       {:#010x}", hash_string(name, HashType::NameB));
    println!("FileKey:     {:#010x}", hash_string(name, HashType::FileKey));
}

fn texture(path: &PathBuf, name: &str) -> Result<()> {
    let (archive, mut file) = open(path)?;
    let data = archive
        .read_file(&mut file, name)
        .with_context(|| format!("failed to extract {name}"))?;

    let header = blp::BlpHeader::read(&data)?;
    println!("Texture:        {name}");
    println!("Dimensions:     {}x{}", header.width, header.height);
    println!("Alpha depth:    {} bit", header.alpha_depth);
    println!(
        "Mip 0 payload:  {} bytes at {:#x}",
        header.mip_sizes[0], header.mip_offsets[0]
    );

    let image = blp::decode_dxt1_texture(&data)?;
    println!(
        "Decoded:        {}x{} RGBA ({} bytes)",
        image.width(),
        image.height(),
        image.as_raw().len()
    );
    Ok(())
}

fn model(path: &PathBuf, name: &str) -> Result<()> {
    let (archive, mut file) = open(path)?;
    let data = archive
        .read_file(&mut file, name)?;

    let asset = glb::parse(&data)?;
    println!("Model:          {name}");
    println!(
        "glTF version:   {}",
        asset.asset_version().unwrap_or("unknown")
    );
    println!(
        "Binary buffer:  {}",
        match &asset.bin {
            Some(bin) => format!("{} bytes", bin.len()),
            None => "absent".to_string(),
        }
    );
    Ok(())
}
