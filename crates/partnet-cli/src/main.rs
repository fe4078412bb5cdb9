//! PartNet operator tooling: split a file into Merkle committed parts,
//! verify parts on disk, and join them back into the original file.
//!
//! On-disk layout produced by `split` and consumed by `verify`/`join`:
//! one `part_NNNN.bin` per chunk plus a `manifest.json` describing the
//! partitioning (sizes, part count, root, per-part sibling paths in hex).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use partnet_core::part_set::{Part, PartProof, PartSet, PartSetHeader};
use serde::{Deserialize, Serialize};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Parser)]
#[command(
    name = "partnet",
    version,
    about = "Split, verify, and join Merkle committed payload parts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a file into parts and write them alongside a manifest.
    Split {
        input: PathBuf,
        out_dir: PathBuf,
        /// Part size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk: usize,
    },
    /// Verify every part in a directory against its manifest.
    Verify { in_dir: PathBuf },
    /// Reassemble the original file from verified parts.
    Join { in_dir: PathBuf, output: PathBuf },
}

/// On-disk description of a split payload.
#[derive(Serialize, Deserialize)]
struct Manifest {
    version: u8,
    file_name: String,
    size_bytes: usize,
    chunk_size: usize,
    total: usize,
    root_hex: String,
    /// Per-part sibling digests, leaf to root, hex encoded.
    proofs: Vec<Vec<String>>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Split {
            input,
            out_dir,
            chunk,
        } => split(&input, &out_dir, chunk),
        Command::Verify { in_dir } => verify(&in_dir),
        Command::Join { in_dir, output } => join(&in_dir, &output),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn split(input: &Path, out_dir: &Path, chunk: usize) -> Result<(), String> {
    let data = fs::read(input).map_err(|err| format!("read {}: {err}", input.display()))?;
    let set = PartSet::from_data(&data, chunk).map_err(|err| err.to_string())?;

    fs::create_dir_all(out_dir)
        .map_err(|err| format!("create {}: {err}", out_dir.display()))?;

    let mut proofs = Vec::with_capacity(set.total());
    for index in 0..set.total() {
        let part = set
            .part(index)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("part {index} missing from a complete set"))?;
        fs::write(out_dir.join(part_file(index)), &part.bytes)
            .map_err(|err| format!("write part {index}: {err}"))?;
        proofs.push(part.proof.siblings.iter().map(hex::encode).collect());
    }

    let manifest = Manifest {
        version: 1,
        file_name: input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size_bytes: data.len(),
        chunk_size: chunk,
        total: set.total(),
        root_hex: set.root_hex(),
        proofs,
    };
    let json = serde_json::to_string_pretty(&manifest).map_err(|err| err.to_string())?;
    fs::write(out_dir.join(MANIFEST_FILE), json)
        .map_err(|err| format!("write manifest: {err}"))?;

    println!(
        "split {} into {} parts of up to {chunk} bytes, root {}",
        input.display(),
        set.total(),
        set.root_hex()
    );
    Ok(())
}

fn verify(in_dir: &Path) -> Result<(), String> {
    let (manifest, header) = load_manifest(in_dir)?;
    let set = PartSet::from_header(header);

    let mut rejected = 0;
    for index in 0..manifest.total {
        let part = load_part(in_dir, &manifest, index)?;
        match set.add_part(part) {
            Ok(_) => println!("part {index:04}: ok"),
            Err(err) => {
                rejected += 1;
                println!("part {index:04}: REJECTED ({err})");
            }
        }
    }

    if rejected > 0 {
        return Err(format!(
            "{rejected} of {} parts failed verification",
            manifest.total
        ));
    }
    println!("{} parts verified, root {}", manifest.total, set.root_hex());
    Ok(())
}

fn join(in_dir: &Path, output: &Path) -> Result<(), String> {
    let (manifest, header) = load_manifest(in_dir)?;
    let set = PartSet::from_header(header);

    for index in 0..manifest.total {
        let part = load_part(in_dir, &manifest, index)?;
        set.add_part(part)
            .map_err(|err| format!("part {index}: {err}"))?;
    }

    let mut reader = set.reader().map_err(|err| err.to_string())?;
    let mut file = fs::File::create(output)
        .map_err(|err| format!("create {}: {err}", output.display()))?;
    let written = io::copy(&mut reader, &mut file)
        .map_err(|err| format!("write {}: {err}", output.display()))?;
    if written as usize != manifest.size_bytes {
        return Err(format!(
            "reassembled {written} bytes, manifest says {}",
            manifest.size_bytes
        ));
    }

    println!(
        "joined {} parts into {} ({written} bytes, root {})",
        manifest.total,
        output.display(),
        set.root_hex()
    );
    Ok(())
}

fn load_manifest(in_dir: &Path) -> Result<(Manifest, PartSetHeader), String> {
    let path = in_dir.join(MANIFEST_FILE);
    let json =
        fs::read_to_string(&path).map_err(|err| format!("read {}: {err}", path.display()))?;
    let manifest: Manifest =
        serde_json::from_str(&json).map_err(|err| format!("parse manifest: {err}"))?;
    if manifest.proofs.len() != manifest.total {
        return Err(format!(
            "manifest lists {} proofs for {} parts",
            manifest.proofs.len(),
            manifest.total
        ));
    }
    let root = decode_digest(&manifest.root_hex)?;
    let header = PartSetHeader {
        total: manifest.total,
        root,
    };
    Ok((manifest, header))
}

fn load_part(in_dir: &Path, manifest: &Manifest, index: usize) -> Result<Part, String> {
    let path = in_dir.join(part_file(index));
    let bytes = fs::read(&path).map_err(|err| format!("read {}: {err}", path.display()))?;
    let siblings = manifest.proofs[index]
        .iter()
        .map(|digest| decode_digest(digest))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Part {
        index,
        bytes,
        proof: PartProof {
            index,
            total: manifest.total,
            siblings,
        },
    })
}

fn part_file(index: usize) -> String {
    format!("part_{index:04}.bin")
}

fn decode_digest(hex_str: &str) -> Result<[u8; 32], String> {
    let bytes =
        hex::decode(hex_str.trim()).map_err(|err| format!("invalid digest hex: {err}"))?;
    let digest: [u8; 32] = bytes
        .try_into()
        .map_err(|_| "digest must be 32 bytes".to_string())?;
    Ok(digest)
}
