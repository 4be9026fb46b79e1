use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::models::listing::Listing;

pub fn listings_path(output_dir: impl AsRef<Path>, level2: &str) -> PathBuf {
    output_dir.as_ref().join(format!("listings_{level2}.jsonl"))
}

pub fn error_dump_path(error_dir: impl AsRef<Path>, level2: &str, page: u32) -> PathBuf {
    error_dir
        .as_ref()
        .join(format!("error_{level2}_page_{page}.json"))
}

/// Writes one JSON object per line, replacing whatever was at `path`.
pub fn write_listings_jsonl(listings: &[Listing], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(create_file(path)?);

    for listing in listings {
        serde_json::to_writer(&mut writer, listing)
            .with_context(|| format!("Failed to serialize listing {}", listing.id))?;
        writer.write_all(b"\n")?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Dumps a raw page payload as JSON indented by four spaces.
pub fn save_payload_json(payload: &Value, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(create_file(path)?);

    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut writer, formatter);
    payload
        .serialize(&mut serializer)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}
