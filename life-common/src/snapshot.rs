use crate::geometry::DeadZone;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A recorded board state at a specific generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Generation counter at the time the snapshot was taken.
    pub generation: u64,
    pub rows: u32,
    pub cols: u32,
    /// Centering offset of the grid inside the container, in logical pixels.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Container size in logical pixels.
    pub logical_width: f64,
    pub logical_height: f64,
    pub live_cells: u32,
    /// Row-major cell ages (0 = dead).
    pub ages: Vec<u16>,
    pub dead_zones: Vec<DeadZone>,
}

/// On-disk encodings for a list of snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SnapshotFormat {
    /// Maps the `output.format` setting; unknown names are rejected.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(SnapshotFormat::Json),
            "bincode" | "bin" => Ok(SnapshotFormat::Bincode),
            "messagepack" | "msgpack" => Ok(SnapshotFormat::MessagePack),
            other => anyhow::bail!("Unknown snapshot format '{}'", other),
        }
    }

    /// Guesses the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => SnapshotFormat::Bincode,
            Some("msgpack") => SnapshotFormat::MessagePack,
            _ => SnapshotFormat::Json,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
            SnapshotFormat::MessagePack => "msgpack",
        }
    }
}

pub fn write_snapshots(path: &Path, format: SnapshotFormat, snapshots: &[Snapshot]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        SnapshotFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        SnapshotFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;
    Ok(())
}

pub fn read_snapshots(path: &Path, format: SnapshotFormat) -> Result<Vec<Snapshot>> {
    let file = File::open(path)
        .with_context(|| format!("Error opening snapshot file '{}'", path.display()))?;
    let reader = BufReader::new(file);
    let snapshots = match format {
        SnapshotFormat::Json => serde_json::from_reader(reader)
            .context("Error reading JSON snapshots")?,
        SnapshotFormat::Bincode => bincode::deserialize_from(reader)
            .context("Error reading bincode snapshots")?,
        SnapshotFormat::MessagePack => rmp_serde::decode::from_read(reader)
            .context("Error reading MessagePack snapshots")?,
    };
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            generation: 7,
            rows: 2,
            cols: 3,
            offset_x: 1.0,
            offset_y: 2.0,
            logical_width: 26.0,
            logical_height: 20.0,
            live_cells: 2,
            ages: vec![0, 1, 0, 0, 4, 0],
            dead_zones: vec![DeadZone::new(0, 1, 0, 1)],
        }
    }

    #[test]
    fn written_file_is_readable_by_extension() {
        let path = std::env::temp_dir().join(format!("life_common_snapshot_test_{}.bin", std::process::id()));
        write_snapshots(&path, SnapshotFormat::Bincode, &[sample()]).unwrap();
        let format = SnapshotFormat::from_path(&path);
        let back = read_snapshots(&path, format).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(format, SnapshotFormat::Bincode);
        assert_eq!(back, vec![sample()]);
    }

    #[test]
    fn reading_a_missing_file_is_an_error() {
        let missing = Path::new("no/such/dir/snapshots.json");
        assert!(read_snapshots(missing, SnapshotFormat::Json).is_err());
    }

    #[test]
    fn format_names() {
        assert_eq!(SnapshotFormat::from_name("JSON").unwrap(), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_name("msgpack").unwrap(), SnapshotFormat::MessagePack);
        assert!(SnapshotFormat::from_name("csv").is_err());
    }
}
