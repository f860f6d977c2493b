//! Binary snapshots of storm collections.
//!
//! Snapshots are the compact counterpart of the CSV format: a magic header,
//! a version byte, then the bincode-encoded reference system and flattened
//! observations. Files are written to a temporary sibling and atomically
//! renamed over the destination.

use crate::collection::StormCollection;
use crate::error::{Result, StormError};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use stormtrack_types::crs::Crs;
use stormtrack_types::point::StormPoint;

const SNAPSHOT_MAGIC: &[u8] = b"STORMTRACK_SNAPSHOT";
const SNAPSHOT_VERSION: u8 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    crs: Crs,
    points: Vec<&'a StormPoint>,
}

#[derive(Deserialize)]
struct SnapshotBody {
    crs: Crs,
    points: Vec<StormPoint>,
}

/// Encode a collection into `writer`.
pub fn write_snapshot<W: Write>(collection: &StormCollection, mut writer: W) -> Result<()> {
    writer.write_all(SNAPSHOT_MAGIC)?;
    writer.write_all(&[SNAPSHOT_VERSION])?;

    let body = SnapshotRef {
        crs: collection.crs(),
        points: collection.points().collect(),
    };
    bincode::serialize_into(&mut writer, &body)?;
    writer.flush()?;
    Ok(())
}

/// Decode a collection, re-validating every observation.
pub fn read_snapshot<R: Read>(mut reader: R) -> Result<StormCollection> {
    let mut magic = vec![0u8; SNAPSHOT_MAGIC.len()];
    reader.read_exact(&mut magic).map_err(|_| {
        StormError::InvalidFormat("file is too short to be a storm snapshot".to_string())
    })?;
    if magic != SNAPSHOT_MAGIC {
        return Err(StormError::InvalidFormat(
            "missing storm snapshot header".to_string(),
        ));
    }

    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != SNAPSHOT_VERSION {
        return Err(StormError::InvalidFormat(format!(
            "unsupported snapshot version {}",
            version[0]
        )));
    }

    let body: SnapshotBody = bincode::deserialize_from(reader)?;
    StormCollection::from_points(body.points, body.crs)
}

/// A snapshot file on disk.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<StormCollection> {
        let file = File::open(&self.path)?;
        read_snapshot(BufReader::new(file))
    }

    pub fn save(&self, collection: &StormCollection) -> Result<()> {
        let temp_path = self.temp_path();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(file);
        write_snapshot(collection, &mut writer)?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let mut new_name = name.to_string_lossy().into_owned();
            new_name.push_str(".tmp");
            temp.set_file_name(new_name);
        }
        temp
    }
}
