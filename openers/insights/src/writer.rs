use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::info;

use crate::{document::InsightsDocument, error::InsightsError};

/// Encodes a document as pretty JSON.
///
/// # Errors
///
/// Fails when the document cannot be encoded.
pub fn to_json(document: &InsightsDocument) -> Result<String, InsightsError> {
    serde_json::to_string_pretty(document).map_err(InsightsError::Encode)
}

/// Writes `document` to `path` atomically.
///
/// The JSON is written to a temporary file in the destination directory and
/// renamed over `path` only once complete, so readers see either the previous
/// document or the new one, never a partial file.
///
/// # Errors
///
/// Fails when the document cannot be encoded, staged, or moved into place.
pub fn write_document(path: impl AsRef<Path>, document: &InsightsDocument) -> Result<(), InsightsError> {
    let path = path.as_ref();
    let encoded = to_json(document)?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let write_error = |source| InsightsError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(&directory).map_err(write_error)?;
    let mut staging = NamedTempFile::new_in(&directory).map_err(write_error)?;
    staging.write_all(encoded.as_bytes()).map_err(write_error)?;
    staging.write_all(b"\n").map_err(write_error)?;
    staging.as_file().sync_all().map_err(write_error)?;
    staging.persist(path).map_err(|source| InsightsError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        findings = document.findings.len(),
        bytes = encoded.len(),
        "insights document written"
    );
    Ok(())
}

/// Reads and validates a document written by [`write_document`].
///
/// # Errors
///
/// Fails when the file cannot be read or decoded.
pub fn read_document(path: impl AsRef<Path>) -> Result<InsightsDocument, InsightsError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| InsightsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| InsightsError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use openers_battery::HypothesisBattery;
    use openers_corpus::{FeatureTableBuilder, Talk};
    use tempfile::tempdir;

    use super::*;
    use crate::serializer::InsightsSerializer;

    fn sample() -> InsightsDocument {
        let talks: Vec<Talk> = (0..12)
            .map(|id| Talk::new(id, format!("Talk {id}"), 1_000 * (id + 1), "Why are we here?"))
            .collect();
        let table = FeatureTableBuilder::default().build(&talks);
        let report = HypothesisBattery::default().run(&table);
        let generated_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        InsightsSerializer::default().serialize(&report, &table, generated_at)
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/insights.json");
        let document = sample();
        write_document(&path, &document).unwrap();
        assert_eq!(read_document(&path).unwrap(), document);
    }

    #[test]
    fn overwrites_previous_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("insights.json");
        fs::write(&path, "stale").unwrap();
        write_document(&path, &sample()).unwrap();
        assert!(read_document(&path).is_ok());
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("insights.json");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let error = write_document(&blocked, &sample()).unwrap_err();
        assert!(matches!(error, InsightsError::Persist { .. }));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("insights.json")]);
    }

    #[test]
    fn rejects_invalid_documents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"provenance\": 1}").unwrap();
        assert!(matches!(read_document(&path), Err(InsightsError::Decode { .. })));
        assert!(matches!(
            read_document(dir.path().join("missing.json")),
            Err(InsightsError::Read { .. })
        ));
    }
}
