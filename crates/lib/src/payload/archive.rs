//! Deterministic zip packaging.
//!
//! Entries carry a fixed timestamp (1980-01-01, the zip epoch) and fixed
//! permissions, so the archive bytes depend only on entry names and contents.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub type ArchiveError = zip::result::ZipError;

/// Pack `(name, contents)` entries into an in-memory zip archive, in the given order.
pub fn build_archive(entries: &[(&str, &[u8])]) -> Result<Vec<u8>, ArchiveError> {
  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default())
    .unix_permissions(0o644);

  let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
  for (name, contents) in entries {
    writer.start_file(*name, options)?;
    writer.write_all(contents)?;
  }

  Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Read;
  use zip::ZipArchive;

  #[test]
  fn archive_bytes_are_reproducible() {
    let first = build_archive(&[("index.js", b"exports.handler = 1;")]).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let second = build_archive(&[("index.js", b"exports.handler = 1;")]).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn archive_round_trips_contents() {
    let bytes = build_archive(&[("index.js", b"console.log('hi');")]).unwrap();

    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 1);

    let mut file = archive.by_name("index.js").unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "console.log('hi');");
  }
}
