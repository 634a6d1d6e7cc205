// ABOUTME: Zip handling for pipeline artifacts.
// ABOUTME: Reads single entries from input artifacts and packages the stack template.

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::deploy::error::DeployError;

/// Read one entry of a zip archive as UTF-8 text. `Ok(None)` if it is absent.
pub fn read_entry(archive: &[u8], name: &str) -> Result<Option<String>, DeployError> {
    let mut archive = ZipArchive::new(Cursor::new(archive))?;
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| DeployError::Archive(format!("{}: {}", name, e)))?;
    Ok(Some(text))
}

/// Package a template as the only file of a new zip archive.
pub fn package_template(filename: &str, template: &str) -> Result<Vec<u8>, DeployError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(filename, options)?;
    writer
        .write_all(template.as_bytes())
        .map_err(|e| DeployError::Archive(format!("{}: {}", filename, e)))?;
    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packaged_template_reads_back() {
        let archive = package_template("template.json", r#"{"Resources":{}}"#).unwrap();

        let text = read_entry(&archive, "template.json").unwrap();
        assert_eq!(text.as_deref(), Some(r#"{"Resources":{}}"#));

        let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
        assert_eq!(zip.len(), 1);
        assert_eq!(zip.by_index(0).unwrap().name(), "template.json");
    }

    #[test]
    fn absent_entry_is_none() {
        let archive = package_template("a.txt", "a").unwrap();
        assert_eq!(read_entry(&archive, "manifest.json").unwrap(), None);
    }

    #[test]
    fn garbage_is_an_archive_error() {
        let err = read_entry(b"not a zip", "manifest.json").unwrap_err();
        assert!(matches!(err, DeployError::Archive(_)));
    }
}
