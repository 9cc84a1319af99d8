//! Ownership of the unpacked FMU directory.

use std::io::Read;
use std::path::Path;

use crate::PackageError;

const MODEL_DESCRIPTION: &str = "modelDescription.xml";

/// The unpacked FMU on disk.
///
/// Held behind an [`std::sync::Arc`] by libraries and, transitively, by
/// instances; the backing temporary directory is removed when the last
/// holder drops.
#[derive(Debug)]
pub struct FmuResource {
    dir: tempfile::TempDir,
}

impl FmuResource {
    /// Extract the archive at `archive` into a fresh temporary directory.
    pub fn unpack(archive: impl AsRef<Path>) -> Result<Self, PackageError> {
        let archive = archive.as_ref();
        let dir = tempfile::Builder::new().prefix("fmi2-").tempdir()?;
        log::trace!(
            "Extracting {} into {}",
            archive.display(),
            dir.path().display()
        );
        extract_archive(archive, dir.path())?;
        Ok(Self { dir })
    }

    /// Absolute path of the unpacked directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Read `modelDescription.xml` from the archive root.
    pub fn model_description_xml(&self) -> Result<String, PackageError> {
        let mut xml = String::new();
        std::fs::File::open(self.path().join(MODEL_DESCRIPTION))?.read_to_string(&mut xml)?;
        Ok(xml)
    }

    /// `file://` URI of the `resources` directory, passed to
    /// `fmi2Instantiate`.
    pub fn resource_url(&self) -> url::Url {
        url::Url::from_file_path(self.path().join("resources"))
            .expect("unpack directory is not an absolute path")
    }
}

impl Drop for FmuResource {
    fn drop(&mut self) {
        log::trace!("Removing unpacked FMU at {}", self.dir.path().display());
    }
}

fn extract_archive(archive: &Path, outdir: &Path) -> Result<(), PackageError> {
    let file = std::fs::File::open(archive)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(name) => outdir.join(name),
            None => {
                return Err(PackageError::Archive(zip::result::ZipError::InvalidArchive(
                    "entry escapes the archive root",
                )))
            }
        };
        if file.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut outfile = std::fs::File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_test_archive(entries: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
        let opts = zip::write::FileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        file
    }

    #[test]
    fn test_unpack_and_cleanup() {
        let archive = write_test_archive(&[
            ("modelDescription.xml", "<fmiModelDescription/>"),
            ("resources/data.txt", "payload"),
        ]);

        let resource = FmuResource::unpack(archive.path()).unwrap();
        let dir = resource.path().to_path_buf();
        assert!(dir.join("modelDescription.xml").is_file());
        assert!(dir.join("resources/data.txt").is_file());
        assert_eq!(
            resource.model_description_xml().unwrap(),
            "<fmiModelDescription/>"
        );
        assert!(resource.resource_url().as_str().starts_with("file://"));

        drop(resource);
        assert!(!dir.exists());
    }

    #[test]
    fn test_unpack_missing_file() {
        let res = FmuResource::unpack("/no/such/file.fmu");
        assert!(matches!(res, Err(PackageError::Io(_))));
    }

    #[test]
    fn test_unpack_not_an_archive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a zip archive").unwrap();
        let res = FmuResource::unpack(file.path());
        assert!(matches!(res, Err(PackageError::Archive(_))));
    }
}
