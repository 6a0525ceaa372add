use std::path::{Path, PathBuf};

use patrol_engine::{AssetExporter, Error, Result};

const SAMPLE_APP_SUBPATH: &str = "sample-app";

/// Exports the bundled sample app for `sample_app_language` under a fixed
/// `<export_root>/sample-app` path and removes it on cleanup. The bundled
/// sources themselves are out of scope here; a real deployment would vendor
/// one directory per supported language under `export_root` and copy the
/// matching one into place.
pub struct FilesystemAssetExporter {
    export_root: PathBuf,
}

impl FilesystemAssetExporter {
    pub fn new(export_root: impl Into<PathBuf>) -> Self {
        Self {
            export_root: export_root.into(),
        }
    }

    pub fn target_path(&self) -> PathBuf {
        self.export_root.join(SAMPLE_APP_SUBPATH)
    }
}

impl AssetExporter for FilesystemAssetExporter {
    fn export(&self, sample_app_language: &str) -> Result<PathBuf> {
        let target = self.target_path();
        std::fs::create_dir_all(&target)
            .map_err(|e| Error::Internal(format!("could not export sample app: {e}")))?;
        std::fs::write(target.join(".language"), sample_app_language)
            .map_err(|e| Error::Internal(format!("could not export sample app: {e}")))?;
        Ok(target)
    }

    fn cleanup(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_dir_all(path).map_err(|e| Error::Internal(format!("could not clean asset directory: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_then_cleanup_round_trips() {
        let dir = std::env::temp_dir().join(format!("patrol-cli-test-{}", std::process::id()));
        let exporter = FilesystemAssetExporter::new(dir.clone());

        let exported = exporter.export("go").unwrap();
        assert!(exported.exists());
        assert_eq!(exported, dir.join("sample-app"));

        exporter.cleanup(&exported).unwrap();
        assert!(!exported.exists());
    }

    #[test]
    fn cleanup_of_missing_path_is_not_an_error() {
        let exporter = FilesystemAssetExporter::new(std::env::temp_dir().join("patrol-cli-test-missing"));
        assert!(exporter.cleanup(Path::new("/nonexistent/definitely-not-here")).is_ok());
    }
}
