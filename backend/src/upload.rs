use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::config::ALLOWED_EXTENSIONS;

pub struct UploadedImage {
    pub filename: String,
    pub size: usize,
    spool: TempUpload,
}

impl UploadedImage {
    pub fn new(filename: String, size: usize, spool: TempUpload) -> Self {
        Self {
            filename,
            size,
            spool,
        }
    }

    pub fn path(&self) -> &Path {
        self.spool.path()
    }
}

// On-disk spool for one upload; removed on drop, success or failure.
pub struct TempUpload {
    file: NamedTempFile,
}

impl TempUpload {
    pub fn new(request_id: Uuid) -> std::io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!("xray-{}-", request_id))
            .tempfile()?;
        Ok(Self { file })
    }

    pub fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.file.write_all(data)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_and_jpeg_extensions_pass() {
        assert!(has_allowed_extension("scan.png"));
        assert!(has_allowed_extension("scan.jpg"));
        assert!(has_allowed_extension("scan.jpeg"));
        assert!(has_allowed_extension("SCAN.PNG"));
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert!(!has_allowed_extension("scan.gif"));
        assert!(!has_allowed_extension("scan.dcm"));
        assert!(!has_allowed_extension("scan"));
        assert!(!has_allowed_extension(""));
    }

    #[test]
    fn spool_holds_bytes_while_alive() {
        let mut spool = TempUpload::new(Uuid::new_v4()).unwrap();
        spool.write_all(b"not really an image").unwrap();
        assert!(spool.path().exists());
        assert_eq!(std::fs::read(spool.path()).unwrap(), b"not really an image");
    }

    #[test]
    fn spool_is_deleted_on_drop() {
        let path = {
            let spool = TempUpload::new(Uuid::new_v4()).unwrap();
            spool.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn spools_get_distinct_paths() {
        let a = TempUpload::new(Uuid::new_v4()).unwrap();
        let b = TempUpload::new(Uuid::new_v4()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
