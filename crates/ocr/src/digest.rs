use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Lowercase hex SHA-256 of a file's contents.
///
/// Reported after every run so two runs over the same inputs can be compared
/// without diffing the exported tables.
pub fn file_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex(&hasher.finalize()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            file_digest(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "PAN_NUMBER,FULL_NAME,Image\n").unwrap();
        std::fs::write(&b, "PAN_NUMBER,FULL_NAME,Image\n").unwrap();
        assert_eq!(file_digest(&a).unwrap(), file_digest(&b).unwrap());
        std::fs::write(&b, "PAN_NUMBER,FULL_NAME,Image\nABCPE1234F,,x.jpg\n").unwrap();
        assert_ne!(file_digest(&a).unwrap(), file_digest(&b).unwrap());
        assert_eq!(file_digest(&a).unwrap().len(), 64);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(file_digest(Path::new("/definitely/not/here.csv")).is_err());
    }
}
