//! Fee-payer keypair loading.

use std::path::{Path, PathBuf};

use solana_keypair::Keypair;
use thiserror::Error;

/// Keypair loading errors.
#[derive(Debug, Error)]
pub enum SigningError {
    /// Keypair file is missing, unreadable, or does not hold a valid keypair.
    #[error("failed to load keypair {path}: {message}")]
    Load {
        /// File path.
        path: PathBuf,
        /// Reader or key validation error.
        message: String,
    },
}

/// Loads a keypair stored in the Solana CLI format (JSON array of 64 bytes).
///
/// # Errors
///
/// Returns [`SigningError::Load`] when the file cannot be read, parsed, or validated.
pub fn read_keypair_file(path: impl AsRef<Path>) -> Result<Keypair, SigningError> {
    let path = path.as_ref();
    solana_keypair::read_keypair_file(path).map_err(|error| SigningError::Load {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use solana_signer::Signer;

    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "splitter-{tag}-{}.json",
            Keypair::new().pubkey()
        ))
    }

    #[test]
    fn reads_cli_keypair_file() {
        let keypair = Keypair::new();
        let path = scratch_path("payer");
        assert!(solana_keypair::write_keypair_file(&keypair, &path).is_ok());

        let loaded = read_keypair_file(&path);
        let _ignored = std::fs::remove_file(&path);

        assert!(loaded.is_ok());
        if let Ok(loaded) = loaded {
            assert_eq!(loaded.pubkey(), keypair.pubkey());
        }
    }

    #[test]
    fn rejects_short_key_material() {
        let path = scratch_path("short");
        assert!(std::fs::write(&path, "[1, 2, 3]").is_ok());

        let loaded = read_keypair_file(&path);
        let _ignored = std::fs::remove_file(&path);

        assert!(matches!(loaded, Err(SigningError::Load { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let result = read_keypair_file("/nonexistent/splitter/id.json");
        assert!(matches!(result, Err(SigningError::Load { .. })));
        if let Err(error) = result {
            assert!(error.to_string().contains("/nonexistent/splitter/id.json"));
        }
    }
}
