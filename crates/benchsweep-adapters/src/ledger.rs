use benchsweep_domain::encode_row;
use benchsweep_error::LedgerError;
use benchsweep_types::{LedgerRow, ledger_header};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// The append-only results CSV.
///
/// Nothing here ever truncates or rewrites an existing file.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with the header row if it does not exist yet.
    ///
    /// Returns `true` if this call created the file.
    pub fn ensure_header(&self) -> Result<bool, LedgerError> {
        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path);

        let mut file = match created {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(source) => {
                return Err(LedgerError::Create {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        file.write_all(ledger_header().as_bytes())
            .map_err(|source| LedgerError::Create {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!(path = %self.path.display(), "created ledger");
        Ok(true)
    }

    /// Append rows, creating the file with its header first when absent.
    pub fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        self.ensure_header()?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for row in rows {
            buf.push_str(&encode_row(row));
        }

        let append_err = |source| LedgerError::Append {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;
        file.write_all(buf.as_bytes()).map_err(append_err)?;
        Ok(())
    }
}
