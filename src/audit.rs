use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Durable, ordered record of every human message the bot sees.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record. Data must be flushed before this returns.
    async fn append(&self, sender_id: &str, text: &str, name: &str) -> Result<()>;
}

/// Appends `sender_id,text,name` rows to a CSV file.
pub struct CsvAuditLog {
    path: PathBuf,
    // Held across open-write-sync so concurrent requests never interleave rows.
    write_lock: Mutex<()>,
}

impl CsvAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<File> {
        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        options.mode(0o600);
        options
            .open(&self.path)
            .await
            .with_context(|| format!("Couldn't open audit log: {}", self.path.display()))
    }
}

#[async_trait]
impl AuditSink for CsvAuditLog {
    async fn append(&self, sender_id: &str, text: &str, name: &str) -> Result<()> {
        let row = csv_row(&[sender_id, text, name]);

        let _guard = self.write_lock.lock().await;
        let mut file = self.open().await?;
        file.write_all(row.as_bytes())
            .await
            .with_context(|| format!("Failed to write audit log: {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("Failed to write audit log: {}", self.path.display()))?;
        file.sync_data()
            .await
            .with_context(|| format!("Failed to sync audit log: {}", self.path.display()))?;

        debug!("Audit row written for sender {}", sender_id);
        Ok(())
    }
}

/// Render one CSV record terminated by `\n`.
pub fn csv_row(fields: &[&str]) -> String {
    let mut row = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            row.push(',');
        }
        if needs_quotes(field) {
            row.push('"');
            row.push_str(&field.replace('"', "\"\""));
            row.push('"');
        } else {
            row.push_str(field);
        }
    }
    row.push('\n');
    row
}

fn needs_quotes(field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    if field == r"\." {
        return true;
    }
    field.contains([',', '"', '\r', '\n']) || field.starts_with(char::is_whitespace)
}
