//! Managed `~/.ssh/config` entries for instances.
//!
//! Every entry this tool writes is introduced by a marker comment so it can
//! be found and removed later without touching anything the user wrote:
//!
//! ```text
//! # lambda-cli instance <id>
//! Host <alias>
//!     HostName <ip>
//!     User ubuntu
//!     ForwardAgent yes
//!     StrictHostKeyChecking no
//!     UserKnownHostsFile /dev/null
//! ```
//!
//! Host key checking is relaxed on purpose: instance IPs are recycled
//! across tenants, so pinned keys would go stale within days.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

/// Marker comment prefix identifying entries this tool owns.
const MARKER_PREFIX: &str = "# lambda-cli instance ";

/// Login user baked into instance images.
const SSH_USER: &str = "ubuntu";

/// A managed host entry parsed back from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedEntry {
    /// Instance ID from the marker comment.
    pub instance_id: String,
    /// Host alias.
    pub alias: String,
    /// Target address.
    pub host_name: String,
}

/// Editor for the user's SSH config file.
pub struct SshConfigManager {
    path: PathBuf,
}

impl SshConfigManager {
    /// Manager over `~/.ssh/config`.
    ///
    /// # Errors
    /// Fails when the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(Self {
            path: home.join(".ssh").join("config"),
        })
    }

    /// Manager over an explicit path. Lets tests work in a temp dir.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the underlying config file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default alias for an instance: `lambda-` plus the ID prefix.
    #[must_use]
    pub fn default_alias(instance_id: &str) -> String {
        let prefix: String = instance_id.chars().take(8).collect();
        format!("lambda-{prefix}")
    }

    /// Append a managed entry for `instance_id` pointing at `ip`.
    ///
    /// # Errors
    /// Fails when `alias` is already taken by any `Host` line, managed or
    /// not, or on I/O problems.
    pub fn add(&self, instance_id: &str, alias: &str, ip: &str) -> Result<()> {
        let content = self.read()?;

        let host_line = format!("Host {alias}");
        if content.lines().any(|line| line.trim() == host_line) {
            bail!("SSH config already has a 'Host {alias}' entry");
        }

        let mut updated = content;
        if !updated.is_empty() {
            if !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push('\n');
        }
        updated.push_str(&format!(
            "{MARKER_PREFIX}{instance_id}\n\
             Host {alias}\n\
             \x20   HostName {ip}\n\
             \x20   User {SSH_USER}\n\
             \x20   ForwardAgent yes\n\
             \x20   StrictHostKeyChecking no\n\
             \x20   UserKnownHostsFile /dev/null\n"
        ));

        self.write(&updated)?;
        info!(
            instance = instance_id,
            alias,
            config = %self.path.display(),
            "Added SSH config entry"
        );
        Ok(())
    }

    /// Remove every managed entry, returning how many were removed. User
    /// content is preserved byte for byte; the file is not rewritten when
    /// there was nothing to remove.
    ///
    /// # Errors
    /// Fails on I/O problems.
    pub fn remove_all(&self) -> Result<usize> {
        let content = self.read()?;
        let (updated, removed) = strip_managed(&content);
        if removed > 0 {
            self.write(&updated)?;
            info!(removed, config = %self.path.display(), "Removed managed SSH config entries");
        }
        Ok(removed)
    }

    /// Managed entries currently in the file.
    ///
    /// # Errors
    /// Fails on I/O problems.
    pub fn entries(&self) -> Result<Vec<ManagedEntry>> {
        Ok(parse_managed(&self.read()?))
    }

    fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn write(&self, content: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
                }
            }
        }

        fs::write(&self.path, content)
            .with_context(|| format!("writing {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

/// Drop managed blocks from `content`. Returns the remaining content and
/// the number of blocks removed.
fn strip_managed(content: &str) -> (String, usize) {
    let lines: Vec<&str> = content.lines().collect();
    let mut kept: Vec<&str> = Vec::new();
    let mut removed = 0;
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with(MARKER_PREFIX) {
            // Also drop the blank separator written above the marker.
            if kept.last().is_some_and(|line| line.trim().is_empty()) {
                kept.pop();
            }
            i += 1;
            if i < lines.len() && lines[i].starts_with("Host ") {
                i += 1;
                while i < lines.len() && (lines[i].starts_with(' ') || lines[i].starts_with('\t'))
                {
                    i += 1;
                }
            }
            removed += 1;
        } else {
            kept.push(lines[i]);
            i += 1;
        }
    }

    let mut result = kept.join("\n");
    if !result.is_empty() && content.ends_with('\n') {
        result.push('\n');
    }
    (result, removed)
}

/// Parse managed blocks without modifying anything.
fn parse_managed(content: &str) -> Vec<ManagedEntry> {
    let lines: Vec<&str> = content.lines().collect();
    let mut entries = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(instance_id) = lines[i].strip_prefix(MARKER_PREFIX) else {
            i += 1;
            continue;
        };

        let mut alias = String::new();
        let mut host_name = String::new();
        i += 1;
        if i < lines.len() {
            if let Some(rest) = lines[i].strip_prefix("Host ") {
                alias = rest.trim().to_string();
                i += 1;
                while i < lines.len() && (lines[i].starts_with(' ') || lines[i].starts_with('\t'))
                {
                    if let Some(rest) = lines[i].trim_start().strip_prefix("HostName ") {
                        host_name = rest.trim().to_string();
                    }
                    i += 1;
                }
            }
        }

        entries.push(ManagedEntry {
            instance_id: instance_id.trim().to_string(),
            alias,
            host_name,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const USER_CONTENT: &str = "Host personal\n    HostName example.com\n    User me\n";

    fn manager(dir: &TempDir) -> SshConfigManager {
        SshConfigManager::with_path(dir.path().join("config"))
    }

    #[test]
    fn test_add_creates_entry() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        mgr.add("inst-0123456789ab", "lambda-inst-012", "203.0.113.5")
            .unwrap();

        let content = fs::read_to_string(mgr.path()).unwrap();
        assert!(content.starts_with("# lambda-cli instance inst-0123456789ab\n"));
        assert!(content.contains("Host lambda-inst-012\n"));
        assert!(content.contains("    HostName 203.0.113.5\n"));
        assert!(content.contains("    User ubuntu\n"));
    }

    #[test]
    fn test_add_rejects_duplicate_alias() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        mgr.add("inst-1", "gpu-box", "203.0.113.5").unwrap();
        let err = mgr.add("inst-2", "gpu-box", "203.0.113.6").unwrap_err();

        assert!(err.to_string().contains("already has"));
    }

    #[test]
    fn test_add_preserves_existing_content() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        fs::write(mgr.path(), USER_CONTENT).unwrap();

        mgr.add("inst-1", "gpu-box", "203.0.113.5").unwrap();

        let content = fs::read_to_string(mgr.path()).unwrap();
        assert!(content.starts_with(USER_CONTENT));
        assert!(content.contains("\n\n# lambda-cli instance inst-1\n"));
    }

    #[test]
    fn test_remove_strips_only_managed_blocks() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        fs::write(mgr.path(), USER_CONTENT).unwrap();

        mgr.add("inst-1", "gpu-one", "203.0.113.5").unwrap();
        mgr.add("inst-2", "gpu-two", "203.0.113.6").unwrap();

        let removed = mgr.remove_all().unwrap();
        assert_eq!(removed, 2);

        // User content must come back byte for byte.
        assert_eq!(fs::read_to_string(mgr.path()).unwrap(), USER_CONTENT);
    }

    #[test]
    fn test_remove_without_managed_entries_is_noop() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        fs::write(mgr.path(), USER_CONTENT).unwrap();

        assert_eq!(mgr.remove_all().unwrap(), 0);
        assert_eq!(fs::read_to_string(mgr.path()).unwrap(), USER_CONTENT);
    }

    #[test]
    fn test_remove_on_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        assert_eq!(mgr.remove_all().unwrap(), 0);
        assert!(!mgr.path().exists());
    }

    #[test]
    fn test_entries_parse_back() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        mgr.add("inst-1", "gpu-one", "203.0.113.5").unwrap();
        mgr.add("inst-2", "gpu-two", "203.0.113.6").unwrap();

        let entries = mgr.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].instance_id, "inst-1");
        assert_eq!(entries[0].alias, "gpu-one");
        assert_eq!(entries[1].host_name, "203.0.113.6");
    }

    #[test]
    fn test_default_alias_uses_id_prefix() {
        assert_eq!(
            SshConfigManager::default_alias("0123456789abcdef"),
            "lambda-01234567"
        );
        assert_eq!(SshConfigManager::default_alias("ab12"), "lambda-ab12");
    }

    #[cfg(unix)]
    #[test]
    fn test_config_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        mgr.add("inst-1", "gpu-box", "203.0.113.5").unwrap();

        let mode = fs::metadata(mgr.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
