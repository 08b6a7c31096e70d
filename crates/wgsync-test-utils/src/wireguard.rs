//! [`TestWireGuard`] builder for base-directory test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Checked-in sample base directory (`wg0.conf`, `wg0/`, `wg-show-dump.txt`).
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/wireguard")
}

/// A temporary WireGuard base directory with helpers for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use wgsync_test_utils::TestWireGuard;
///
/// let wg = TestWireGuard::new();
/// wg.interface_file("wg0", "[Interface]\nAddress = 10.0.0.1/24\n");
/// wg.peer_file("wg0", "laptop", "[Peer]\nPublicKey = ...\n");
/// wg.assert_file_exists("wg0/laptop.conf");
/// ```
pub struct TestWireGuard {
    temp_dir: TempDir,
}

impl Default for TestWireGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWireGuard {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// A base directory pre-populated from [`fixtures_dir`].
    pub fn from_fixtures() -> Self {
        let wg = Self::new();
        copy_tree(&fixtures_dir(), wg.root());
        wg
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `<iface>/<iface>.conf`, creating the folder.
    pub fn interface_file(&self, interface: &str, content: &str) {
        let folder = self.path(interface);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(format!("{interface}.conf")), content).unwrap();
    }

    /// Write `<iface>/<name>.conf`, creating the folder.
    pub fn peer_file(&self, interface: &str, name: &str, content: &str) {
        let folder = self.path(interface);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(format!("{name}.conf")), content).unwrap();
    }

    /// Write the merged `<iface>.conf`.
    pub fn canonical(&self, interface: &str, content: &str) {
        fs::write(self.path(&format!("{interface}.conf")), content).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        let full_path = self.path(relative);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Sorted file names directly under `<iface>/`.
    pub fn folder_files(&self, interface: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path(interface))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    pub fn assert_file_not_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let file_content = self.read(relative);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            relative,
            content,
            file_content
        );
    }
}

fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}
