//! Platform service bindings
//!
//! Each binding is a directory under the bindings root. The `type` and
//! `provider` files describe it; every other file is a secret entry keyed by
//! its file name.

use crate::error::{PakError, PakResult};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Binding type carrying per-checksum URI overrides
pub const DEPENDENCY_MAPPING_TYPE: &str = "dependency-mapping";

/// Binding type carrying per-host download mirrors
pub const DEPENDENCY_MIRROR_TYPE: &str = "dependency-mirror";

/// One service binding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub path: PathBuf,
    pub binding_type: String,
    pub provider: String,
    pub secret: BTreeMap<String, String>,
}

/// All bindings visible to the buildpack
#[derive(Debug, Clone, Default)]
pub struct Bindings(Vec<Binding>);

impl Bindings {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self(bindings)
    }

    /// Bindings root from `$SERVICE_BINDING_ROOT`, then `$CNB_BINDINGS`,
    /// then `<platform>/bindings`
    pub fn root(platform: &Path) -> PathBuf {
        for var in ["SERVICE_BINDING_ROOT", "CNB_BINDINGS"] {
            if let Ok(root) = env::var(var) {
                if !root.is_empty() {
                    return PathBuf::from(root);
                }
            }
        }
        platform.join("bindings")
    }

    /// Read every binding directory under `root`; a missing root means none
    pub fn from_path(root: &Path) -> PakResult<Self> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(PakError::io(
                    format!("listing bindings in {}", root.display()),
                    e,
                ))
            }
        };

        let mut bindings = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| PakError::io(format!("listing {}", root.display()), e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            bindings.push(read_binding(&path)?);
        }
        bindings.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("Found {} bindings in {}", bindings.len(), root.display());
        Ok(Self(bindings))
    }

    /// Bindings whose type matches `binding_type`, case-insensitively
    pub fn of_type<'a>(&'a self, binding_type: &'a str) -> impl Iterator<Item = &'a Binding> {
        self.0
            .iter()
            .filter(move |b| b.binding_type.eq_ignore_ascii_case(binding_type))
    }

    /// Merge the secrets of every binding of `binding_type`; later bindings win
    pub fn merged_secrets(&self, binding_type: &str) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for binding in self.of_type(binding_type) {
            merged.extend(binding.secret.clone());
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn read_binding(path: &Path) -> PakResult<Binding> {
    let mut binding = Binding {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        ..Binding::default()
    };

    let entries =
        fs::read_dir(path).map_err(|e| PakError::io(format!("listing {}", path.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PakError::io(format!("listing {}", path.display()), e))?;
        let file = entry.path();
        // Kubernetes projects secrets through hidden `..data` directories
        if !file.is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let key = entry.file_name().to_string_lossy().into_owned();
        let value = fs::read_to_string(&file)
            .map_err(|e| PakError::io(format!("reading binding entry {}", file.display()), e))?
            .trim()
            .to_string();

        match key.as_str() {
            "type" => binding.binding_type = value,
            "provider" => binding.provider = value,
            _ => {
                binding.secret.insert(key, value);
            }
        }
    }

    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write_binding(root: &Path, name: &str, binding_type: &str, secret: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{}\n", binding_type)).unwrap();
        for (k, v) in secret {
            fs::write(dir.join(k), v).unwrap();
        }
    }

    #[test]
    fn reads_bindings() {
        let temp = TempDir::new().unwrap();
        write_binding(
            temp.path(),
            "mirror",
            DEPENDENCY_MIRROR_TYPE,
            &[("default", "https://mirror.example/base")],
        );
        write_binding(temp.path(), "other", "ca-certificates", &[("ca.pem", "---")]);

        let bindings = Bindings::from_path(temp.path()).unwrap();
        assert_eq!(bindings.len(), 2);

        let mirrors: Vec<_> = bindings.of_type(DEPENDENCY_MIRROR_TYPE).collect();
        assert_eq!(mirrors.len(), 1);
        assert_eq!(mirrors[0].binding_type, "dependency-mirror");
        assert_eq!(mirrors[0].secret["default"], "https://mirror.example/base");
        assert!(!mirrors[0].secret.contains_key("type"));
    }

    #[test]
    fn merged_secrets_later_wins() {
        let temp = TempDir::new().unwrap();
        write_binding(temp.path(), "a", DEPENDENCY_MAPPING_TYPE, &[("abc", "https://a")]);
        write_binding(temp.path(), "b", DEPENDENCY_MAPPING_TYPE, &[("abc", "https://b")]);

        let bindings = Bindings::from_path(temp.path()).unwrap();
        assert_eq!(
            bindings.merged_secrets(DEPENDENCY_MAPPING_TYPE)["abc"],
            "https://b"
        );
    }

    #[test]
    fn missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let bindings = Bindings::from_path(&temp.path().join("nope")).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    #[serial]
    fn root_precedence() {
        env::remove_var("SERVICE_BINDING_ROOT");
        env::remove_var("CNB_BINDINGS");
        assert_eq!(
            Bindings::root(Path::new("/platform")),
            PathBuf::from("/platform/bindings")
        );

        env::set_var("CNB_BINDINGS", "/cnb");
        assert_eq!(Bindings::root(Path::new("/platform")), PathBuf::from("/cnb"));

        env::set_var("SERVICE_BINDING_ROOT", "/sbr");
        assert_eq!(Bindings::root(Path::new("/platform")), PathBuf::from("/sbr"));

        env::remove_var("SERVICE_BINDING_ROOT");
        env::remove_var("CNB_BINDINGS");
    }
}
