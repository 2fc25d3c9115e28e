//! PathSandbox - confines model-supplied paths to the working directory

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ToolError;

/// Resolves untrusted paths against a fixed root
///
/// Every call re-canonicalizes the root and re-validates the target, so a
/// symlink swapped in between two calls is still caught. Nothing is cached.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "PathSandbox::new: called");
        Self { root }
    }

    /// Root as configured (not canonicalized)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical form of the root, or an IO error if it does not exist
    pub fn canonical_root(&self) -> Result<PathBuf, ToolError> {
        Ok(self.root.canonicalize()?)
    }

    /// Resolve a path that may not exist yet
    ///
    /// Returns the canonical absolute path of the target: the root itself or
    /// a strict descendant. Symlinks in the existing part of the path are
    /// followed before the containment check.
    ///
    /// `..` is collapsed lexically before any symlink is followed, so
    /// `link/..` names the root even when `link` points somewhere deeper.
    /// This can differ from what the OS would open, but the result is always
    /// canonicalized and re-checked, so it never leaves the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let path = path.as_ref();
        debug!(?path, "PathSandbox::resolve: called");
        let root = self.canonical_root()?;

        // Lexical check first so escapes never probe the filesystem outside the root
        let lexical = normalize(&root.join(path));
        if !lexical.starts_with(&root) {
            debug!(?lexical, "PathSandbox::resolve: lexical escape");
            return Err(self.violation(path));
        }

        let mut existing = lexical.as_path();
        let mut tail: Vec<&OsStr> = Vec::new();
        let canonical = loop {
            match existing.canonicalize() {
                Ok(c) => break c,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // A dangling symlink can still be written through
                    if is_symlink(existing) {
                        debug!(?existing, "PathSandbox::resolve: dangling symlink");
                        return Err(self.violation(path));
                    }
                    match (existing.parent(), existing.file_name()) {
                        (Some(parent), Some(name)) => {
                            tail.push(name);
                            existing = parent;
                        }
                        _ => return Err(ToolError::Io(e)),
                    }
                }
                Err(e) => return Err(ToolError::Io(e)),
            }
        };

        let resolved = tail.iter().rev().fold(canonical, |acc, name| acc.join(name));
        if resolved.starts_with(&root) {
            debug!(?resolved, "PathSandbox::resolve: within root");
            Ok(resolved)
        } else {
            debug!(?resolved, "PathSandbox::resolve: symlink escape");
            Err(self.violation(path))
        }
    }

    /// Resolve a path that must already exist
    ///
    /// The containment check runs before the existence check.
    pub fn resolve_existing(&self, path: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let path = path.as_ref();
        debug!(?path, "PathSandbox::resolve_existing: called");
        let resolved = self.resolve(path)?;

        if resolved.try_exists()? {
            Ok(resolved)
        } else {
            debug!(?resolved, "PathSandbox::resolve_existing: not found");
            Err(ToolError::NotFound {
                path: path.to_path_buf(),
            })
        }
    }

    fn violation(&self, path: &Path) -> ToolError {
        ToolError::SandboxViolation {
            path: path.to_path_buf(),
            root: self.root.clone(),
        }
    }
}

/// Collapse `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, PathSandbox, PathBuf) {
        let temp = tempdir().unwrap();
        let root = temp.path().join("calculator");
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("main.py"), "print('hi')").unwrap();
        fs::write(root.join("pkg/calculator.py"), "x = 1").unwrap();
        let canonical = root.canonicalize().unwrap();
        (temp, PathSandbox::new(root), canonical)
    }

    #[test]
    fn test_resolve_descendant() {
        let (_temp, sandbox, root) = setup();
        let resolved = sandbox.resolve("pkg/calculator.py").unwrap();
        assert_eq!(resolved, root.join("pkg/calculator.py"));
    }

    #[test]
    fn test_resolve_dot_is_root() {
        let (_temp, sandbox, root) = setup();
        assert_eq!(sandbox.resolve(".").unwrap(), root);
        assert_eq!(sandbox.resolve("").unwrap(), root);
        assert_eq!(sandbox.resolve("pkg/..").unwrap(), root);
    }

    #[test]
    fn test_resolve_parent_escape() {
        let (_temp, sandbox, _root) = setup();
        let err = sandbox.resolve("../secrets.txt").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));

        let err = sandbox.resolve("pkg/../../calculator/../x").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[test]
    fn test_resolve_absolute_outside() {
        let (_temp, sandbox, _root) = setup();
        let err = sandbox.resolve("/etc/passwd").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[test]
    fn test_resolve_absolute_inside() {
        let (_temp, sandbox, root) = setup();
        let resolved = sandbox.resolve(root.join("main.py")).unwrap();
        assert_eq!(resolved, root.join("main.py"));
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_rejected() {
        let (temp, sandbox, _root) = setup();
        let sibling = temp.path().join("calculator2");
        fs::create_dir_all(&sibling).unwrap();
        fs::write(sibling.join("x.py"), "").unwrap();

        let err = sandbox.resolve("../calculator2/x.py").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));

        let err = sandbox.resolve(sibling.join("x.py")).unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[test]
    fn test_resolve_nonexistent_allowed() {
        let (_temp, sandbox, root) = setup();
        let resolved = sandbox.resolve("new/dir/out.txt").unwrap();
        assert_eq!(resolved, root.join("new/dir/out.txt"));
    }

    #[test]
    fn test_resolve_existing_not_found() {
        let (_temp, sandbox, _root) = setup();
        let err = sandbox.resolve_existing("missing.py").unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_existing_escape_reported_before_missing() {
        let (_temp, sandbox, _root) = setup();
        let err = sandbox.resolve_existing("../does-not-exist").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let temp = tempdir().unwrap();
        let sandbox = PathSandbox::new(temp.path().join("nope"));
        let err = sandbox.resolve("main.py").unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (temp, sandbox, _root) = setup();
        let outside = temp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(&outside, sandbox.root().join("link")).unwrap();

        let err = sandbox.resolve("link/secret.txt").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));

        // New files beneath the link are rejected too
        let err = sandbox.resolve("link/new.txt").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_rejected() {
        let (temp, sandbox, _root) = setup();
        std::os::unix::fs::symlink(temp.path().join("ghost.txt"), sandbox.root().join("ghost")).unwrap();

        let err = sandbox.resolve("ghost").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_allowed() {
        let (_temp, sandbox, root) = setup();
        std::os::unix::fs::symlink(root.join("pkg"), root.join("alias")).unwrap();

        let resolved = sandbox.resolve("alias/calculator.py").unwrap();
        assert_eq!(resolved, root.join("pkg/calculator.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_of_symlink_is_lexical() {
        let (_temp, sandbox, root) = setup();
        fs::create_dir_all(root.join("pkg/deep")).unwrap();
        std::os::unix::fs::symlink(root.join("pkg/deep"), root.join("link")).unwrap();

        // The OS would give root/pkg/main.py; the sandbox drops `link` first
        let resolved = sandbox.resolve("link/../main.py").unwrap();
        assert_eq!(resolved, root.join("main.py"));

        assert_eq!(sandbox.resolve("link/..").unwrap(), root);
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_of_outside_symlink_stays_in_root() {
        let (temp, sandbox, root) = setup();
        let outside = temp.path().join("elsewhere/nested");
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("out")).unwrap();

        let resolved = sandbox.resolve("out/../main.py").unwrap();
        assert_eq!(resolved, root.join("main.py"));
        assert!(matches!(
            sandbox.resolve("out/x").unwrap_err(),
            ToolError::SandboxViolation { .. }
        ));
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("..".to_string()),
            Just(".".to_string()),
            Just("pkg".to_string()),
            "[a-z]{1,6}",
        ]
    }

    proptest! {
        #[test]
        fn prop_resolved_paths_stay_inside_root(segments in prop::collection::vec(segment(), 0..8)) {
            let (_temp, sandbox, root) = setup();
            let relative = segments.join("/");

            if let Ok(resolved) = sandbox.resolve(&relative) {
                prop_assert!(resolved.starts_with(&root));
            }
        }

        #[test]
        fn prop_leading_parent_always_escapes(name in "[a-z]{1,8}") {
            let (_temp, sandbox, _root) = setup();
            let result = sandbox.resolve(format!("../{}", name));
            prop_assert!(matches!(result, Err(ToolError::SandboxViolation { .. })), "escaped: {:?}", result);
        }
    }
}
