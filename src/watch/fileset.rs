// src/watch/fileset.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

/// A glob pattern list plus the machinery to match and enumerate it.
///
/// Patterns are interpreted relative to the project root. Matching uses
/// forward-slash relative paths (e.g. `"src/main.elm"`). Enumeration walks
/// the literal base directory of each pattern and is repeated on every
/// resolve call, so the result always reflects the current filesystem.
#[derive(Clone)]
pub struct FileSet {
    root: PathBuf,
    patterns: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
    /// One matcher plus literal base dir per pattern, so enumeration can
    /// report where each file sits relative to its pattern.
    per_pattern: Vec<(GlobMatcher, PathBuf)>,
}

impl fmt::Debug for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSet")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl FileSet {
    /// Compile a file set from include and exclude patterns.
    pub fn new(
        root: impl Into<PathBuf>,
        patterns: Vec<String>,
        excludes: Vec<String>,
    ) -> Result<Self> {
        let root = root.into();

        let include_set = build_globset(&patterns)
            .with_context(|| format!("building include globset for {:?}", patterns))?;
        let exclude_set = if excludes.is_empty() {
            None
        } else {
            Some(
                build_globset(&excludes)
                    .with_context(|| format!("building exclude globset for {:?}", excludes))?,
            )
        };

        let mut per_pattern = Vec::with_capacity(patterns.len());
        for pat in &patterns {
            let matcher = Glob::new(pat)
                .with_context(|| format!("invalid glob pattern: {pat}"))?
                .compile_matcher();
            per_pattern.push((matcher, glob_base(pat)));
        }

        Ok(Self {
            root,
            patterns,
            include_set,
            exclude_set,
            per_pattern,
        })
    }

    /// The raw include patterns, as configured.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the given path (relative to project root, forward
    /// slashes) belongs to this set.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Enumerate the currently matching files as absolute paths, sorted.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let files = self.resolve_with_structure()?;
        Ok(files.into_iter().map(|(abs, _)| abs).collect())
    }

    /// Enumerate matching files together with their path relative to the
    /// literal base of the pattern that matched them.
    ///
    /// This relative part is what structure-preserving copies keep under the
    /// destination: `static/css/site.css` matched by `static/**/*` yields
    /// `css/site.css`.
    pub fn resolve_with_structure(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
        let mut out: Vec<(PathBuf, PathBuf)> = Vec::new();

        let mut bases: Vec<&Path> = self
            .per_pattern
            .iter()
            .map(|(_, base)| base.as_path())
            .collect();
        bases.sort();
        bases.dedup();

        for base in bases {
            let walk_root = self.root.join(base);
            if !walk_root.exists() {
                continue;
            }

            for entry in WalkDir::new(&walk_root) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable path during file-set walk");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let abs = entry.path();
                let Ok(rel) = abs.strip_prefix(&self.root) else {
                    continue;
                };
                let rel_str = to_slash(rel);
                if !self.matches(&rel_str) {
                    continue;
                }
                if !seen.insert(abs.to_path_buf()) {
                    // Already collected via an overlapping pattern base.
                    continue;
                }

                let pattern_base = self
                    .per_pattern
                    .iter()
                    .find(|(matcher, _)| matcher.is_match(&rel_str))
                    .map(|(_, base)| base.as_path())
                    .unwrap_or_else(|| Path::new(""));
                let structural = rel.strip_prefix(pattern_base).unwrap_or(rel).to_path_buf();

                out.push((abs.to_path_buf(), structural));
            }
        }

        out.sort();
        Ok(out)
    }
}

/// Convert a root-relative path into a forward-slash string for glob
/// matching.
pub(crate) fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Literal directory prefix of a glob pattern: the components before the
/// first one containing a metacharacter.
///
/// `src/*.elm` has base `src`; `static/**/*` has base `static`; `*.elm` has
/// an empty base (the project root itself). A fully literal pattern names a
/// single file, so its base is the parent directory.
fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for part in pattern.split('/') {
        if part.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(part);
    }
    if base.as_os_str() == Path::new(pattern).as_os_str() {
        base.pop();
    }
    base
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
