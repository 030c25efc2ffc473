//! Compiles a committed [`Fileset`] into something a directory walker
//! can actually query per path, separating "what the Director sent" from
//! "does this path belong in the job" (§4.7's parser explicitly leaves
//! this to "the walker, out of this crate's scope").

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use thiserror::Error;

use crate::fileset::{EntryKind, Fileset, Pattern, PatternScope};
use crate::option::OptionBlock;

/// A fileset entry failed to compile into a matcher.
#[derive(Debug, Error)]
pub enum MatcherError {
    /// A wildcard pattern was not valid glob syntax.
    #[error("invalid wildcard pattern {pattern:?}: {source}")]
    Glob {
        /// The offending pattern.
        pattern: String,
        /// The underlying glob compile error.
        #[source]
        source: globset::Error,
    },
    /// A regex pattern did not compile.
    #[error("invalid regex pattern {pattern:?}: {source}")]
    Regex {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex compile error.
        #[source]
        source: regex::Error,
    },
}

struct CompiledEntry {
    kind: EntryKind,
    options: OptionBlock,
    literals: Vec<String>,
    all_globs: GlobSet,
    dir_globs: GlobSet,
    file_globs: GlobSet,
    basename_globs: GlobSet,
    regexes: Vec<(PatternScope, Regex)>,
}

impl CompiledEntry {
    fn matches(&self, path: &str, basename: &str, is_dir: bool) -> bool {
        if self.literals.iter().any(|l| l == path) {
            return true;
        }
        if self.all_globs.is_match(path) {
            return true;
        }
        if is_dir && self.dir_globs.is_match(path) {
            return true;
        }
        if !is_dir && self.file_globs.is_match(path) {
            return true;
        }
        if self.basename_globs.is_match(basename) {
            return true;
        }
        for (scope, regex) in &self.regexes {
            let scoped = match scope {
                PatternScope::All | PatternScope::BaseName => true,
                PatternScope::Directories => is_dir,
                PatternScope::Files => !is_dir,
            };
            if scoped && regex.is_match(path) {
                return true;
            }
        }
        false
    }
}

/// A compiled fileset, ready to answer "does this path belong in the
/// job, and under which entry's options" for every path the walker
/// visits.
pub struct FilesetMatcher {
    entries: Vec<CompiledEntry>,
}

impl FilesetMatcher {
    /// Compiles a committed fileset. Patterns of kind [`Pattern::Command`]
    /// and [`Pattern::ListFile`] are not resolved here — running a
    /// command or reading a list file is an I/O side effect the walker
    /// performs once and folds into the literal set before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError`] if any wildcard or regex pattern fails to
    /// compile.
    pub fn compile(fileset: &Fileset) -> Result<Self, MatcherError> {
        let mut entries = Vec::with_capacity(fileset.entries.len());
        for entry in &fileset.entries {
            let Some(kind) = entry.kind else { continue };
            let mut literals = Vec::new();
            let mut all_builder = GlobSetBuilder::new();
            let mut dir_builder = GlobSetBuilder::new();
            let mut file_builder = GlobSetBuilder::new();
            let mut basename_builder = GlobSetBuilder::new();
            let mut regexes = Vec::new();

            for pattern in &entry.patterns {
                match pattern {
                    Pattern::Literal(path) => literals.push(path.clone()),
                    Pattern::Command(_) | Pattern::ListFile(_) => {}
                    Pattern::Wildcard { scope, pattern } => {
                        let glob = Glob::new(pattern).map_err(|source| MatcherError::Glob {
                            pattern: pattern.clone(),
                            source,
                        })?;
                        match scope {
                            PatternScope::All => all_builder.add(glob),
                            PatternScope::Directories => dir_builder.add(glob),
                            PatternScope::Files => file_builder.add(glob),
                            PatternScope::BaseName => basename_builder.add(glob),
                        };
                    }
                    Pattern::Regex { scope, pattern } => {
                        let regex = Regex::new(pattern).map_err(|source| MatcherError::Regex {
                            pattern: pattern.clone(),
                            source,
                        })?;
                        regexes.push((*scope, regex));
                    }
                }
            }

            entries.push(CompiledEntry {
                kind,
                options: entry.options.clone(),
                literals,
                all_globs: all_builder.build().map_err(|source| MatcherError::Glob {
                    pattern: "<all-scope set>".to_string(),
                    source,
                })?,
                dir_globs: dir_builder.build().map_err(|source| MatcherError::Glob {
                    pattern: "<dir-scope set>".to_string(),
                    source,
                })?,
                file_globs: file_builder.build().map_err(|source| MatcherError::Glob {
                    pattern: "<file-scope set>".to_string(),
                    source,
                })?,
                basename_globs: basename_builder.build().map_err(|source| MatcherError::Glob {
                    pattern: "<basename-scope set>".to_string(),
                    source,
                })?,
                regexes,
            });
        }
        Ok(Self { entries })
    }

    /// Decides whether `path` belongs in the job, and returns the option
    /// block of the last matching entry (later entries override earlier
    /// ones with the same path, matching the Director's ordered
    /// include/exclude evaluation).
    #[must_use]
    pub fn classify(&self, path: &str, is_dir: bool) -> Option<&OptionBlock> {
        let basename = path.rsplit('/').next().unwrap_or(path);
        let mut decision = None;
        for entry in &self.entries {
            if entry.matches(path, basename, is_dir) {
                decision = match entry.kind {
                    EntryKind::Include => Some(&entry.options),
                    EntryKind::Exclude => None,
                };
            }
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_include_matches_exact_path() {
        let mut fileset = Fileset::new();
        fileset.apply_line("I");
        fileset.apply_line("F /home/user/data.txt");
        fileset.commit();

        let matcher = FilesetMatcher::compile(&fileset).unwrap();
        assert!(matcher.classify("/home/user/data.txt", false).is_some());
        assert!(matcher.classify("/home/user/other.txt", false).is_none());
    }

    #[test]
    fn wildcard_respects_file_only_scope() {
        let mut fileset = Fileset::new();
        fileset.apply_line("I");
        fileset.apply_line("WF *.log");
        fileset.commit();

        let matcher = FilesetMatcher::compile(&fileset).unwrap();
        assert!(matcher.classify("app.log", false).is_some());
        assert!(matcher.classify("app.log", true).is_none());
    }

    #[test]
    fn later_exclude_entry_overrides_earlier_include() {
        let mut fileset = Fileset::new();
        fileset.apply_line("I");
        fileset.apply_line("F /data");
        fileset.apply_line("E");
        fileset.apply_line("F /data/secret.txt");
        fileset.commit();

        let matcher = FilesetMatcher::compile(&fileset).unwrap();
        assert!(matcher.classify("/data", false).is_some());
        assert!(matcher.classify("/data/secret.txt", false).is_none());
    }

    #[test]
    fn regex_directory_scope_does_not_match_files() {
        let mut fileset = Fileset::new();
        fileset.apply_line("I");
        fileset.apply_line("RD ^/var/.*");
        fileset.commit();

        let matcher = FilesetMatcher::compile(&fileset).unwrap();
        assert!(matcher.classify("/var/log", true).is_some());
        assert!(matcher.classify("/var/log/app.log", false).is_none());
    }

    proptest::proptest! {
        #[test]
        fn a_literal_include_always_matches_its_own_path_and_never_an_unrelated_one(
            segment in "[a-zA-Z0-9_]{1,16}",
            other in "[a-zA-Z0-9_]{1,16}",
        ) {
            proptest::prop_assume!(segment != other);
            let path = format!("/data/{segment}");
            let unrelated = format!("/data/{other}");

            let mut fileset = Fileset::new();
            fileset.apply_line("I");
            fileset.apply_line(&format!("F {path}"));
            fileset.commit();

            let matcher = FilesetMatcher::compile(&fileset).unwrap();
            proptest::prop_assert!(matcher.classify(&path, false).is_some());
            proptest::prop_assert!(matcher.classify(&unrelated, false).is_none());
        }
    }
}
