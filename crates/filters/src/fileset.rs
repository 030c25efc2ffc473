//! The fileset data model (§3) and its line-oriented parser (§4.7).

use crate::option::{OptionBlock, OptionParseError, parse_option_string};

/// One literal pattern entry within a fileset entry (`F`/`R`/`W` lines).
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    /// A literal file path.
    Literal(String),
    /// `|cmd`: run a command and treat each output line as a path.
    Command(String),
    /// `<file`: read a list of paths from the named file.
    ListFile(String),
    /// A regex pattern, scoped to all paths, directories only, or files
    /// only.
    Regex {
        /// The path scope the pattern is matched against.
        scope: PatternScope,
        /// The regex source text.
        pattern: String,
    },
    /// A wildcard pattern, scoped as above (or base-name only).
    Wildcard {
        /// The path scope the pattern is matched against.
        scope: PatternScope,
        /// The wildcard source text.
        pattern: String,
    },
}

/// The scope subcode for `R`/`W` lines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PatternScope {
    /// Matches any path component.
    All,
    /// Matches directories only.
    Directories,
    /// Matches files only.
    Files,
    /// Matches the base name only (wildcard-only subcode `B`).
    BaseName,
}

/// Whether a fileset entry is an include or an exclude block (`I`/`E`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// Files matching this entry's patterns are included.
    Include,
    /// Files matching this entry's patterns are excluded.
    Exclude,
}

/// One include or exclude block: its options, patterns, and any bound
/// plugin commands.
#[derive(Clone, Debug, Default)]
pub struct FilesetEntry {
    /// Include or exclude.
    pub kind: Option<EntryKind>,
    /// The accumulated option block (one or more `O` lines merge into
    /// this; later options override earlier ones with the same field).
    pub options: OptionBlock,
    /// Literal path patterns (`F`), each belonging to exactly this entry.
    pub patterns: Vec<Pattern>,
    /// Plugin invocations (`P`) bound to this entry.
    pub plugin_commands: Vec<String>,
    /// Base directory (`B`), if set.
    pub base_dir: Option<String>,
    /// Filesystem-type restriction (`X`), if set.
    pub fs_type_restriction: Option<String>,
    /// Ignore-this-directory hint file name (`Z`), if set.
    pub ignore_dir_hint: Option<String>,
}

/// The full fileset: ordered include and exclude entries, plus a sticky
/// error flag (§4.7: once set, subsequent lines are silently dropped).
#[derive(Clone, Debug, Default)]
pub struct Fileset {
    /// Ordered include entries, in the order `I` lines were received.
    pub entries: Vec<FilesetEntry>,
    /// Whether parsing has hit an unrecoverable error.
    pub error: bool,
    /// Whether [`Fileset::commit`] has been called.
    pub committed: bool,
}

impl Fileset {
    /// An empty, not-yet-parsed fileset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and applies one line of the Director's fileset definition.
    /// If the fileset is already in the error state, the line is silently
    /// dropped (§4.7).
    pub fn apply_line(&mut self, line: &str) {
        if self.error {
            return;
        }
        if let Err(()) = self.apply_line_inner(line) {
            self.error = true;
        }
    }

    fn apply_line_inner(&mut self, line: &str) -> Result<(), ()> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut chars = line.chars();
        let code = chars.next().ok_or(())?;
        let rest = chars.as_str();

        match code {
            'I' => {
                self.entries.push(FilesetEntry {
                    kind: Some(EntryKind::Include),
                    ..Default::default()
                });
            }
            'E' => {
                self.entries.push(FilesetEntry {
                    kind: Some(EntryKind::Exclude),
                    ..Default::default()
                });
            }
            'N' => {
                // Null: state reset, no entry mutation required beyond
                // being a no-op marker between blocks.
            }
            'F' => {
                let item = rest.trim_start();
                let entry = self.current_entry_mut()?;
                let pattern = if let Some(cmd) = item.strip_prefix('|') {
                    Pattern::Command(cmd.to_string())
                } else if let Some(file) = item.strip_prefix('<') {
                    Pattern::ListFile(file.to_string())
                } else {
                    Pattern::Literal(item.to_string())
                };
                entry.patterns.push(pattern);
            }
            'P' => {
                let item = rest.trim_start().to_string();
                self.current_entry_mut()?.plugin_commands.push(item);
            }
            'G' => {
                let item = rest.trim_start().to_string();
                self.current_entry_mut()?.plugin_commands.push(item);
            }
            'R' | 'W' => {
                let (scope, pattern) = split_subcode(rest, code == 'W')?;
                let entry = self.current_entry_mut()?;
                let pattern = if code == 'R' {
                    Pattern::Regex { scope, pattern }
                } else {
                    Pattern::Wildcard { scope, pattern }
                };
                entry.patterns.push(pattern);
            }
            'O' => {
                let opts = parse_option_string(rest.trim_start()).map_err(|_: OptionParseError| ())?;
                merge_options(&mut self.current_entry_mut()?.options, opts);
            }
            'B' => {
                self.current_entry_mut()?.base_dir = Some(rest.trim_start().to_string());
            }
            'X' => {
                let item = rest.trim_start();
                self.current_entry_mut()?.fs_type_restriction = Some(item.to_string());
            }
            'Z' => {
                // Ignore-this-directory hint file name; the walker (out
                // of this crate's scope) consults it per directory.
                self.current_entry_mut()?.ignore_dir_hint = Some(rest.trim_start().to_string());
            }
            _ => return Err(()),
        }
        Ok(())
    }

    fn current_entry_mut(&mut self) -> Result<&mut FilesetEntry, ()> {
        self.entries.last_mut().ok_or(())
    }

    /// Marks the fileset committed: platform-special pattern expansion
    /// happens in the walker, not here, since it is a platform concern
    /// out of this crate's scope.
    pub fn commit(&mut self) {
        if !self.error {
            self.committed = true;
        }
    }
}

fn split_subcode(rest: &str, wildcard: bool) -> Result<(PatternScope, String), ()> {
    let mut chars = rest.chars();
    let first = chars.clone().next();
    let (scope, pattern_start) = match first {
        Some(' ') | None => (PatternScope::All, rest),
        Some('D') => (PatternScope::Directories, chars.as_str()),
        Some('F') => (PatternScope::Files, chars.as_str()),
        Some('B') if wildcard => (PatternScope::BaseName, chars.as_str()),
        _ => (PatternScope::All, rest),
    };
    Ok((scope, pattern_start.trim_start().to_string()))
}

fn merge_options(base: &mut OptionBlock, overlay: OptionBlock) {
    // Later `O` lines within the same entry override fields they set;
    // fields the overlay left at default are left untouched.
    let default = OptionBlock::default();
    macro_rules! take_if_set {
        ($field:ident) => {
            if overlay.$field != default.$field {
                base.$field = overlay.$field;
            }
        };
    }
    take_if_set!(compression);
    take_if_set!(digest);
    take_if_set!(sparse);
    take_if_set!(acl);
    take_if_set!(xattr);
    take_if_set!(no_recursion);
    take_if_set!(multi_filesystem);
    take_if_set!(honor_nodump);
    take_if_set!(no_atime);
    take_if_set!(keep_atime);
    take_if_set!(strip_path);
    take_if_set!(portable_data);
    take_if_set!(mac_resource_forks);
    take_if_set!(read_fifo);
    take_if_set!(mtime_only);
    take_if_set!(no_replace);
    take_if_set!(ignore_case);
    take_if_set!(no_hard_links);
    take_if_set!(exclude_match);
    take_if_set!(check_changes);
    take_if_set!(shadow_check_level);
    take_if_set!(only_if_newer);
    take_if_set!(enhanced_wild);
    take_if_set!(accurate_opts);
    take_if_set!(basejob_opts);
    take_if_set!(verify_opts);
    take_if_set!(size_match);
}
