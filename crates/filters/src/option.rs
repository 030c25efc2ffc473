//! A fileset entry's option block (§3, §4.7).
//!
//! Options apply only within the entry that contains them. Most are
//! boolean flags; a handful carry parameters (strip-path count,
//! compression level, size-match predicate, and the accurate/basejob/
//! verify option sub-strings, each terminated by `:`).

use checksums::strong::DigestAlgorithm;
use compress::algorithm::CompressionAlgorithm;
use thiserror::Error;

/// The decoded option block for one fileset entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionBlock {
    /// `Z<level>`/`Zo`/`Zf4`/`Zfh`: compression algorithm and level.
    /// Level is meaningful only for GZIP; LZO1X and LZ4 ignore it.
    pub compression: Option<(CompressionAlgorithm, u8)>,
    /// `M`/`S{1,2,3}`: selected content-digest algorithm.
    pub digest: Option<DigestAlgorithm>,
    /// `s`: sparse-block detection enabled.
    pub sparse: bool,
    /// `A`: gather and emit ACLs.
    pub acl: bool,
    /// `X`: gather and emit extended attributes.
    pub xattr: bool,
    /// `h`: do not recurse into subdirectories.
    pub no_recursion: bool,
    /// `f`: allow traversal to cross filesystem boundaries.
    pub multi_filesystem: bool,
    /// `N`: honor the filesystem's nodump flag.
    pub honor_nodump: bool,
    /// `K`: never update atime after reading.
    pub no_atime: bool,
    /// `k`: restore atime after reading (keep-atime).
    pub keep_atime: bool,
    /// `P<n>:`: number of leading path components to strip.
    pub strip_path: Option<u32>,
    /// `p`: emit paths in portable (forward-slash) form.
    pub portable_data: bool,
    /// `R`: include macOS resource forks and Finder info.
    pub mac_resource_forks: bool,
    /// `r`: allow reading from FIFOs.
    pub read_fifo: bool,
    /// `m`: compare by mtime only (accurate/incremental shortcut).
    pub mtime_only: bool,
    /// `n`: do not replace an existing file of a different type on
    /// restore.
    pub no_replace: bool,
    /// `i`: case-insensitive pattern matching.
    pub ignore_case: bool,
    /// `H`: disable hard-link detection/deduplication.
    pub no_hard_links: bool,
    /// `e`: treat this entry's patterns as exclude-match within an
    /// include block.
    pub exclude_match: bool,
    /// `c`: enable shadow/change checking.
    pub check_changes: bool,
    /// `d{1..4}`: shadow-check depth level.
    pub shadow_check_level: Option<u8>,
    /// `w`: only replace an existing file if this one is newer.
    pub only_if_newer: bool,
    /// `W`: enhanced wildcard matching (`**`-style).
    pub enhanced_wild: bool,
    /// `C<opts>:`: accurate comparison option sub-string.
    pub accurate_opts: Option<String>,
    /// `J<opts>:`: basejob comparison option sub-string.
    pub basejob_opts: Option<String>,
    /// `V<opts>:`: verify option sub-string.
    pub verify_opts: Option<String>,
    /// `z<size>:`: size-match predicate, in bytes.
    pub size_match: Option<SizeMatch>,
}

/// The `z<size>:` size-match predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeMatch {
    /// Match files smaller than the given size.
    LessThan(u64),
    /// Match files larger than the given size.
    GreaterThan(u64),
    /// Match files exactly the given size.
    Equal(u64),
}

fn parse_size_match(s: &str) -> Result<SizeMatch, OptionParseError> {
    if let Some(rest) = s.strip_prefix('<') {
        Ok(SizeMatch::LessThan(parse_size_bytes(rest)?))
    } else if let Some(rest) = s.strip_prefix('>') {
        Ok(SizeMatch::GreaterThan(parse_size_bytes(rest)?))
    } else {
        Ok(SizeMatch::Equal(parse_size_bytes(s)?))
    }
}

fn parse_size_bytes(s: &str) -> Result<u64, OptionParseError> {
    s.parse().map_err(|_| OptionParseError::BadSizeMatch(s.to_string()))
}

/// Parses one option string (the portion of an `O` line after the leading
/// code), a sequence of single-character options, some with parameters
/// terminated by `:`.
///
/// # Errors
///
/// Returns [`OptionParseError`] on an unrecognized option character or a
/// malformed parameter. Per §4.7, the caller is responsible for setting
/// the fileset's sticky error state on failure.
pub fn parse_option_string(opts: &str) -> Result<OptionBlock, OptionParseError> {
    let mut out = OptionBlock::default();
    let chars: Vec<char> = opts.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            'A' => out.acl = true,
            'a' | '0' => {}
            'C' => out.accurate_opts = Some(take_colon_terminated(&chars, &mut i)),
            'c' => out.check_changes = true,
            'd' => {
                let level = chars.get(i + 1).and_then(|c| c.to_digit(10));
                out.shadow_check_level = level.map(|l| l as u8);
                i += 1;
            }
            'e' => out.exclude_match = true,
            'f' => out.multi_filesystem = true,
            'H' => out.no_hard_links = true,
            'h' => out.no_recursion = true,
            'i' => out.ignore_case = true,
            'J' => out.basejob_opts = Some(take_colon_terminated(&chars, &mut i)),
            'K' => out.no_atime = true,
            'k' => out.keep_atime = true,
            'M' => out.digest = Some(DigestAlgorithm::Md5),
            'm' => out.mtime_only = true,
            'N' => out.honor_nodump = true,
            'n' => out.no_replace = true,
            'P' => {
                i += 1;
                let raw = take_colon_terminated(&chars, &mut i);
                out.strip_path =
                    Some(raw.parse().map_err(|_| OptionParseError::BadStripPath(raw.clone()))?);
                continue;
            }
            'p' => out.portable_data = true,
            'R' => out.mac_resource_forks = true,
            'r' => out.read_fifo = true,
            'S' => {
                out.digest = Some(match chars.get(i + 1) {
                    Some('2') => {
                        i += 1;
                        DigestAlgorithm::Sha256
                    }
                    Some('3') => {
                        i += 1;
                        DigestAlgorithm::Sha512
                    }
                    Some('1') => {
                        i += 1;
                        DigestAlgorithm::Sha1
                    }
                    _ => DigestAlgorithm::Sha1,
                });
            }
            's' => out.sparse = true,
            'V' => out.verify_opts = Some(take_colon_terminated(&chars, &mut i)),
            'W' => out.enhanced_wild = true,
            'w' => out.only_if_newer = true,
            'X' => out.xattr = true,
            'Z' => {
                i += 1;
                out.compression = Some(parse_compression(&chars, &mut i)?);
                continue;
            }
            'z' => {
                i += 1;
                let raw = take_colon_terminated(&chars, &mut i);
                out.size_match = Some(parse_size_match(&raw)?);
                continue;
            }
            other => return Err(OptionParseError::UnknownOption(other)),
        }
        i += 1;
    }
    Ok(out)
}

fn parse_compression(chars: &[char], i: &mut usize) -> Result<(CompressionAlgorithm, u8), OptionParseError> {
    match chars.get(*i) {
        Some(c) if c.is_ascii_digit() => {
            let level = c.to_digit(10).unwrap() as u8;
            *i += 1;
            Ok((CompressionAlgorithm::Gzip, level))
        }
        Some('o') => {
            *i += 1;
            Ok((CompressionAlgorithm::Lzo1x, 0))
        }
        Some('f') => {
            *i += 1;
            match chars.get(*i) {
                Some('4') => {
                    *i += 1;
                    Ok((CompressionAlgorithm::Lz4Fast, 0))
                }
                Some('h') => {
                    *i += 1;
                    Ok((CompressionAlgorithm::Lz4Hc, 9))
                }
                other => Err(OptionParseError::UnknownCompression(other.copied())),
            }
        }
        other => Err(OptionParseError::UnknownCompression(other.copied())),
    }
}

fn take_colon_terminated(chars: &[char], i: &mut usize) -> String {
    *i += 1;
    let start = *i;
    while *i < chars.len() && chars[*i] != ':' {
        *i += 1;
    }
    let value: String = chars[start..*i].iter().collect();
    if *i < chars.len() {
        *i += 1;
    }
    value
}

/// An option string failed to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionParseError {
    /// The character is not a recognized single-letter option.
    #[error("unknown include/exclude option: {0}")]
    UnknownOption(char),
    /// The `Z` compression sub-code did not match any known algorithm.
    #[error("unknown compression sub-option: {0:?}")]
    UnknownCompression(Option<char>),
    /// The `P<n>:` strip-path parameter was not a valid integer.
    #[error("unparseable strip-path option: {0}")]
    BadStripPath(String),
    /// The `z<size>:` parameter was not a valid size.
    #[error("unparseable size option: {0}")]
    BadSizeMatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_level_is_parsed() {
        let opts = parse_option_string("Z6").unwrap();
        assert_eq!(opts.compression, Some((CompressionAlgorithm::Gzip, 6)));
    }

    #[test]
    fn lzo1x_is_parsed() {
        let opts = parse_option_string("Zo").unwrap();
        assert_eq!(opts.compression, Some((CompressionAlgorithm::Lzo1x, 0)));
    }

    #[test]
    fn lz4_fast_and_hc_are_parsed() {
        assert_eq!(
            parse_option_string("Zf4").unwrap().compression,
            Some((CompressionAlgorithm::Lz4Fast, 0))
        );
        assert_eq!(
            parse_option_string("Zfh").unwrap().compression,
            Some((CompressionAlgorithm::Lz4Hc, 9))
        );
    }

    #[test]
    fn sha_family_digest_selection() {
        assert_eq!(parse_option_string("S1").unwrap().digest, Some(DigestAlgorithm::Sha1));
        assert_eq!(parse_option_string("S2").unwrap().digest, Some(DigestAlgorithm::Sha256));
        assert_eq!(parse_option_string("S3").unwrap().digest, Some(DigestAlgorithm::Sha512));
        assert_eq!(parse_option_string("M").unwrap().digest, Some(DigestAlgorithm::Md5));
    }

    #[test]
    fn strip_path_and_size_match_parameters() {
        let opts = parse_option_string("P2:z>1024:s").unwrap();
        assert_eq!(opts.strip_path, Some(2));
        assert_eq!(opts.size_match, Some(SizeMatch::GreaterThan(1024)));
        assert!(opts.sparse);
    }

    #[test]
    fn accurate_and_basejob_substrings_are_captured() {
        let opts = parse_option_string("Cmcs:Jmcs:A").unwrap();
        assert_eq!(opts.accurate_opts.as_deref(), Some("mcs"));
        assert_eq!(opts.basejob_opts.as_deref(), Some("mcs"));
        assert!(opts.acl);
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert_eq!(parse_option_string("Q"), Err(OptionParseError::UnknownOption('Q')));
    }

    #[test]
    fn combined_boolean_flags() {
        let opts = parse_option_string("AXhKNi").unwrap();
        assert!(opts.acl);
        assert!(opts.xattr);
        assert!(opts.no_recursion);
        assert!(opts.no_atime);
        assert!(opts.honor_nodump);
        assert!(opts.ignore_case);
    }
}
