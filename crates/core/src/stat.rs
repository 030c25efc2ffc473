//! Decoded `stat`-like metadata and its ASCII wire encoding.
//!
//! The same encoding backs two uses: the `<attrs>` field of the
//! `unix-attributes` stream (§6) and the `lstat_ascii` field of an accurate
//! change-detection entry (§3, §4.3). Fields are emitted in a fixed order,
//! each base-36 encoded and separated by a single space, matching the
//! compactness goal of the original ASCII encoding this format descends
//! from.

use std::fmt::Write as _;

/// A decoded subset of `stat(2)` fields, the portion the accurate-mode
/// comparison and the attributes stream both need.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FileStat {
    /// Device id.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
    /// File mode bits (type + permissions).
    pub mode: u32,
    /// Hard-link count.
    pub nlink: u32,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Device id, if this is a device special file.
    pub rdev: u64,
    /// Size in bytes.
    pub size: u64,
    /// Last-access time, Unix seconds.
    pub atime: i64,
    /// Last-modification time, Unix seconds.
    pub mtime: i64,
    /// Last-status-change time, Unix seconds.
    pub ctime: i64,
}

impl FileStat {
    /// Encodes the fields as a single space-separated, base-36 ASCII
    /// string, matching the compactness of the wire's `lstat_ascii`.
    #[must_use]
    pub fn encode_ascii(&self) -> String {
        let mut out = String::new();
        for (i, field) in [
            self.dev,
            self.ino,
            u64::from(self.mode),
            u64::from(self.nlink),
            u64::from(self.uid),
            u64::from(self.gid),
            self.rdev,
            self.size,
        ]
        .into_iter()
        .enumerate()
        {
            if i > 0 {
                out.push(' ');
            }
            write_base36(&mut out, field);
        }
        for time in [self.atime, self.mtime, self.ctime] {
            out.push(' ');
            if time < 0 {
                out.push('-');
                write_base36(&mut out, time.unsigned_abs());
            } else {
                write_base36(&mut out, time as u64);
            }
        }
        out
    }

    /// Decodes the ASCII string produced by [`Self::encode_ascii`].
    #[must_use]
    pub fn decode_ascii(s: &str) -> Option<Self> {
        let mut fields = s.split(' ');
        let dev = parse_base36(fields.next()?)?;
        let ino = parse_base36(fields.next()?)?;
        let mode = parse_base36(fields.next()?)? as u32;
        let nlink = parse_base36(fields.next()?)? as u32;
        let uid = parse_base36(fields.next()?)? as u32;
        let gid = parse_base36(fields.next()?)? as u32;
        let rdev = parse_base36(fields.next()?)?;
        let size = parse_base36(fields.next()?)?;
        let atime = parse_signed_base36(fields.next()?)?;
        let mtime = parse_signed_base36(fields.next()?)?;
        let ctime = parse_signed_base36(fields.next()?)?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            dev,
            ino,
            mode,
            nlink,
            uid,
            gid,
            rdev,
            size,
            atime,
            mtime,
            ctime,
        })
    }

    /// Fields compared by accurate mode per the option-string-selected set
    /// (§4.3): inode, mode, nlink, uid, gid, size, and the three times.
    /// Returns `true` if `self` and `other` are identical on every field
    /// the caller asked to compare.
    #[must_use]
    pub fn accurate_matches(&self, other: &Self, opts: &AccurateCompareOptions) -> bool {
        if opts.always {
            return false;
        }
        if opts.inode && self.ino != other.ino {
            return false;
        }
        if opts.permissions && self.mode != other.mode {
            return false;
        }
        if opts.nlink && self.nlink != other.nlink {
            return false;
        }
        if opts.uid && self.uid != other.uid {
            return false;
        }
        if opts.gid && self.gid != other.gid {
            return false;
        }
        if opts.size_decrease && other.size < self.size {
            return false;
        }
        if opts.size && self.size != other.size {
            return false;
        }
        if opts.atime && self.atime != other.atime {
            return false;
        }
        if opts.mtime && self.mtime != other.mtime {
            return false;
        }
        if opts.ctime && self.ctime != other.ctime {
            return false;
        }
        true
    }
}

/// Which `FileStat` fields the accurate-mode comparison considers, derived
/// from the `AccurateOpts`/`BaseJobOpts` option sub-string (§4.7 `C`/`J`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AccurateCompareOptions {
    /// Compare inode numbers.
    pub inode: bool,
    /// Compare permission bits.
    pub permissions: bool,
    /// Compare link counts.
    pub nlink: bool,
    /// Compare owning uid.
    pub uid: bool,
    /// Compare owning gid.
    pub gid: bool,
    /// Compare size exactly.
    pub size: bool,
    /// Treat any size decrease as a change, regardless of `size`.
    pub size_decrease: bool,
    /// Compare access time.
    pub atime: bool,
    /// Compare modification time.
    pub mtime: bool,
    /// Compare status-change time.
    pub ctime: bool,
    /// Recompute and compare the content checksum.
    pub checksum: bool,
    /// Always treat the file as changed, ignoring every other field.
    pub always: bool,
}

fn write_base36(out: &mut String, mut value: u64) {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        out.push('0');
        return;
    }
    let mut buf = [0u8; 13];
    let mut i = buf.len();
    while value > 0 {
        i -= 1;
        buf[i] = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    let _ = write!(out, "{}", std::str::from_utf8(&buf[i..]).unwrap());
}

fn parse_base36(s: &str) -> Option<u64> {
    let mut value: u64 = 0;
    for c in s.chars() {
        let digit = c.to_digit(36)?;
        value = value.checked_mul(36)?.checked_add(u64::from(digit))?;
    }
    Some(value)
}

fn parse_signed_base36(s: &str) -> Option<i64> {
    if let Some(rest) = s.strip_prefix('-') {
        Some(-(parse_base36(rest)? as i64))
    } else {
        Some(parse_base36(s)? as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileStat {
        FileStat {
            dev: 42,
            ino: 123_456,
            mode: 0o100_644,
            nlink: 1,
            uid: 1000,
            gid: 1000,
            rdev: 0,
            size: 4096,
            atime: 1_700_000_000,
            mtime: 1_700_000_001,
            ctime: 1_700_000_002,
        }
    }

    #[test]
    fn ascii_round_trips() {
        let stat = sample();
        let encoded = stat.encode_ascii();
        let decoded = FileStat::decode_ascii(&encoded).unwrap();
        assert_eq!(stat, decoded);
    }

    #[test]
    fn negative_times_round_trip() {
        let mut stat = sample();
        stat.atime = -5;
        let encoded = stat.encode_ascii();
        let decoded = FileStat::decode_ascii(&encoded).unwrap();
        assert_eq!(stat, decoded);
    }

    #[test]
    fn identical_stats_match_under_default_comparison() {
        let a = sample();
        let b = sample();
        let opts = AccurateCompareOptions {
            inode: true,
            permissions: true,
            size: true,
            mtime: true,
            ..Default::default()
        };
        assert!(a.accurate_matches(&b, &opts));
    }

    #[test]
    fn size_change_is_detected() {
        let a = sample();
        let mut b = sample();
        b.size += 1;
        let opts = AccurateCompareOptions {
            size: true,
            ..Default::default()
        };
        assert!(!a.accurate_matches(&b, &opts));
    }

    #[test]
    fn always_option_forces_change() {
        let a = sample();
        let b = sample();
        let opts = AccurateCompareOptions {
            always: true,
            ..Default::default()
        };
        assert!(!a.accurate_matches(&b, &opts));
    }
}
