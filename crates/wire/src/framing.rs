//! Record header framing (§4.1).
//!
//! The header is a printable ASCII line of five whitespace-separated
//! integers: volume-session id, volume-session time, file-index, stream
//! type, and payload length. A mismatch between announced and delivered
//! payload length is fatal to the session.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::stream_type::StreamType;

/// A parsed record header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecordHeader {
    /// The Storage-Daemon volume-session id for this connection.
    pub volume_session_id: i32,
    /// The Storage-Daemon volume-session time for this connection.
    pub volume_session_time: i32,
    /// The per-job file-index this record belongs to.
    pub file_index: i32,
    /// The stream type of the payload that follows.
    pub stream_type: StreamType,
    /// The announced length of the payload, in bytes.
    pub payload_len: u32,
}

/// A distinct end-of-session signal, not a stream type (§4.1).
pub const END_OF_SESSION_FILE_INDEX: i32 = -1;

/// Writes a record header line, to be followed by exactly `payload_len`
/// payload bytes via [`send_payload`].
///
/// # Errors
///
/// Returns [`io::Error`] if the underlying writer fails.
pub fn send_header<W: Write>(
    w: &mut W,
    volume_session_id: i32,
    volume_session_time: i32,
    file_index: i32,
    stream_type: StreamType,
    payload_len: u32,
) -> io::Result<()> {
    writeln!(
        w,
        "{volume_session_id} {volume_session_time} {file_index} {} {payload_len}",
        stream_type.code()
    )
}

/// Writes the payload bytes announced by the preceding [`send_header`]
/// call. The caller must ensure `bytes.len()` equals the announced
/// `payload_len`; this function does not re-check it.
///
/// # Errors
///
/// Returns [`io::Error`] if the underlying writer fails.
pub fn send_payload<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    w.write_all(bytes)
}

/// Reads one complete record: the header line, then exactly the announced
/// number of payload bytes.
///
/// # Errors
///
/// Returns [`FramingError`] if the header line is malformed or the reader
/// reaches EOF before the announced payload length is satisfied.
pub fn recv_record<R: BufRead>(r: &mut R) -> Result<(RecordHeader, Vec<u8>), FramingError> {
    let mut line = String::new();
    let read = r.read_line(&mut line).map_err(FramingError::Io)?;
    if read == 0 {
        return Err(FramingError::Eof);
    }
    let header = parse_header_line(line.trim_end_matches(['\n', '\r']))?;

    let mut payload = vec![0u8; header.payload_len as usize];
    r.read_exact(&mut payload)
        .map_err(|_| FramingError::PayloadLengthMismatch)?;
    Ok((header, payload))
}

fn parse_header_line(line: &str) -> Result<RecordHeader, FramingError> {
    let mut fields = line.split_whitespace();
    let volume_session_id: i32 = fields
        .next()
        .ok_or(FramingError::Malformed)?
        .parse()
        .map_err(|_| FramingError::Malformed)?;
    let volume_session_time: i32 = fields
        .next()
        .ok_or(FramingError::Malformed)?
        .parse()
        .map_err(|_| FramingError::Malformed)?;
    let file_index: i32 = fields
        .next()
        .ok_or(FramingError::Malformed)?
        .parse()
        .map_err(|_| FramingError::Malformed)?;
    let stream_code: i32 = fields
        .next()
        .ok_or(FramingError::Malformed)?
        .parse()
        .map_err(|_| FramingError::Malformed)?;
    let payload_len: u32 = fields
        .next()
        .ok_or(FramingError::Malformed)?
        .parse()
        .map_err(|_| FramingError::Malformed)?;
    if fields.next().is_some() {
        return Err(FramingError::Malformed);
    }
    Ok(RecordHeader {
        volume_session_id,
        volume_session_time,
        file_index,
        stream_type: StreamType::from_code(stream_code),
        payload_len,
    })
}

/// A framing violation, fatal to the session (§4.1, §7).
#[derive(Debug, Error)]
pub enum FramingError {
    /// The peer closed the connection cleanly before a header arrived.
    #[error("end of session")]
    Eof,
    /// The header line did not parse as five whitespace-separated
    /// integers.
    #[error("malformed record header")]
    Malformed,
    /// The reader reached EOF before the announced payload length was
    /// satisfied.
    #[error("payload shorter than announced length")]
    PayloadLengthMismatch,
    /// The underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(io::Error),
}
