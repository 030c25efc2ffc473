//! A fake Storage-Daemon channel: an in-memory duplex byte pipe usable
//! anywhere `wire::framing::{send_header, send_payload, recv_record}`
//! expects a `Write` or `BufRead`, so session tests can exchange records
//! without a real socket. `recv_record` wants a `BufRead`; wrap a
//! [`FakeSdChannel`] in `std::io::BufReader` to get one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

#[derive(Default)]
struct Pipe {
    bytes: VecDeque<u8>,
}

/// One end of a duplex pipe: writes go out on `outbound`, reads come in
/// from `inbound`. Build a connected pair with [`duplex_pair`].
#[derive(Clone)]
pub struct FakeSdChannel {
    inbound: Rc<RefCell<Pipe>>,
    outbound: Rc<RefCell<Pipe>>,
}

impl Read for FakeSdChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pipe = self.inbound.borrow_mut();
        let n = buf.len().min(pipe.bytes.len());
        for slot in buf.iter_mut().take(n) {
            *slot = pipe.bytes.pop_front().expect("checked len above");
        }
        Ok(n)
    }
}

impl Write for FakeSdChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outbound.borrow_mut().bytes.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds two ends of a connected duplex pipe: bytes written on one end
/// are read from the other, and vice versa.
#[must_use]
pub fn duplex_pair() -> (FakeSdChannel, FakeSdChannel) {
    let a_to_b = Rc::new(RefCell::new(Pipe::default()));
    let b_to_a = Rc::new(RefCell::new(Pipe::default()));
    let left = FakeSdChannel { inbound: Rc::clone(&b_to_a), outbound: Rc::clone(&a_to_b) };
    let right = FakeSdChannel { inbound: a_to_b, outbound: b_to_a };
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use wire::framing::{recv_record, send_header, send_payload};
    use wire::stream_type::StreamType;

    #[test]
    fn records_sent_on_one_end_are_received_on_the_other() {
        let (mut sender, receiver) = duplex_pair();
        send_header(&mut sender, 1, 2, 3, StreamType::FileData, 5).unwrap();
        send_payload(&mut sender, b"hello").unwrap();

        let mut receiver = BufReader::new(receiver);
        let (header, payload) = recv_record(&mut receiver).unwrap();
        assert_eq!(header.volume_session_id, 1);
        assert_eq!(header.stream_type, StreamType::FileData);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn each_end_has_independent_outbound_direction() {
        let (mut left, mut right) = duplex_pair();
        left.write_all(b"to-right").unwrap();
        right.write_all(b"to-left").unwrap();

        let mut from_left = vec![0u8; 8];
        right.read_exact(&mut from_left).unwrap();
        assert_eq!(&from_left, b"to-right");

        let mut from_right = vec![0u8; 7];
        left.read_exact(&mut from_right).unwrap();
        assert_eq!(&from_right, b"to-left");
    }
}
