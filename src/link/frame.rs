//! The Link Frame: one cursor position as two little-endian `f32`s (X, Y).
//!
//! No header, no length prefix, no sequence number. A reader that cannot
//! collect all 8 bytes has no way to resynchronise, so anything short of a
//! full frame is an error.

use std::io::{ErrorKind, Read, Write};

use crate::{
    Position,
    error::{DyadError, Result},
};

pub const FRAME_LEN: usize = 8;

pub type Frame = [u8; FRAME_LEN];

/// Positions are narrowed to `f32` on the wire
pub fn encode(position: &Position) -> Frame {
    let mut frame = [0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&(position.x as f32).to_le_bytes());
    frame[4..].copy_from_slice(&(position.y as f32).to_le_bytes());
    frame
}

pub fn decode(frame: &Frame) -> Position {
    let x = f32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
    let y = f32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
    Position::new(x as f64, y as f64)
}

pub fn write_frame<W: Write>(writer: &mut W, position: &Position) -> Result<()> {
    writer
        .write_all(&encode(position))
        .map_err(DyadError::LinkLost)
}

/// Read exactly one frame, looping over partial reads until 8 bytes arrive
/// or the peer closes.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Position> {
    let mut frame: Frame = [0u8; FRAME_LEN];
    let mut received = 0;
    while received < FRAME_LEN {
        match reader.read(&mut frame[received..]) {
            Ok(0) => return Err(DyadError::FrameTruncated { received }),
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DyadError::LinkLost(e)),
        }
    }
    Ok(decode(&frame))
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;

    #[test]
    fn round_trip_is_exact_for_f32_values() {
        let values: [(f32, f32); 6] = [
            (0., 0.),
            (0.3, -0.7),
            (-1234.5, 6.25e-3),
            (f32::MAX, f32::MIN),
            (f32::MIN_POSITIVE, -f32::MIN_POSITIVE),
            (1e-40, -3.75),
        ];
        for (x, y) in values {
            let p = Position::new(x as f64, y as f64);
            assert_eq!(decode(&encode(&p)), p);
        }
    }

    #[test]
    fn layout_is_x_then_y_little_endian() {
        let frame = encode(&Position::new(1.0, -2.0));
        assert_eq!(&frame[..4], &1.0f32.to_le_bytes());
        assert_eq!(&frame[4..], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn reads_frames_back_to_back() {
        let mut bytes = Vec::new();
        write_frame(&mut bytes, &Position::new(0.5, 0.25)).unwrap();
        write_frame(&mut bytes, &Position::new(-0.5, 4.)).unwrap();
        let mut reader = Cursor::new(bytes);
        assert_eq!(read_frame(&mut reader).unwrap(), Position::new(0.5, 0.25));
        assert_eq!(read_frame(&mut reader).unwrap(), Position::new(-0.5, 4.));
        assert!(matches!(
            read_frame(&mut reader),
            Err(DyadError::FrameTruncated { received: 0 })
        ));
    }

    #[test]
    fn short_read_is_truncation() {
        let frame = encode(&Position::new(3., 4.));
        let mut reader = Cursor::new(frame[..5].to_vec());
        assert!(matches!(
            read_frame(&mut reader),
            Err(DyadError::FrameTruncated { received: 5 })
        ));
    }

    /// Hands out one byte per read, with an interruption in between
    struct Trickle {
        bytes: Vec<u8>,
        interrupt_next: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt_next = !self.interrupt_next;
            if self.interrupt_next {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            if self.bytes.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes.remove(0);
            Ok(1)
        }
    }

    #[test]
    fn split_frames_are_reassembled() {
        let mut reader = Trickle {
            bytes: encode(&Position::new(-0.125, 8.)).to_vec(),
            interrupt_next: false,
        };
        assert_eq!(read_frame(&mut reader).unwrap(), Position::new(-0.125, 8.));
    }
}
