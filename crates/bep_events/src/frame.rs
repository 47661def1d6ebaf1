use tracing::debug;

use crate::error::FrameError;

/// Longest LEB128 encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// One length-prefixed unit of the stream. The body always holds exactly
/// `length` bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    offset: u64,
    length: u64,
    body: Vec<u8>,
}

impl Frame {
    /// Byte offset of the frame's length prefix in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Whether the bytes behind the decoder can still grow.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceFinality {
    Growing,
    Final,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Frame(Frame),
    /// Not enough bytes yet; nothing was consumed.
    Incomplete,
    Corrupt(FrameError),
    NoMoreFrames,
}

enum VarintRead {
    Value { value: u64, width: usize },
    Short,
    Invalid(FrameError),
}

fn read_varint(bytes: &[u8]) -> VarintRead {
    let mut value: u64 = 0;
    for (idx, byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        if idx == MAX_VARINT_LEN - 1 {
            if byte & 0x80 != 0 {
                return VarintRead::Invalid(FrameError::Overlong {
                    max_len: MAX_VARINT_LEN,
                });
            }
            if *byte > 1 {
                return VarintRead::Invalid(FrameError::LengthOverflow);
            }
        }
        value |= u64::from(byte & 0x7f) << (7 * idx);
        if byte & 0x80 == 0 {
            return VarintRead::Value {
                value,
                width: idx + 1,
            };
        }
    }
    VarintRead::Short
}

/// Appends the minimal LEB128 encoding of `value` to `out`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Splits buffered bytes into frames.
///
/// Bytes are pushed in by whatever source feeds the run; `decode_next` only
/// consumes them once a whole frame is available, so an `Incomplete` result
/// can be retried after more bytes arrive.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    cursor: u64,
    max_frame_bytes: u64,
}

impl FrameDecoder {
    pub fn new(max_frame_bytes: u64) -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            max_frame_bytes,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    /// Offset of the first byte not yet consumed as part of a frame.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Bytes received but not yet consumed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn decode_next(&mut self, finality: SourceFinality) -> FrameOutcome {
        if self.buffer.is_empty() {
            return match finality {
                SourceFinality::Final => FrameOutcome::NoMoreFrames,
                SourceFinality::Growing => FrameOutcome::Incomplete,
            };
        }

        let (length, width) = match read_varint(&self.buffer) {
            VarintRead::Value { value, width } => (value, width),
            VarintRead::Invalid(err) => return FrameOutcome::Corrupt(err),
            VarintRead::Short => {
                return match finality {
                    SourceFinality::Growing => FrameOutcome::Incomplete,
                    SourceFinality::Final => {
                        FrameOutcome::Corrupt(FrameError::TruncatedLength {
                            available: self.buffer.len(),
                        })
                    }
                };
            }
        };

        let body_len = match usize::try_from(length) {
            Ok(body_len) if length <= self.max_frame_bytes => body_len,
            _ => {
                return FrameOutcome::Corrupt(FrameError::FrameTooLarge {
                    declared: length,
                    max_frame_bytes: self.max_frame_bytes,
                })
            }
        };
        let available = self.buffer.len() - width;
        if available < body_len {
            return match finality {
                SourceFinality::Growing => FrameOutcome::Incomplete,
                SourceFinality::Final => FrameOutcome::Corrupt(FrameError::TruncatedBody {
                    declared: length,
                    available,
                }),
            };
        }

        let offset = self.cursor;
        let consumed = width + body_len;
        let body = self.buffer[width..consumed].to_vec();
        self.buffer.drain(..consumed);
        self.cursor += consumed as u64;
        debug!(offset, length, "decoded frame");

        FrameOutcome::Frame(Frame {
            offset,
            length,
            body,
        })
    }
}
