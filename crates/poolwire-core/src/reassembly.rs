//! Reassembly of JSON messages split across several transport frames.
//!
//! The pool service may split one large JSON document over consecutive
//! frames. Frames are appended to a buffer until the buffer parses as a whole
//! message. A buffer that is not yet a complete JSON document means more
//! frames are needed; a complete document of the wrong shape is rejected and
//! dropped. Frames of one message arrive contiguously, so every finished
//! message starts the next one from an empty buffer.

use std::marker::PhantomData;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::error::ReassemblyError;
use crate::transport::Frame;

/// Upper bounds on one pending message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassemblyLimits {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
}

fn default_max_bytes() -> usize { 4 * 1024 * 1024 }
fn default_max_frames() -> usize { 256 }

impl Default for ReassemblyLimits {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_frames: default_max_frames(),
        }
    }
}

/// Accumulates frames of one logical message until it parses as `T`.
#[derive(Debug)]
pub struct FrameReassembler<T> {
    buffer: String,
    frames: usize,
    limits: ReassemblyLimits,
    _message: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> FrameReassembler<T> {
    pub fn new(limits: ReassemblyLimits) -> Self {
        Self {
            buffer: String::new(),
            frames: 0,
            limits,
            _message: PhantomData,
        }
    }

    /// Append a frame and try to parse the accumulated buffer.
    ///
    /// Returns `Ok(Some(message))` when the buffer forms a complete message
    /// (the buffer is then cleared), `Ok(None)` when more frames are needed,
    /// and an error when the buffer is a complete JSON document that is not a
    /// valid `T`, when the pending message exceeds the limits, or when a frame
    /// is not text. On error the buffer is discarded.
    pub fn feed(&mut self, frame: Frame) -> Result<Option<T>, ReassemblyError> {
        match frame {
            Frame::Text(text) => self.buffer.push_str(&text),
            Frame::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => self.buffer.push_str(&text),
                Err(_) => {
                    self.reset();
                    return Err(ReassemblyError::NotText);
                }
            },
        }
        self.frames += 1;

        let typed = match serde_json::from_str::<T>(&self.buffer) {
            Ok(message) => {
                self.reset();
                return Ok(Some(message));
            }
            Err(e) => e,
        };

        if serde_json::from_str::<IgnoredAny>(&self.buffer).is_ok() {
            self.reset();
            return Err(ReassemblyError::Invalid {
                reason: typed.to_string(),
            });
        }

        if self.frames >= self.limits.max_frames || self.buffer.len() > self.limits.max_bytes {
            let err = ReassemblyError::Overflow {
                frames: self.frames,
                bytes: self.buffer.len(),
            };
            self.reset();
            return Err(err);
        }

        Ok(None)
    }

    /// Discard any partial message, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.frames = 0;
    }

    pub fn pending_frames(&self) -> usize {
        self.frames
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

impl<T: DeserializeOwned> Default for FrameReassembler<T> {
    fn default() -> Self {
        Self::new(ReassemblyLimits::default())
    }
}
