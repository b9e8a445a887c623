use serde::{Deserialize, Serialize};

/// A byte offset within the original program text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BytePos(pub u32);

/// A half-open `[start, end)` byte range in the original program text.
///
/// The front-end that produced the annotated tree is free to omit spans;
/// nodes synthesized during lowering never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: BytePos,
    pub end: BytePos,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: BytePos(start),
            end: BytePos(end),
        }
    }
}
