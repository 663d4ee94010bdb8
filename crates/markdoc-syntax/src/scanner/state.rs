//! Persistent scanner state and its byte serialization.

use crate::error::StateError;

/// An open fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fence {
    /// `` ` `` or `~`
    pub ch: u8,
    /// Length of the opening run; the closing run must be at least this long.
    pub len: usize,
}

/// One level of list nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListFrame {
    /// Column of the item markers at this level.
    pub marker_col: usize,
    /// Column continuation lines must reach to stay inside the current item.
    pub content_col: usize,
}

/// State threaded through every [`Scanner::scan`](super::Scanner::scan) call.
///
/// A value type: the parser keeps one, the scanner returns an updated copy
/// with each token, and an incremental re-parse can resume from any snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScannerState {
    pub(crate) emitted_any: bool,
    pub(crate) in_frontmatter: bool,
    pub(crate) fence: Option<Fence>,
    pub(crate) lists: Vec<ListFrame>,
}

const EMITTED_ANY: u8 = 0b001;
const IN_FRONTMATTER: u8 = 0b010;
const HAS_FENCE: u8 = 0b100;

impl ScannerState {
    /// Whether a non-trivia token has been produced yet. Frontmatter is only
    /// legal while this is false.
    pub fn emitted_any(&self) -> bool {
        self.emitted_any
    }

    pub fn in_frontmatter(&self) -> bool {
        self.in_frontmatter
    }

    pub fn fence(&self) -> Option<Fence> {
        self.fence
    }

    /// Open list levels, outermost first.
    pub fn lists(&self) -> &[ListFrame] {
        &self.lists
    }

    pub(crate) fn mark_emitted(&mut self) {
        self.emitted_any = true;
    }

    /// Force-close a fence left open at end of input.
    pub(crate) fn clear_fence(&mut self) {
        self.fence = None;
    }

    /// Column continuation lines are measured against inside the current
    /// list item, or zero outside lists.
    pub(crate) fn content_col(&self) -> usize {
        self.lists.last().map_or(0, |frame| frame.content_col)
    }

    /// Encode as bytes for an external engine to store between calls.
    ///
    /// Layout: a flag byte, then the fence (`ch`, `len` as u32 LE) when
    /// present, then a u16 LE frame count and each frame as two u32 LE.
    pub fn serialize(&self) -> Vec<u8> {
        let mut flags = 0;
        if self.emitted_any {
            flags |= EMITTED_ANY;
        }
        if self.in_frontmatter {
            flags |= IN_FRONTMATTER;
        }
        if self.fence.is_some() {
            flags |= HAS_FENCE;
        }

        let mut out = vec![flags];
        if let Some(fence) = self.fence {
            out.push(fence.ch);
            out.extend_from_slice(&saturate(fence.len).to_le_bytes());
        }
        let count = u16::try_from(self.lists.len()).unwrap_or(u16::MAX);
        out.extend_from_slice(&count.to_le_bytes());
        for frame in self.lists.iter().take(usize::from(count)) {
            out.extend_from_slice(&saturate(frame.marker_col).to_le_bytes());
            out.extend_from_slice(&saturate(frame.content_col).to_le_bytes());
        }
        out
    }

    /// Decode bytes produced by [`serialize`](Self::serialize). An empty
    /// slice is the initial state.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, StateError> {
        let Some((&flags, mut rest)) = bytes.split_first() else {
            return Ok(Self::default());
        };
        if flags & !(EMITTED_ANY | IN_FRONTMATTER | HAS_FENCE) != 0 {
            return Err(StateError::InvalidFlags(flags));
        }

        let fence = if flags & HAS_FENCE != 0 {
            let (&ch, tail) = rest.split_first().ok_or(StateError::Truncated)?;
            if !matches!(ch, b'`' | b'~') {
                return Err(StateError::InvalidFence(ch));
            }
            rest = tail;
            let len = read_u32(&mut rest)?;
            Some(Fence { ch, len })
        } else {
            None
        };

        let count = match rest {
            [a, b, tail @ ..] => {
                rest = tail;
                u16::from_le_bytes([*a, *b])
            }
            _ => return Err(StateError::Truncated),
        };
        let mut lists = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let marker_col = read_u32(&mut rest)?;
            let content_col = read_u32(&mut rest)?;
            lists.push(ListFrame {
                marker_col,
                content_col,
            });
        }
        if !rest.is_empty() {
            return Err(StateError::TrailingBytes(rest.len()));
        }

        Ok(Self {
            emitted_any: flags & EMITTED_ANY != 0,
            in_frontmatter: flags & IN_FRONTMATTER != 0,
            fence,
            lists,
        })
    }
}

fn saturate(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn read_u32(bytes: &mut &[u8]) -> Result<usize, StateError> {
    let current: &[u8] = *bytes;
    let (head, tail) = current
        .split_first_chunk::<4>()
        .ok_or(StateError::Truncated)?;
    *bytes = tail;
    Ok(u32::from_le_bytes(*head) as usize)
}
