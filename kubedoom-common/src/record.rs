//! Fixed-width records of the `list` response
//!
//! The game slices the response stream at a constant stride, so every
//! qualified pod name is left-justified in a field of `width` bytes and the
//! rest of the field is filled with [`FILLER`]. A newline filler keeps the
//! records readable for line-oriented clients as well.

/// Byte used to pad a name up to the record width
pub const FILLER: u8 = b'\n';

/// Record width expected by the game client
pub const DEFAULT_RECORD_WIDTH: usize = 255;

/// What to do with a name that does not fit in one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverflowPolicy {
    /// Leave the pod out of the listing
    #[default]
    Skip,
    /// Cut the name at the last character boundary that fits
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub width: usize,
    pub overflow: OverflowPolicy,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_RECORD_WIDTH,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Encode `name` as one record.
///
/// Returns `None` when the name is longer than the layout width and the
/// overflow policy is [`OverflowPolicy::Skip`].
pub fn encode_record(name: &str, layout: &RecordLayout) -> Option<Vec<u8>> {
    let name = if name.len() > layout.width {
        match layout.overflow {
            OverflowPolicy::Skip => return None,
            OverflowPolicy::Truncate => truncate_at_boundary(name, layout.width),
        }
    } else {
        name
    };

    let mut record = Vec::with_capacity(layout.width);
    record.extend_from_slice(name.as_bytes());
    record.resize(layout.width, FILLER);
    Some(record)
}

/// Split a `list` response back into names, dropping the filler.
///
/// A trailing partial record is decoded as well; empty records are skipped.
pub fn decode_records(data: &[u8], width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    data.chunks(width)
        .filter_map(|chunk| {
            let end = chunk
                .iter()
                .rposition(|b| *b != FILLER)
                .map(|pos| pos + 1)?;
            Some(String::from_utf8_lossy(&chunk[..end]).into_owned())
        })
        .collect()
}

fn truncate_at_boundary(name: &str, width: usize) -> &str {
    let mut end = width;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
