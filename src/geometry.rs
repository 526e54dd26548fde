//! Mapping between a raw notes buffer and its wrapped display layout.
//!
//! Offsets are character offsets into the raw text. Every function here is
//! derived from one wrap table, so offsets and (row, col) pairs always agree.

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("wrap width must be at least 1")]
    ZeroWidth,
}

/// One display row of wrapped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    /// Raw offset of the first character of this row.
    pub start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Row {
    start: usize,
    len: usize,
    /// The caret may sit one past the last character of this row.
    open_end: bool,
}

impl Row {
    fn last_caret_col(&self) -> usize {
        if self.open_end {
            self.len
        } else {
            self.len - 1
        }
    }
}

struct WrapTable {
    rows: Vec<Row>,
    total: usize,
}

impl WrapTable {
    fn build(text: &str, width: usize) -> Result<Self, GeometryError> {
        if width == 0 {
            return Err(GeometryError::ZeroWidth);
        }
        let mut rows = Vec::new();
        let mut offset = 0;
        for paragraph in text.split('\n') {
            let plen = paragraph.chars().count();
            let mut i = 0;
            while i < plen {
                let len = width.min(plen - i);
                rows.push(Row {
                    start: offset + i,
                    len,
                    open_end: i + len == plen && len < width,
                });
                i += len;
            }
            // Empty paragraphs and paragraphs that fill their last row exactly
            // get an empty row for the caret to land on.
            if plen % width == 0 {
                rows.push(Row {
                    start: offset + plen,
                    len: 0,
                    open_end: true,
                });
            }
            offset += plen + 1;
        }
        Ok(WrapTable {
            rows,
            total: offset - 1,
        })
    }

    fn offset_to_row_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.total);
        let row = self
            .rows
            .partition_point(|r| r.start <= offset)
            .saturating_sub(1);
        (row, offset - self.rows[row].start)
    }

    fn row_col_to_offset(&self, row: usize, col: usize) -> usize {
        match self.rows.get(row) {
            Some(r) => r.start + col.min(r.last_caret_col()),
            None => self.total,
        }
    }
}

/// Hard-wraps `text` into rows of at most `width` characters.
pub fn wrap(text: &str, width: usize) -> Result<Vec<WrappedLine>, GeometryError> {
    let table = WrapTable::build(text, width)?;
    let chars: Vec<char> = text.chars().collect();
    Ok(table
        .rows
        .iter()
        .map(|r| WrappedLine {
            text: chars[r.start..r.start + r.len].iter().collect(),
            start: r.start,
        })
        .collect())
}

/// Row and column of a raw offset. Offsets past the end clamp to the end.
pub fn offset_to_row_col(
    text: &str,
    width: usize,
    offset: usize,
) -> Result<(usize, usize), GeometryError> {
    Ok(WrapTable::build(text, width)?.offset_to_row_col(offset))
}

/// Raw offset at a display position. Rows past the end map to the buffer
/// length; columns past a row's end clamp to the row's last caret position.
pub fn row_col_to_offset(
    text: &str,
    width: usize,
    row: usize,
    col: usize,
) -> Result<usize, GeometryError> {
    Ok(WrapTable::build(text, width)?.row_col_to_offset(row, col))
}
