//! Edit translation between host byte-change callbacks and tree-sitter.
//!
//! Hosts report buffer edits in delta form: a start position plus row,
//! column, and byte extents of the old and new text, where the column
//! extent is relative to the start column when the edit stays on one
//! row. Tree-sitter wants absolute byte offsets and points. [`ByteChange`]
//! carries the delta form and [`TextEdit`] the absolute form.

/// A buffer edit as reported by the host's byte-change callback.
///
/// Rows, columns, and bytes are 0-based; columns count bytes. The
/// `old_end_*` / `new_end_*` fields are extents relative to the start:
/// `*_rows` is the number of rows spanned, `*_col` is an absolute column
/// when rows were spanned and a column delta otherwise, and `*_bytes` is
/// the byte length of the old/new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteChange {
    /// Monotonic edit tick, used to key the flush debounce.
    pub tick: u64,
    pub start_row: usize,
    pub start_col: usize,
    pub start_byte: usize,
    pub old_end_rows: usize,
    pub old_end_col: usize,
    pub old_end_bytes: usize,
    pub new_end_rows: usize,
    pub new_end_col: usize,
    pub new_end_bytes: usize,
}

impl ByteChange {
    /// Absolute (row, col) of the end of the replaced text.
    pub fn old_end(&self) -> (usize, usize) {
        resolve_end(self.start_row, self.start_col, self.old_end_rows, self.old_end_col)
    }

    /// Absolute (row, col) of the end of the inserted text.
    pub fn new_end(&self) -> (usize, usize) {
        resolve_end(self.start_row, self.start_col, self.new_end_rows, self.new_end_col)
    }

    /// Translates to the absolute-coordinate form tree-sitter consumes.
    pub fn to_text_edit(&self) -> TextEdit {
        let (old_end_row, old_end_col) = self.old_end();
        let (new_end_row, new_end_col) = self.new_end();
        TextEdit {
            start_byte: self.start_byte,
            old_end_byte: self.start_byte + self.old_end_bytes,
            new_end_byte: self.start_byte + self.new_end_bytes,
            start_row: self.start_row,
            start_col: self.start_col,
            old_end_row,
            old_end_col,
            new_end_row,
            new_end_col,
        }
    }
}

fn resolve_end(start_row: usize, start_col: usize, rows: usize, col: usize) -> (usize, usize) {
    if rows == 0 {
        (start_row, start_col + col)
    } else {
        (start_row + rows, col)
    }
}

/// An edit in absolute coordinates, mirroring `tree_sitter::InputEdit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_row: usize,
    pub start_col: usize,
    pub old_end_row: usize,
    pub old_end_col: usize,
    pub new_end_row: usize,
    pub new_end_col: usize,
}

impl TextEdit {
    /// Converts to a `tree_sitter::InputEdit`.
    pub fn to_input_edit(&self) -> tree_sitter::InputEdit {
        tree_sitter::InputEdit {
            start_byte: self.start_byte,
            old_end_byte: self.old_end_byte,
            new_end_byte: self.new_end_byte,
            start_position: tree_sitter::Point {
                row: self.start_row,
                column: self.start_col,
            },
            old_end_position: tree_sitter::Point {
                row: self.old_end_row,
                column: self.old_end_col,
            },
            new_end_position: tree_sitter::Point {
                row: self.new_end_row,
                column: self.new_end_col,
            },
        }
    }
}

/// Byte offset of a (row, byte-col) position in `text`.
///
/// Positions past the end of a line or of the text saturate to the line
/// or text end.
pub fn position_to_byte(text: &str, row: usize, col: usize) -> usize {
    let mut line_start = 0;
    for _ in 0..row {
        match text[line_start..].find('\n') {
            Some(offset) => line_start += offset + 1,
            None => return text.len(),
        }
    }
    let line_end = text[line_start..]
        .find('\n')
        .map_or(text.len(), |offset| line_start + offset);
    (line_start + col).min(line_end)
}

/// Builds the [`ByteChange`] for inserting `inserted` at (row, col) in
/// `text`, with the given edit tick.
pub fn insert_change(text: &str, row: usize, col: usize, inserted: &str, tick: u64) -> ByteChange {
    let start_byte = position_to_byte(text, row, col);
    let new_end_rows = inserted.matches('\n').count();
    let new_end_col = match inserted.rfind('\n') {
        Some(last) => inserted.len() - last - 1,
        None => inserted.len(),
    };
    ByteChange {
        tick,
        start_row: row,
        start_col: col,
        start_byte,
        old_end_rows: 0,
        old_end_col: 0,
        old_end_bytes: 0,
        new_end_rows,
        new_end_col,
        new_end_bytes: inserted.len(),
    }
}

/// Builds the [`ByteChange`] for deleting the text between two positions.
pub fn delete_change(
    text: &str,
    start_row: usize,
    start_col: usize,
    end_row: usize,
    end_col: usize,
    tick: u64,
) -> ByteChange {
    let start_byte = position_to_byte(text, start_row, start_col);
    let old_end_byte = position_to_byte(text, end_row, end_col);
    let old_end_rows = end_row - start_row;
    let old_end_col = if old_end_rows == 0 {
        end_col - start_col
    } else {
        end_col
    };
    ByteChange {
        tick,
        start_row,
        start_col,
        start_byte,
        old_end_rows,
        old_end_col,
        old_end_bytes: old_end_byte - start_byte,
        new_end_rows: 0,
        new_end_col: 0,
        new_end_bytes: 0,
    }
}
