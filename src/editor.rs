use crate::geometry::{self, GeometryError};

/// Caret, selection and clipboard for the notes of the selected todo.
///
/// The editor does not own the text; each operation takes the notes buffer
/// it applies to. Offsets are character offsets and are re-clamped against
/// the buffer on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesEditor {
    cursor: usize,
    anchor: Option<usize>,
    clipboard: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyScope {
    Selection,
    All,
}

impl NotesEditor {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Selected range as `(start, end)`, whichever side the anchor is on.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.anchor
            .map(|a| (a.min(self.cursor), a.max(self.cursor)))
    }

    /// Places the caret at the end of `text` with nothing selected.
    pub fn seed(&mut self, text: &str) {
        self.cursor = char_len(text);
        self.anchor = None;
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    pub fn clamp(&mut self, text: &str) {
        let len = char_len(text);
        self.cursor = self.cursor.min(len);
        self.anchor = self.anchor.map(|a| a.min(len));
    }

    pub fn insert_char(&mut self, text: &mut String, ch: char) {
        self.clamp(text);
        text.insert(byte_at(text, self.cursor), ch);
        self.cursor += 1;
        self.anchor = None;
    }

    pub fn newline(&mut self, text: &mut String) {
        self.clamp(text);
        text.insert(byte_at(text, self.cursor), '\n');
        self.cursor += 1;
        self.clamp(text);
    }

    pub fn backspace(&mut self, text: &mut String) {
        self.clamp(text);
        if let Some((start, end)) = self.selection() {
            remove_range(text, start, end);
            self.cursor = start;
            self.anchor = None;
        } else if self.cursor > 0 {
            remove_range(text, self.cursor - 1, self.cursor);
            self.cursor -= 1;
        }
        self.clamp(text);
    }

    pub fn toggle_anchor(&mut self) {
        self.anchor = match self.anchor {
            Some(_) => None,
            None => Some(self.cursor),
        };
    }

    /// Copies the selection, or the whole buffer when nothing is selected.
    pub fn copy(&mut self, text: &str) -> CopyScope {
        self.clamp(text);
        match self.selection() {
            Some((start, end)) => {
                self.clipboard = text.chars().skip(start).take(end - start).collect();
                CopyScope::Selection
            }
            None => {
                self.clipboard = text.to_string();
                CopyScope::All
            }
        }
    }

    /// Moves the selection into the clipboard. Returns false, changing
    /// nothing, when there is no selection.
    pub fn cut(&mut self, text: &mut String) -> bool {
        self.clamp(text);
        let Some((start, end)) = self.selection() else {
            return false;
        };
        self.clipboard = remove_range(text, start, end);
        self.cursor = start;
        self.anchor = None;
        self.clamp(text);
        true
    }

    pub fn paste(&mut self, text: &mut String) {
        self.clamp(text);
        if self.clipboard.is_empty() {
            return;
        }
        text.insert_str(byte_at(text, self.cursor), &self.clipboard);
        self.cursor += char_len(&self.clipboard);
        self.clamp(text);
    }

    pub fn move_left(&mut self, text: &str) {
        self.clamp(text);
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self, text: &str) {
        self.clamp(text);
        self.cursor = (self.cursor + 1).min(char_len(text));
    }

    /// Moves one wrapped row up, keeping the display column.
    pub fn move_up(&mut self, text: &str, width: usize) -> Result<(), GeometryError> {
        self.clamp(text);
        let (row, col) = geometry::offset_to_row_col(text, width, self.cursor)?;
        if row > 0 {
            self.cursor = geometry::row_col_to_offset(text, width, row - 1, col)?;
        }
        Ok(())
    }

    /// Moves one wrapped row down, keeping the display column.
    pub fn move_down(&mut self, text: &str, width: usize) -> Result<(), GeometryError> {
        self.clamp(text);
        let (row, col) = geometry::offset_to_row_col(text, width, self.cursor)?;
        let rows = geometry::wrap(text, width)?.len();
        if row + 1 < rows {
            self.cursor = geometry::row_col_to_offset(text, width, row + 1, col)?;
        }
        Ok(())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn byte_at(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Removes the characters in `start..end` and returns them.
fn remove_range(text: &mut String, start: usize, end: usize) -> String {
    let from = byte_at(text, start);
    let to = byte_at(text, end);
    text.drain(from..to).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor_at(text: &str, cursor: usize) -> NotesEditor {
        let mut editor = NotesEditor::default();
        editor.seed(text);
        editor.cursor = cursor;
        editor
    }

    #[test]
    fn typing_splices_at_cursor_and_clears_selection() {
        let mut text = String::from("helo");
        let mut editor = editor_at(&text, 3);
        editor.toggle_anchor();
        editor.insert_char(&mut text, 'l');
        assert_eq!(text, "hello");
        assert_eq!(editor.cursor(), 4);
        assert_eq!(editor.anchor(), None);
    }

    #[test]
    fn newline_advances_cursor() {
        let mut text = String::from("ab");
        let mut editor = editor_at(&text, 1);
        editor.newline(&mut text);
        assert_eq!(text, "a\nb");
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut text = String::from("abc");
        let mut editor = editor_at(&text, 0);
        editor.backspace(&mut text);
        assert_eq!(text, "abc");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn backspace_removes_previous_multibyte_char() {
        let mut text = String::from("añb");
        let mut editor = editor_at(&text, 2);
        editor.backspace(&mut text);
        assert_eq!(text, "ab");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn backspace_deletes_selection_either_direction() {
        let mut text = String::from("hello world");
        let mut editor = editor_at(&text, 11);
        editor.toggle_anchor();
        editor.cursor = 5;
        editor.backspace(&mut text);
        assert_eq!(text, "hello");
        assert_eq!(editor.cursor(), 5);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn toggling_anchor_twice_leaves_no_selection() {
        let mut editor = editor_at("abc", 2);
        editor.toggle_anchor();
        assert_eq!(editor.anchor(), Some(2));
        editor.toggle_anchor();
        assert_eq!(editor.anchor(), None);
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn copy_without_selection_takes_everything() {
        let text = String::from("all of it");
        let mut editor = editor_at(&text, 3);
        assert_eq!(editor.copy(&text), CopyScope::All);
        assert_eq!(editor.clipboard(), "all of it");
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn copy_selection_is_order_independent() {
        let text = String::from("abcdef");
        let mut editor = editor_at(&text, 4);
        editor.toggle_anchor();
        editor.move_left(&text);
        editor.move_left(&text);
        editor.move_left(&text);
        assert_eq!(editor.copy(&text), CopyScope::Selection);
        assert_eq!(editor.clipboard(), "bcd");
    }

    #[test]
    fn cut_without_selection_changes_nothing() {
        let mut text = String::from("keep me");
        let mut editor = editor_at(&text, 2);
        editor.clipboard = "old".into();
        assert!(!editor.cut(&mut text));
        assert_eq!(text, "keep me");
        assert_eq!(editor.clipboard(), "old");
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn cut_then_paste_moves_text() {
        let mut text = String::from("one two three");
        let mut editor = editor_at(&text, 4);
        editor.toggle_anchor();
        editor.cursor = 8;
        assert!(editor.cut(&mut text));
        assert_eq!(text, "one three");
        assert_eq!(editor.clipboard(), "two ");
        assert_eq!(editor.cursor(), 4);

        editor.cursor = 0;
        editor.paste(&mut text);
        assert_eq!(text, "two one three");
        assert_eq!(editor.cursor(), 4);
    }

    #[test]
    fn horizontal_moves_clamp_to_buffer() {
        let text = "ab";
        let mut editor = editor_at(text, 2);
        editor.move_right(text);
        assert_eq!(editor.cursor(), 2);
        editor.cursor = 0;
        editor.move_left(text);
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn vertical_moves_follow_wrapped_rows() {
        // width 4: "abcd" / "efgh" / "ij"
        let text = "abcdefghij";
        let mut editor = editor_at(text, 9);
        editor.move_up(text, 4).unwrap();
        assert_eq!(editor.cursor(), 5);
        editor.move_up(text, 4).unwrap();
        assert_eq!(editor.cursor(), 1);
        editor.move_up(text, 4).unwrap();
        assert_eq!(editor.cursor(), 1);
        editor.move_down(text, 4).unwrap();
        editor.move_down(text, 4).unwrap();
        assert_eq!(editor.cursor(), 9);
        editor.move_down(text, 4).unwrap();
        assert_eq!(editor.cursor(), 9);
    }

    #[test]
    fn vertical_move_onto_shorter_line_clamps_column() {
        let text = "hi\nlonger line";
        let mut editor = editor_at(text, 10);
        editor.move_up(text, 20).unwrap();
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn vertical_move_rejects_zero_width() {
        let text = "abc";
        let mut editor = editor_at(text, 1);
        assert_eq!(editor.move_up(text, 0), Err(GeometryError::ZeroWidth));
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn stale_offsets_are_clamped_after_external_change() {
        let mut editor = editor_at("a long note", 11);
        editor.toggle_anchor();
        let mut text = String::from("abc");
        editor.insert_char(&mut text, '!');
        assert_eq!(text, "abc!");
        assert_eq!(editor.cursor(), 4);
    }
}
