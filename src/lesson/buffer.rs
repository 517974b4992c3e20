//! Source buffer editing surface
//!
//! A line-oriented text buffer with a cursor, read-only mode, and locked
//! sub-ranges. Edits never create or join lines: text containing a line
//! break is rejected, and deleting across a line boundary is rejected.
//! Lesson templates lock the `print(` / `input(` call tokens and each such
//! line's last `)`, leaving only the arguments editable.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static CALL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:print|input)\s*\(").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("the editor is read-only while the program runs")]
    ReadOnly,
    #[error("that part of line {line} is locked")]
    Locked { line: usize },
    #[error("only single-line edits are allowed")]
    MultiLine,
    #[error("line {0} does not exist")]
    NoSuchLine(usize),
}

/// Locked character columns `[start, end)` on one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedRange {
    pub start: usize,
    pub end: usize,
}

impl LockedRange {
    /// Inserting strictly inside the range is refused; at either edge is fine.
    fn blocks_insert_at(&self, column: usize) -> bool {
        self.start < column && column < self.end
    }

    fn covers(&self, column: usize) -> bool {
        self.start <= column && column < self.end
    }
}

/// Cursor position in character columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct SourceBuffer {
    lines: Vec<String>,
    locks: Vec<Vec<LockedRange>>,
    cursor: Cursor,
    read_only: bool,
}

impl SourceBuffer {
    /// Load `text` and lock its call tokens
    pub fn new(text: &str) -> Self {
        let mut buffer = SourceBuffer {
            lines: Vec::new(),
            locks: Vec::new(),
            cursor: Cursor::default(),
            read_only: false,
        };
        buffer.load(text);
        buffer
    }

    /// Replace the whole content (lesson load / reset), re-locking call tokens
    pub fn load(&mut self, text: &str) {
        self.lines = text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect();
        self.locks = vec![Vec::new(); self.lines.len()];
        self.cursor = Cursor::default();
        self.lock_call_tokens();
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn locked_ranges(&self, line: usize) -> &[LockedRange] {
        self.locks.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_locked(&self, line: usize, column: usize) -> bool {
        self.locked_ranges(line).iter().any(|r| r.covers(column))
    }

    /// Mark columns `[start, end)` of `line` as non-editable
    pub fn lock(&mut self, line: usize, start: usize, end: usize) -> Result<(), EditError> {
        let ranges = self.locks.get_mut(line).ok_or(EditError::NoSuchLine(line))?;
        if start < end {
            ranges.push(LockedRange { start, end });
            ranges.sort_by_key(|r| r.start);
        }
        Ok(())
    }

    /// Lock every `print(` / `input(` token and the last `)` of its line
    pub fn lock_call_tokens(&mut self) {
        for index in 0..self.lines.len() {
            self.lock_line_calls(index);
        }
    }

    fn lock_line_calls(&mut self, index: usize) {
        let line = &self.lines[index];
        let mut ranges = Vec::new();
        for m in CALL_TOKEN.find_iter(line) {
            let start = line[..m.start()].chars().count();
            let end = start + m.as_str().chars().count();
            ranges.push(LockedRange { start, end });
        }
        if !ranges.is_empty() {
            if let Some(close) = line.rfind(')') {
                let column = line[..close].chars().count();
                if !ranges.iter().any(|r| r.covers(column)) {
                    ranges.push(LockedRange {
                        start: column,
                        end: column + 1,
                    });
                }
            }
        }
        ranges.sort_by_key(|r| r.start);
        self.locks[index] = ranges;
    }

    /// Line-level write. Existing locks on the line are recomputed.
    pub fn set_line(&mut self, index: usize, text: &str) -> Result<(), EditError> {
        self.ensure_writable()?;
        if text.contains(['\n', '\r']) {
            return Err(EditError::MultiLine);
        }
        let line = self.lines.get_mut(index).ok_or(EditError::NoSuchLine(index))?;
        *line = text.to_string();
        self.lock_line_calls(index);
        self.clamp_cursor();
        Ok(())
    }

    /// Insert single-line text at the cursor
    pub fn insert(&mut self, text: &str) -> Result<(), EditError> {
        self.ensure_writable()?;
        if text.contains(['\n', '\r']) {
            return Err(EditError::MultiLine);
        }
        let Cursor { line, column } = self.cursor;
        if self.locked_ranges(line).iter().any(|r| r.blocks_insert_at(column)) {
            return Err(EditError::Locked { line: line + 1 });
        }

        let inserted = text.chars().count();
        let current = &mut self.lines[line];
        let at = byte_offset(current, column);
        current.insert_str(at, text);

        for range in &mut self.locks[line] {
            if range.start >= column {
                range.start += inserted;
                range.end += inserted;
            }
        }
        self.cursor.column += inserted;
        Ok(())
    }

    pub fn insert_char(&mut self, c: char) -> Result<(), EditError> {
        let mut buf = [0u8; 4];
        self.insert(c.encode_utf8(&mut buf))
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) -> Result<(), EditError> {
        self.ensure_writable()?;
        let Cursor { line, column } = self.cursor;
        if column == 0 {
            return Err(EditError::MultiLine);
        }
        self.remove_char(line, column - 1)?;
        self.cursor.column -= 1;
        Ok(())
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self) -> Result<(), EditError> {
        self.ensure_writable()?;
        let Cursor { line, column } = self.cursor;
        if column >= self.lines[line].chars().count() {
            return Err(EditError::MultiLine);
        }
        self.remove_char(line, column)
    }

    fn remove_char(&mut self, line: usize, column: usize) -> Result<(), EditError> {
        if self.is_locked(line, column) {
            return Err(EditError::Locked { line: line + 1 });
        }
        let current = &mut self.lines[line];
        let at = byte_offset(current, column);
        current.remove(at);
        for range in &mut self.locks[line] {
            if range.start > column {
                range.start -= 1;
                range.end -= 1;
            }
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), EditError> {
        if self.read_only {
            Err(EditError::ReadOnly)
        } else {
            Ok(())
        }
    }

    // ===== Cursor movement =====

    pub fn move_left(&mut self) {
        if self.cursor.column > 0 {
            self.cursor.column -= 1;
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.column = self.line_len(self.cursor.line);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor.column < self.line_len(self.cursor.line) {
            self.cursor.column += 1;
        } else if self.cursor.line + 1 < self.lines.len() {
            self.cursor.line += 1;
            self.cursor.column = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.clamp_cursor();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor.line + 1 < self.lines.len() {
            self.cursor.line += 1;
            self.clamp_cursor();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor.column = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor.column = self.line_len(self.cursor.line);
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn clamp_cursor(&mut self) {
        self.cursor.line = self.cursor.line.min(self.lines.len().saturating_sub(1));
        self.cursor.column = self.cursor.column.min(self.line_len(self.cursor.line));
    }
}

fn byte_offset(text: &str, column: usize) -> usize {
    text.char_indices()
        .nth(column)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(buffer: &mut SourceBuffer, line: usize, column: usize) {
        buffer.cursor = Cursor { line, column };
    }

    #[test]
    fn test_locks_print_token_and_closing_paren() {
        let buffer = SourceBuffer::new("print(\"Hello World!\")");
        assert_eq!(
            buffer.locked_ranges(0),
            &[
                LockedRange { start: 0, end: 6 },
                LockedRange { start: 20, end: 21 }
            ]
        );
    }

    #[test]
    fn test_arguments_stay_editable() {
        let mut buffer = SourceBuffer::new("print(name)");
        at(&mut buffer, 0, 6);
        buffer.insert("my_").expect("insert at edge of lock");
        assert_eq!(buffer.text(), "print(my_name)");
        // The closing paren lock shifted with the insertion
        assert!(buffer.is_locked(0, 13));
    }

    #[test]
    fn test_cannot_edit_inside_call_token() {
        let mut buffer = SourceBuffer::new("print(x)");
        at(&mut buffer, 0, 3);
        assert_eq!(buffer.insert("z"), Err(EditError::Locked { line: 1 }));
        at(&mut buffer, 0, 6);
        assert_eq!(buffer.backspace(), Err(EditError::Locked { line: 1 }));
        at(&mut buffer, 0, 7);
        assert_eq!(buffer.delete(), Err(EditError::Locked { line: 1 }));
    }

    #[test]
    fn test_multiline_edits_rejected() {
        let mut buffer = SourceBuffer::new("a = 1\nb = 2");
        assert_eq!(buffer.insert("x = 1\ny = 2"), Err(EditError::MultiLine));
        at(&mut buffer, 1, 0);
        assert_eq!(buffer.backspace(), Err(EditError::MultiLine));
        at(&mut buffer, 0, 5);
        assert_eq!(buffer.delete(), Err(EditError::MultiLine));
        assert_eq!(buffer.set_line(0, "a\nb"), Err(EditError::MultiLine));
        assert_eq!(buffer.line_count(), 2);
    }

    #[test]
    fn test_read_only_mode() {
        let mut buffer = SourceBuffer::new("x = 1");
        buffer.set_read_only(true);
        assert_eq!(buffer.insert_char('2'), Err(EditError::ReadOnly));
        buffer.set_read_only(false);
        buffer.move_end();
        buffer.insert_char('2').expect("insert");
        assert_eq!(buffer.text(), "x = 12");
    }

    #[test]
    fn test_set_line_relocks() {
        let mut buffer = SourceBuffer::new("x = 1");
        buffer.set_line(0, "x = input()").expect("set");
        assert_eq!(buffer.locked_ranges(0).len(), 2);
        assert!(buffer.is_locked(0, 4));
    }

    #[test]
    fn test_cursor_wraps_between_lines() {
        let mut buffer = SourceBuffer::new("ab\ncd");
        at(&mut buffer, 0, 2);
        buffer.move_right();
        assert_eq!(buffer.cursor(), Cursor { line: 1, column: 0 });
        buffer.move_left();
        assert_eq!(buffer.cursor(), Cursor { line: 0, column: 2 });
    }
}
