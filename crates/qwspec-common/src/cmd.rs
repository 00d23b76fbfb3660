// cmd.rs — Quake script command processing module
//
// Command text is queued in a buffer, split into lines on '\n' or an
// unquoted ';', and tokenized into argv. Dispatch of a tokenized line is left
// to the owner of the buffer (the client session), which knows its handlers.

use crate::common::com_printf;
use crate::q_shared::{MAX_STRING_CHARS, MAX_STRING_TOKENS};

use std::collections::HashMap;

pub const MAX_ALIAS_NAME: usize = 32;
pub const ALIAS_LOOP_COUNT: i32 = 16;
pub const CBUF_MAXSIZE: usize = 8192;

/// A command alias.
#[derive(Debug, Clone)]
pub struct CmdAlias {
    pub name: String,
    pub value: String,
}

/// A tokenized command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmdArgs {
    argv: Vec<String>,
    args: String,
}

impl CmdArgs {
    /// Get the number of arguments.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Get argument by index. Returns empty string if out of range.
    pub fn argv(&self, arg: usize) -> &str {
        self.argv.get(arg).map_or("", |s| s.as_str())
    }

    /// Get all arguments after the first as a single string.
    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn argv_slice(&self) -> Vec<&str> {
        self.argv.iter().map(|s| s.as_str()).collect()
    }
}

/// Parse one token starting at `pos`: either a quoted string or a run of
/// non-whitespace. Returns the token and the position after it.
fn com_parse_inline(bytes: &[u8], mut pos: usize) -> (String, usize) {
    if pos < bytes.len() && bytes[pos] == b'"' {
        pos += 1;
        let start = pos;
        while pos < bytes.len() && bytes[pos] != b'"' && bytes[pos] != b'\n' {
            pos += 1;
        }
        let token = String::from_utf8_lossy(&bytes[start..pos]).to_string();
        if pos < bytes.len() && bytes[pos] == b'"' {
            pos += 1;
        }
        return (token, pos);
    }

    let start = pos;
    while pos < bytes.len() && bytes[pos] > b' ' {
        pos += 1;
    }
    (String::from_utf8_lossy(&bytes[start..pos]).to_string(), pos)
}

/// Parse the given string into command line tokens.
pub fn cmd_tokenize_string(text: &str) -> CmdArgs {
    let mut out = CmdArgs::default();
    let bytes = text.as_bytes();
    let mut pos = 0;

    loop {
        // Skip whitespace up to a \n
        while pos < bytes.len() && bytes[pos] <= b' ' && bytes[pos] != b'\n' {
            pos += 1;
        }

        if pos >= bytes.len() || bytes[pos] == b'\n' {
            break;
        }

        // Set args to everything after the first arg
        if out.argv.len() == 1 {
            out.args = String::from_utf8_lossy(&bytes[pos..]).trim_end().to_string();
        }

        let (token, new_pos) = com_parse_inline(bytes, pos);
        if new_pos == pos {
            break;
        }
        pos = new_pos;

        if out.argv.len() < MAX_STRING_TOKENS {
            out.argv.push(token);
        }
    }

    out
}

/// Command buffer and alias table.
#[derive(Default)]
pub struct CmdContext {
    cmd_text: String,
    cmd_alias: Vec<CmdAlias>,
    /// alias lookup by name (lowercase) -> index in cmd_alias
    cmd_alias_index: HashMap<String, usize>,
    pub alias_count: i32,
}

impl CmdContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================
    // Command buffer operations (Cbuf_*)
    // ========================================================

    /// Add command text at the end of the buffer.
    pub fn cbuf_add_text(&mut self, text: &str) {
        if self.cmd_text.len() + text.len() >= CBUF_MAXSIZE {
            com_printf("Cbuf_AddText: overflow\n");
            return;
        }
        self.cmd_text.push_str(text);
    }

    /// Insert command text immediately before whatever is still queued.
    pub fn cbuf_insert_text(&mut self, text: &str) {
        if self.cmd_text.len() + text.len() >= CBUF_MAXSIZE {
            com_printf("Cbuf_InsertText: overflow\n");
            return;
        }
        self.cmd_text.insert_str(0, text);
    }

    pub fn cbuf_is_empty(&self) -> bool {
        self.cmd_text.is_empty()
    }

    /// Pop the next command line off the buffer. Lines end at '\n' or at a
    /// ';' outside quotes.
    pub fn cbuf_next_line(&mut self) -> Option<String> {
        if self.cmd_text.is_empty() {
            return None;
        }

        let mut quotes = 0;
        let mut end = self.cmd_text.len();
        for (i, ch) in self.cmd_text.bytes().enumerate() {
            if ch == b'"' {
                quotes += 1;
            }
            if (quotes & 1) == 0 && ch == b';' {
                end = i;
                break;
            }
            if ch == b'\n' {
                end = i;
                break;
            }
        }

        let line = self.cmd_text[..end].to_string();
        let skip = (end + 1).min(self.cmd_text.len());
        self.cmd_text.drain(..skip);

        if line.len() >= MAX_STRING_CHARS {
            com_printf(&format!("Line exceeded {} chars, discarded.\n", MAX_STRING_CHARS));
            return Some(String::new());
        }
        Some(line)
    }

    // ========================================================
    // Alias management
    // ========================================================

    /// Create or update an alias.
    pub fn cmd_alias_set(&mut self, name: &str, value: &str) {
        if name.len() >= MAX_ALIAS_NAME {
            com_printf("Alias name is too long\n");
            return;
        }

        let key = name.to_ascii_lowercase();
        if let Some(&idx) = self.cmd_alias_index.get(&key) {
            self.cmd_alias[idx].value = value.to_string();
            return;
        }

        let idx = self.cmd_alias.len();
        self.cmd_alias.push(CmdAlias {
            name: name.to_string(),
            value: value.to_string(),
        });
        self.cmd_alias_index.insert(key, idx);
    }

    pub fn cmd_find_alias(&self, name: &str) -> Option<&CmdAlias> {
        self.cmd_alias_index
            .get(&name.to_ascii_lowercase())
            .map(|&idx| &self.cmd_alias[idx])
    }

    /// Expand an alias in place: its text is inserted ahead of the buffer.
    /// Returns false when the name is not an alias or the loop guard tripped.
    pub fn cmd_expand_alias(&mut self, name: &str) -> bool {
        let Some(value) = self.cmd_find_alias(name).map(|a| a.value.clone()) else {
            return false;
        };
        self.alias_count += 1;
        if self.alias_count >= ALIAS_LOOP_COUNT {
            com_printf("ALIAS_LOOP_COUNT\n");
            return false;
        }
        self.cbuf_insert_text(&format!("{}\n", value));
        true
    }

    /// Cmd_Alias_f — "alias <name> <command...>".
    pub fn cmd_alias_f(&mut self, args: &CmdArgs) {
        if args.argc() <= 2 {
            for alias in &self.cmd_alias {
                com_printf(&format!("{} : {}\n", alias.name, alias.value));
            }
            return;
        }

        let value = (2..args.argc())
            .map(|i| args.argv(i))
            .collect::<Vec<_>>()
            .join(" ");
        self.cmd_alias_set(args.argv(1), &value);
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let args = cmd_tokenize_string("track  \"Player One\"  ");
        assert_eq!(args.argc(), 2);
        assert_eq!(args.argv(0), "track");
        assert_eq!(args.argv(1), "Player One");
        assert_eq!(args.args(), "\"Player One\"");
        assert_eq!(args.argv(5), "");
    }

    #[test]
    fn test_tokenize_stops_at_newline() {
        let args = cmd_tokenize_string("cam_pos 1 2 3\nignored");
        assert_eq!(args.argv_slice(), vec!["cam_pos", "1", "2", "3"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(cmd_tokenize_string("   ").argc(), 0);
    }

    #[test]
    fn test_cbuf_splits_lines() {
        let mut ctx = CmdContext::new();
        ctx.cbuf_add_text("track 3; say \"a;b\"\nautotrack\n");
        assert_eq!(ctx.cbuf_next_line().as_deref(), Some("track 3"));
        assert_eq!(ctx.cbuf_next_line().as_deref(), Some(" say \"a;b\""));
        assert_eq!(ctx.cbuf_next_line().as_deref(), Some("autotrack"));
        assert_eq!(ctx.cbuf_next_line(), None);
        assert!(ctx.cbuf_is_empty());
    }

    #[test]
    fn test_cbuf_insert_goes_first() {
        let mut ctx = CmdContext::new();
        ctx.cbuf_add_text("second\n");
        ctx.cbuf_insert_text("first\n");
        assert_eq!(ctx.cbuf_next_line().as_deref(), Some("first"));
        assert_eq!(ctx.cbuf_next_line().as_deref(), Some("second"));
    }

    #[test]
    fn test_alias_set_and_find_case_insensitive() {
        let mut ctx = CmdContext::new();
        ctx.cmd_alias_set("f_trackspectate", "echo tracking");
        assert!(ctx.cmd_find_alias("F_TRACKSPECTATE").is_some());
        ctx.cmd_alias_set("f_trackspectate", "echo again");
        assert_eq!(ctx.cmd_find_alias("f_trackspectate").map(|a| a.value.as_str()), Some("echo again"));
    }

    #[test]
    fn test_alias_expand_loop_guard() {
        let mut ctx = CmdContext::new();
        ctx.cmd_alias_set("loop", "loop");
        let mut expansions = 0;
        while ctx.cmd_expand_alias("loop") {
            expansions += 1;
            ctx.cbuf_next_line();
        }
        assert_eq!(expansions, ALIAS_LOOP_COUNT - 1);
    }

    #[test]
    fn test_alias_f_joins_arguments() {
        let mut ctx = CmdContext::new();
        ctx.cmd_alias_f(&cmd_tokenize_string("alias autotrack impulse 154"));
        assert_eq!(ctx.cmd_find_alias("autotrack").map(|a| a.value.as_str()), Some("impulse 154"));
    }
}
