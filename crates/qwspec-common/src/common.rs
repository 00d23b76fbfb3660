// common.rs — console printing shared by client and tools
//
// User-visible text goes through com_printf, which can be redirected into a
// buffer (command capture, tests). Developer chatter goes to tracing at debug
// level and is filtered by whatever subscriber the binary installs.

use std::cell::RefCell;

// ============================================================
// Redirect buffer for Com_Printf
// ============================================================

// Per thread: the simulation thread owns its console.
thread_local! {
    static RD_BUFFER: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Begin redirecting printf output into a buffer.
pub fn com_begin_redirect() {
    RD_BUFFER.with(|b| *b.borrow_mut() = Some(String::new()));
}

/// End redirect and return the captured output.
pub fn com_end_redirect() -> Option<String> {
    RD_BUFFER.with(|b| b.borrow_mut().take())
}

// ============================================================
// Com_Printf / Com_DPrintf
// ============================================================

/// General-purpose print function. Prints to stdout, or appends to the
/// redirect buffer if one is active.
pub fn com_printf(msg: &str) {
    let redirected = RD_BUFFER.with(|b| match b.borrow_mut().as_mut() {
        Some(s) => {
            s.push_str(msg);
            true
        }
        None => false,
    });
    if redirected {
        return;
    }
    print!("{}", msg);
}

/// Developer-only print.
pub fn com_dprintf(msg: &str) {
    tracing::debug!("{}", msg.trim_end());
}

/// Run `f` with console output captured; returns the closure result and the
/// captured text. Nested captures are flattened into the outermost one.
pub fn com_capture<F, R>(f: F) -> (R, String)
where
    F: FnOnce() -> R,
{
    let nested = RD_BUFFER.with(|b| b.borrow().is_some());
    if nested {
        return (f(), String::new());
    }
    com_begin_redirect();
    let r = f();
    let text = com_end_redirect().unwrap_or_default();
    (r, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_captures_output() {
        let (_, text) = com_capture(|| {
            com_printf("hello ");
            com_printf("world\n");
        });
        assert_eq!(text, "hello world\n");
    }

    #[test]
    fn test_dprintf_is_not_captured() {
        let (_, text) = com_capture(|| com_dprintf("debug only\n"));
        assert!(text.is_empty());
    }
}
