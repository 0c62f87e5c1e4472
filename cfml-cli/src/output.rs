//! Terminal messages for the `cfml` binary.
//! `cfml` 命令的终端消息。
//!
//! Status lines go to stderr so that `cfml tokens`, `cfml tree` and
//! `cfml fmt` can be piped. Colour is dropped when stderr is not a terminal
//! or `NO_COLOR` is set.

use std::io::IsTerminal;

#[derive(Clone, Copy)]
enum Tone {
    Green,
    Yellow,
    Red,
    Blue,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Green => "32",
            Tone::Yellow => "33",
            Tone::Red => "31",
            Tone::Blue => "34",
        }
    }
}

fn colour_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

fn paint(tone: Tone, text: &str) -> String {
    if colour_enabled() {
        format!("\x1b[{}m{text}\x1b[0m", tone.code())
    } else {
        text.to_string()
    }
}

fn status(tone: Tone, prefix: &str, msg: &str) {
    eprintln!("{} {msg}", paint(tone, prefix));
}

/// Success line, whole message coloured.
/// 成功消息。
pub fn success(msg: &str) {
    eprintln!("{}", paint(Tone::Green, msg));
}

pub fn warning(msg: &str) {
    status(Tone::Yellow, "warning:", msg);
}

pub fn error(msg: &str) {
    status(Tone::Red, "error:", msg);
}

pub fn info(msg: &str) {
    status(Tone::Blue, "info:", msg);
}

/// Indented line under the previous message.
pub fn detail(msg: &str) {
    eprintln!("    {msg}");
}
