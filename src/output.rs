//! Coloured path output shared by the `fprint`/`fprintx`/`fls` actions.
//!
//! Uses `lscolors` for terminal colourization, generalized from a single
//! implicit stdout stream into the `-fprint`/
//! `-fls` family's "any node can target any open stream" requirement
//! (`spec.md` §3's `output-stream handle` payload field).

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use lscolors::{LsColors, Style};

/// A shared, possibly-colourized output sink. `Rc<RefCell<..>>` rather than
/// a reference, because several leaves in the tree (e.g. `-fprint` and
/// `-fprintf` pointed at the same file) may legitimately share one open
/// stream, and the tree only borrows the command-line model, never owns a
/// stream exclusively.
pub type Sink = Rc<RefCell<dyn Write>>;

pub fn stdout_sink() -> Sink {
    Rc::new(RefCell::new(io::stdout()))
}

pub struct ColorTable {
    lscolors: Option<LsColors>,
}

impl ColorTable {
    pub fn new(enabled: bool) -> Self {
        ColorTable {
            lscolors: enabled.then(LsColors::from_env).flatten().or_else(|| {
                enabled.then(LsColors::default)
            }),
        }
    }

    fn style_for(&self, path: &Path) -> Option<Style> {
        let lscolors = self.lscolors.as_ref()?;
        lscolors.style_for_path(path).cloned()
    }

    fn ansi_prefix_suffix(&self, path: &Path, _is_dir: bool) -> (String, String) {
        match self.style_for(path) {
            Some(style) => {
                let ansi = style.to_nu_ansi_term_style();
                (ansi.prefix().to_string(), ansi.suffix().to_string())
            }
            None => (String::new(), String::new()),
        }
    }
}

/// Write `path` to `sink`, terminated by `terminator`, colourized through
/// `colors` when it is enabled. Used for plain `-print`/`-fprint`
/// (terminator `'\n'`) and `-print0`/`-fprint0` (terminator `'\0'`).
pub fn write_path(
    sink: &Sink,
    colors: &ColorTable,
    path: &Path,
    is_dir: bool,
    terminator: u8,
) -> io::Result<()> {
    let (prefix, suffix) = colors.ansi_prefix_suffix(path, is_dir);
    let mut sink = sink.borrow_mut();
    write!(sink, "{prefix}{}{suffix}", path.display())?;
    sink.write_all(&[terminator])
}

/// Characters `-fprintx`/`--xargs-safe` consider unsafe to pass to a shell
/// verbatim: `spec.md` §4.3's set `{' ','\t','\n','\\','$','\'','"','`'}`.
pub const XARGS_UNSAFE_CHARS: &[char] = &[' ', '\t', '\n', '\\', '$', '\'', '"', '`'];

/// Write `path` in xargs-safe form: every byte in `XARGS_UNSAFE_CHARS` is
/// backslash-escaped, terminated by a newline.
pub fn write_path_escaped(sink: &Sink, path: &Path) -> io::Result<()> {
    let text = path.to_string_lossy();
    let mut sink = sink.borrow_mut();
    for ch in text.chars() {
        if XARGS_UNSAFE_CHARS.contains(&ch) {
            sink.write_all(b"\\")?;
        }
        write!(sink, "{ch}")?;
    }
    sink.write_all(b"\n")
}

/// `true` if `path` contains a character `spec.md` §4.4 point 3 flags as
/// unsafe to hand to `xargs` without escaping.
pub fn contains_xargs_unsafe_char(path: &Path) -> bool {
    path.to_string_lossy()
        .chars()
        .any(|c| XARGS_UNSAFE_CHARS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_unsafe_whitespace() {
        assert!(contains_xargs_unsafe_char(&PathBuf::from("has space")));
        assert!(!contains_xargs_unsafe_char(&PathBuf::from("no-space")));
    }

    #[test]
    fn escaping_quotes_special_chars() {
        let sink: Sink = Rc::new(RefCell::new(Vec::<u8>::new()));
        write_path_escaped(&sink, Path::new("a b")).unwrap();
        let written = sink.borrow();
        let written = std::str::from_utf8(&written).unwrap();
        assert_eq!(written, "a\\ b\n");
    }
}
