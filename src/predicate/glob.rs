use globset::{Glob, GlobBuilder, GlobMatcher};

/// `fnmatch(3)`-equivalent flags carried by `-name`/`-path`/`-lname` nodes
/// (`spec.md` §3's "fnmatch flags" payload field).
#[derive(Copy, Clone, Debug, Default)]
pub struct FnmatchFlags {
    /// `FNM_CASEFOLD`: case-insensitive match.
    pub casefold: bool,
    /// `FNM_PATHNAME`: `*`/`?` never match a literal `/`.
    pub pathname: bool,
}

/// A compiled fnmatch-style glob test, backing `-name`, `-path`, and
/// `-lname`. Compiled once at parse time via `globset` rather than binding
/// libc's `fnmatch(3)`, since the dependency stack this crate draws from
/// already ships a native glob engine.
pub struct GlobTest {
    source: String,
    matcher: GlobMatcher,
    pub flags: FnmatchFlags,
}

impl GlobTest {
    pub fn new(pattern: &str, flags: FnmatchFlags) -> Result<Self, globset::Error> {
        let glob: Glob = GlobBuilder::new(pattern)
            .case_insensitive(flags.casefold)
            .literal_separator(flags.pathname)
            .build()?;
        Ok(GlobTest {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
            flags,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_star_glob() {
        let test = GlobTest::new("*.rs", FnmatchFlags::default()).unwrap();
        assert!(test.is_match("main.rs"));
        assert!(!test.is_match("main.rs.bak"));
    }

    #[test]
    fn casefold_matches_either_case() {
        let test = GlobTest::new(
            "*.RS",
            FnmatchFlags {
                casefold: true,
                pathname: false,
            },
        )
        .unwrap();
        assert!(test.is_match("main.rs"));
    }

    #[test]
    fn pathname_flag_blocks_slash_crossing() {
        let test = GlobTest::new(
            "*.rs",
            FnmatchFlags {
                casefold: false,
                pathname: true,
            },
        )
        .unwrap();
        assert!(!test.is_match("src/main.rs"));
        assert!(test.is_match("main.rs"));
    }
}
