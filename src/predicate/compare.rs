/// Shared three-way numeric comparison used by every integer-valued
/// predicate (`-uid`, `-gid`, `-inum`, `-links`, `-depth`, `-size`,
/// `-mtime`/`-atime`/`-ctime`, `-used`). `spec.md` §4.2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareMode {
    Exact,
    Less,
    Greater,
}

impl CompareMode {
    /// Parse find's `+N` / `-N` / `N` operand syntax into a mode and the
    /// bare numeric operand.
    pub fn parse(arg: &str) -> (CompareMode, &str) {
        match arg.as_bytes().first() {
            Some(b'+') => (CompareMode::Greater, &arg[1..]),
            Some(b'-') => (CompareMode::Less, &arg[1..]),
            _ => (CompareMode::Exact, arg),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct NumericTest {
    pub mode: CompareMode,
    pub operand: i64,
}

impl NumericTest {
    pub fn new(mode: CompareMode, operand: i64) -> Self {
        NumericTest { mode, operand }
    }

    pub fn parse(arg: &str) -> Result<Self, std::num::ParseIntError> {
        let (mode, digits) = CompareMode::parse(arg);
        let operand: i64 = digits.parse()?;
        Ok(NumericTest::new(mode, operand))
    }

    pub fn matches(&self, value: i64) -> bool {
        match self.mode {
            CompareMode::Exact => value == self.operand,
            CompareMode::Less => value < self.operand,
            CompareMode::Greater => value > self.operand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plus_minus_and_bare() {
        assert_eq!(NumericTest::parse("+5").unwrap().mode, CompareMode::Greater);
        assert_eq!(NumericTest::parse("-5").unwrap().mode, CompareMode::Less);
        assert_eq!(NumericTest::parse("5").unwrap().mode, CompareMode::Exact);
    }

    #[test]
    fn exact_match() {
        assert!(NumericTest::new(CompareMode::Exact, 5).matches(5));
        assert!(!NumericTest::new(CompareMode::Exact, 5).matches(6));
    }

    #[test]
    fn less_and_greater() {
        assert!(NumericTest::new(CompareMode::Less, 5).matches(4));
        assert!(!NumericTest::new(CompareMode::Less, 5).matches(5));
        assert!(NumericTest::new(CompareMode::Greater, 5).matches(6));
        assert!(!NumericTest::new(CompareMode::Greater, 5).matches(5));
    }
}
