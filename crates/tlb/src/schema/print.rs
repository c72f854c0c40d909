use core::fmt::{self, Display, Write};

use log::debug;

use crate::Cell;

/// Output sink for [`TlbType::print_skip`](super::TlbType::print_skip).
///
/// Values are written as nested s-expressions: `(constructor field:value ...)`.
/// Every method returns [`None`] once printing failed, so printers chain
/// them with `?`.
#[derive(Debug, Clone)]
pub struct PrettyPrinter {
    out: String,
    indent: usize,
    level: usize,
    failed: bool,
    limit: usize,
}

impl Default for PrettyPrinter {
    #[inline]
    fn default() -> Self {
        Self::new(0)
    }
}

impl PrettyPrinter {
    /// Default limit of nested cells to descend into
    pub const DEFAULT_LIMIT: usize = 4096;

    #[inline]
    pub const fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
            level: 0,
            failed: false,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether nothing failed and every opened expression was closed
    #[inline]
    pub const fn ok(&self) -> bool {
        !self.failed && self.level == 0
    }

    #[inline]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.out
    }

    pub fn out(&mut self, value: impl Display) -> Option<()> {
        if self.failed {
            return None;
        }
        if write!(self.out, "{value}").is_err() {
            return self.fail("formatting error");
        }
        Some(())
    }

    /// Starts a nested expression
    pub fn open(&mut self, name: &str) -> Option<()> {
        self.out("(")?;
        self.out(name)?;
        self.level += 1;
        Some(())
    }

    /// Ends the innermost expression
    pub fn close(&mut self) -> Option<()> {
        self.close_with("")
    }

    pub fn close_with(&mut self, suffix: &str) -> Option<()> {
        if self.level == 0 {
            return self.fail("unbalanced close");
        }
        self.level -= 1;
        self.out(suffix)?;
        self.out(")")
    }

    /// Starts a named field on a new line
    pub fn field(&mut self, name: &str) -> Option<()> {
        self.nl()?;
        self.out(name)?;
        self.out(":")
    }

    /// Starts an anonymous field on a new line
    #[inline]
    pub fn next_field(&mut self) -> Option<()> {
        self.nl()
    }

    pub fn nl(&mut self) -> Option<()> {
        self.out("\n")?;
        let width = self.indent + 2 * self.level;
        self.out(format_args!("{:width$}", ""))
    }

    /// Records a fatal error in the output
    pub fn fail(&mut self, msg: &str) -> Option<()> {
        debug!(target: "tlb", "pretty printing failed: {msg}");
        self.out.push_str("<FATAL: ");
        self.out.push_str(msg);
        self.out.push('>');
        self.failed = true;
        None
    }

    /// Accounts for descending into one more cell
    pub fn enter(&mut self) -> Option<()> {
        match self.limit.checked_sub(1) {
            Some(limit) => {
                self.limit = limit;
                Some(())
            }
            None => self.fail("recursion limit exceeded"),
        }
    }

    /// Prints an exotic cell where an ordinary one was expected
    pub fn special(&mut self, cell: &Cell) -> Option<()> {
        self.open("!special ")?;
        self.out(format_args!("{:?}", cell.parser()))?;
        self.close()
    }
}

impl Display for PrettyPrinter {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested() {
        let mut pp = PrettyPrinter::default();
        pp.open("pair").unwrap();
        pp.field("a").unwrap();
        pp.out(1).unwrap();
        pp.field("b").unwrap();
        pp.out(2).unwrap();
        pp.close().unwrap();
        assert!(pp.ok());
        assert_eq!(pp.as_str(), "(pair\n  a:1\n  b:2)");
    }

    #[test]
    fn unbalanced_close_fails() {
        let mut pp = PrettyPrinter::default();
        assert_eq!(pp.close(), None);
        assert!(pp.failed());
        assert!(pp.as_str().contains("<FATAL: unbalanced close>"));
        assert_eq!(pp.out("more"), None);
    }

    #[test]
    fn recursion_limit() {
        let mut pp = PrettyPrinter::default().with_limit(1);
        assert_eq!(pp.enter(), Some(()));
        assert_eq!(pp.enter(), None);
        assert!(!pp.ok());
    }
}
