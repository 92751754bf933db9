use std::{
    borrow::Cow,
    collections::VecDeque,
    io::{self, BufRead as _, Write as _},
};

/// Trait for handling output from the `print` instruction.
///
/// Implement this trait to capture or redirect program output.
/// The default implementation `StdPrint` writes to stdout.
pub trait PrintWriter {
    /// Called once for each value popped by `print`.
    ///
    /// Must write only the given value's text: `print` places no separator between
    /// values and terminates the group via [`stdout_push`](Self::stdout_push).
    fn stdout_write(&mut self, output: Cow<'_, str>) -> io::Result<()>;

    /// Add a single character to stdout, used for the newline after each `print`.
    fn stdout_push(&mut self, end: char) -> io::Result<()>;

    /// Flushes pending output, called before the VM blocks on `read`.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug)]
pub struct StdPrint {
    buffer: String,
}

impl StdPrint {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: String::new() }
    }
}

impl Default for StdPrint {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> io::Result<()> {
        self.buffer.push_str(&output);
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> io::Result<()> {
        self.buffer.push(end);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        stdout.write_all(self.buffer.as_bytes())?;
        stdout.flush()?;
        self.buffer.clear();
        Ok(())
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    /// Creates a new empty `CollectStringPrint`.
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> io::Result<()> {
        self.0.push_str(&output);
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> io::Result<()> {
        self.0.push(end);
        Ok(())
    }
}

/// `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during benchmarking.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) -> io::Result<()> {
        Ok(())
    }

    fn stdout_push(&mut self, _end: char) -> io::Result<()> {
        Ok(())
    }
}

/// Source of input lines for the `read` instruction.
pub trait InputReader {
    /// Returns the next line without its line terminator, or `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Default `InputReader` reading lines from stdin.
#[derive(Debug, Default)]
pub struct StdInput;

impl InputReader for StdInput {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_end(line)))
    }
}

/// `InputReader` serving a fixed list of lines, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct StringInput {
    lines: VecDeque<String>,
}

impl StringInput {
    /// Splits `input` into lines; a trailing newline does not add an empty line.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            lines: input.lines().map(str::to_owned).collect(),
        }
    }

    /// Number of lines not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputReader for StringInput {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

fn strip_line_end(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
