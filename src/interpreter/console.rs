//! Captured standard streams of the hosted program

/// Output buffers for `print`. Nothing reaches the real stdout, which is
/// reserved for the JSON report.
#[derive(Debug, Default, Clone)]
pub struct Console {
    stdout: String,
    stderr: String,
}

impl Console {
    pub fn new() -> Self {
        Console::default()
    }

    pub fn write(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    pub fn write_err(&mut self, text: &str) {
        self.stderr.push_str(text);
    }

    /// Everything printed so far
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn into_parts(self) -> (String, String) {
        (self.stdout, self.stderr)
    }
}

/// Split captured output into display lines, dropping the empty line after a
/// trailing newline
pub fn output_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(|s| s.to_string()).collect();
    if lines.last().is_some_and(|s| s.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_accumulate() {
        let mut console = Console::new();
        console.write("hello");
        console.write(" world\n");
        assert_eq!(console.stdout(), "hello world\n");
        assert_eq!(console.stderr(), "");
    }

    #[test]
    fn test_output_lines() {
        assert_eq!(output_lines("a\nb\n"), ["a", "b"]);
        assert_eq!(output_lines("a\nb"), ["a", "b"]);
        assert!(output_lines("").is_empty());
    }
}
