//! Command line splitting
//!
//! No quoting, pipes or redirections: a line is a program name followed by
//! whitespace-separated arguments.

/// A submitted command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// The line as typed, echoed into history
    pub raw: String,
    /// Program name (case preserved; lookup lowercases it)
    pub program: String,
    /// Arguments, not including the program name
    pub args: Vec<String>,
}

impl CommandLine {
    /// Split a line. Returns `None` for empty or whitespace-only input.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let program = words.next()?.to_string();
        Some(Self {
            raw: line.to_string(),
            program,
            args: words.map(str::to_string).collect(),
        })
    }

    /// History echo for this line
    pub fn echo(&self) -> String {
        format!("$ {}", self.raw)
    }
}
