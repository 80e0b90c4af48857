//! Line-oriented operator console
//!
//! Progress output and interactive prompts go through `Console` so the
//! author resolver can be driven by a script in tests.

use std::io::{self, BufRead, Write};

pub trait Console: Send {
    /// Write text as-is
    fn print(&mut self, text: &str);

    /// Show `prompt` and read one line without its line ending.
    /// `None` means input is closed.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    fn println(&mut self, line: &str) {
        self.print(line);
        self.print("\n");
    }
}

/// Console on the process stdin/stdout
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn print(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.print(prompt);

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Console replaying canned answers and recording everything shown
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedConsole {
    answers: std::collections::VecDeque<String>,
    pub output: String,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
impl Console for ScriptedConsole {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.print(prompt);
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}
