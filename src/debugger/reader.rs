use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Must be ASCII to ensure `.len() == .chars().count()`
const PROMPT: &str = "bdbg> ";

/// Yields commands from the `--command` argument first, then from a line-oriented stream.
pub struct CommandReader<R> {
    /// Commands split off but not yet returned
    pending: VecDeque<String>,
    stream: Option<R>,
}

impl CommandReader<io::StdinLock<'static>> {
    pub fn stdin(argument: Option<String>) -> Self {
        Self::new(argument, io::stdin().lock())
    }
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(argument: Option<String>, stream: R) -> Self {
        Self {
            pending: argument.as_deref().map(split_commands).unwrap_or_default(),
            stream: Some(stream),
        }
    }

    /// Next non-empty command, trimmed. `None` indicates end of input.
    pub fn read(&mut self) -> Option<String> {
        loop {
            if let Some(command) = self.pending.pop_front() {
                echo_command(&command);
                return Some(command);
            }
            let stream = self.stream.as_mut()?;
            let mut line = String::new();
            match stream.read_line(&mut line) {
                Ok(0) => {
                    self.stream = None;
                    dprintln!(Sometimes, "\x1b[1m{}\x1b[3m(end of input)\x1b[0m", PROMPT);
                    return None;
                }
                Err(error) => {
                    self.stream = None;
                    dprintln!(Always, "\x1b[31mfailed to read command: {}\x1b[0m", error);
                    return None;
                }
                Ok(_) => self.pending.extend(split_commands(&line)),
            }
        }
    }
}

/// Split on `;` and newlines, dropping empty commands.
fn split_commands(source: &str) -> VecDeque<String> {
    source
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|command| !command.is_empty())
        .map(str::to_string)
        .collect()
}

/// Print prompt and command.
fn echo_command(command: &str) {
    dprint!(Sometimes, "\x1b[1m{}", PROMPT);
    dprintln!(Sometimes, "{}\x1b[0m", command);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(argument: Option<&str>, stream: &str) -> Vec<String> {
        let mut reader = CommandReader::new(argument.map(str::to_string), stream.as_bytes());
        std::iter::from_fn(|| reader.read()).collect()
    }

    #[test]
    fn argument_before_stream() {
        assert_eq!(
            read_all(Some("step; registers\nlist"), "continue\nquit\n"),
            ["step", "registers", "list", "continue", "quit"]
        );
    }

    #[test]
    fn skips_empty_commands() {
        assert_eq!(read_all(Some(";;  ;"), "\n\n  s ; ;c  \n"), ["s", "c"]);
        assert!(read_all(None, "").is_empty());
    }

    #[test]
    fn stops_at_unreadable_input() {
        let stream: &[u8] = b"step\n\xff\xfe\nquit\n";
        let mut reader = CommandReader::new(None, stream);
        assert_eq!(reader.read().as_deref(), Some("step"));
        assert_eq!(reader.read(), None);
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn no_trailing_newline() {
        assert_eq!(read_all(None, "step 2"), ["step 2"]);
    }
}
