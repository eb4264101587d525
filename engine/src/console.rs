use std::io::{self, BufRead, Error, ErrorKind, Write};

/// Line-based conversation with whoever is playing.
pub trait Console {
    /// Shows `prompt` on the current line and blocks for one line of input,
    /// returned without its line terminator.
    fn prompt(&mut self, prompt: &str) -> io::Result<String>;
    fn say(&mut self, line: &str) -> io::Result<()>;
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for Terminal<R, W> {
    fn prompt(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::new(ErrorKind::UnexpectedEof, "input closed while waiting for a move"));
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }
}
