use crate::air::{Air, AsmLine};
use crate::encoder::encode;
use crate::error::{AsmError, AsmErrorKind};
use crate::image::{Image, MAX_WORDS};
use crate::symbol::LabelTable;

/// Two-pass assembler over one source file.
///
/// All state for a run lives here, so independent runs never interfere.
pub struct AsmParser<'a> {
    src: &'a str,
    /// Used in diagnostics only
    path: &'a str,
    labels: LabelTable,
}

/// Assemble `src` in one go. `path` is only used to qualify error messages.
pub fn assemble(src: &str, path: &str) -> Result<Air, AsmError> {
    AsmParser::new(src, path).parse()
}

/// Remove a trailing `#` comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

/// Split off one leading `label:` prefix, if any.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let (label, rest) = line.split_once(':')?;
    Some((label.trim(), rest.trim()))
}

/// Remove every leading label from a comment-free line.
fn strip_labels(mut line: &str) -> &str {
    while let Some((_, rest)) = split_label(line) {
        line = rest;
    }
    line
}

/// Split an instruction into its mnemonic and comma-separated operands.
fn split_instr(line: &str) -> Result<(&str, Vec<&str>), AsmErrorKind> {
    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, rest.trim()),
        None => (line, ""),
    };
    if rest.is_empty() {
        return Ok((mnemonic, Vec::new()));
    }
    let args: Vec<&str> = rest.split(',').map(str::trim).collect();
    if args.iter().any(|arg| arg.contains(char::is_whitespace)) {
        return Err(AsmErrorKind::MissingComma);
    }
    Ok((mnemonic, args))
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str, path: &'a str) -> Self {
        AsmParser {
            src,
            path,
            labels: LabelTable::new(),
        }
    }

    fn error(&self, kind: AsmErrorKind, line: usize) -> AsmError {
        AsmError::new(kind, self.path, line)
    }

    /// Lines of source with their 1-based line numbers.
    fn numbered_lines(&self) -> impl Iterator<Item = (usize, &'a str)> {
        self.src.lines().enumerate().map(|(i, line)| (i + 1, line))
    }

    /// Run both passes and return the assembled program.
    pub fn parse(mut self) -> Result<Air, AsmError> {
        self.collect_labels()?;
        let (words, lines) = self.emit()?;
        Ok(Air::new(Image::from_words(words), lines, self.labels))
    }

    /// First pass: bind every label to the address of the next instruction.
    fn collect_labels(&mut self) -> Result<(), AsmError> {
        let mut address: u16 = 0;
        for (line_num, line) in self.numbered_lines() {
            let mut line = strip_comment(line);
            while let Some((label, rest)) = split_label(line) {
                self.labels
                    .define(label, line_num, address)
                    .map_err(|kind| self.error(kind, line_num))?;
                line = rest;
            }
            if !line.is_empty() {
                // Overflow is reported by the second pass
                address = address.saturating_add(1);
            }
        }
        Ok(())
    }

    /// Second pass: encode every instruction against the completed label table.
    fn emit(&self) -> Result<(Vec<u16>, Vec<AsmLine>), AsmError> {
        let mut words = Vec::new();
        let mut lines = Vec::new();
        for (line_num, line) in self.numbered_lines() {
            let line = strip_labels(strip_comment(line));
            if line.is_empty() {
                continue;
            }
            if words.len() >= MAX_WORDS {
                return Err(self.error(AsmErrorKind::ProgramTooLong, line_num));
            }
            let (mnemonic, args) = split_instr(line).map_err(|kind| self.error(kind, line_num))?;
            let word = encode(mnemonic, &args, &self.labels)
                .map_err(|kind| self.error(kind, line_num))?;
            lines.push(AsmLine {
                line: line_num,
                address: words.len() as u16,
            });
            words.push(word);
        }
        Ok((words, lines))
    }
}
