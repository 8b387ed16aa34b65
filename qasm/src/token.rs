use crate::error::{Cause, Error};
use qcpu::isa::{find_opcode, OpSpec};
use qcpu::RegisterId;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Op(&'static OpSpec),
    Register(RegisterId),
    /// `+`, `-`, or a bare name reference, encoded in Immediate mode.
    ImmediateLabelReference(String),
    Immediate(u16),
    Absolute(u16),
    Indirect(RegisterId),
    /// `$name` (name is not numeric), encoded in Absolute mode.
    AbsoluteLabelReference(String),
    /// `name:` or the anonymous anchors `+:`/`-:`.
    Label(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Word offset this token occupies. Meaningless (but present) for
    /// `Label` tokens, which annotate the address of the token that follows
    /// rather than consuming one themselves.
    pub address: u16,
    pub line: u32,
}

struct Tokenizer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    address: u16,
    tokens: Vec<Token>,
    _source: &'a str,
}

/// Splits `source` into tokens, consuming directives as it goes. Unrecognised
/// lexemes are logged and dropped (tokenization continues); a malformed
/// directive argument aborts with a fatal [`Error`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let stripped: String = source.chars().filter(|&c| c != '\r').collect();
    let mut tokenizer = Tokenizer {
        chars: stripped.chars().collect(),
        pos: 0,
        line: 1,
        address: 0,
        tokens: Vec::new(),
        _source: source,
    };
    tokenizer.run()?;
    Ok(tokenizer.tokens)
}

impl<'a> Tokenizer<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
        c
    }

    fn run(&mut self) -> Result<(), Error> {
        while let Some(c) = self.peek() {
            if c == ';' || c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            let line = self.line;
            let lexeme = self.read_lexeme();
            self.classify(lexeme, line)?;
        }
        Ok(())
    }

    /// Reads one whitespace-delimited lexeme. A `(` opens a single-level
    /// parenthesised span that is read verbatim (including embedded
    /// whitespace and newlines) through to the next `)`.
    fn read_lexeme(&mut self) -> String {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c == '(' {
                lexeme.push(c);
                self.advance();
                while let Some(c) = self.peek() {
                    lexeme.push(c);
                    let closed = c == ')';
                    self.advance();
                    if closed {
                        break;
                    }
                }
                continue;
            }
            if c.is_whitespace() || c == ';' || c == '#' {
                break;
            }
            lexeme.push(c);
            self.advance();
        }
        lexeme
    }

    fn emit(&mut self, kind: TokenKind, line: u32) {
        let token = Token {
            kind,
            address: self.address,
            line,
        };
        self.tokens.push(token);
        self.address = self.address.wrapping_add(1);
    }

    fn classify(&mut self, lexeme: String, line: u32) -> Result<(), Error> {
        if let Some(name) = lexeme.strip_suffix(':') {
            let token = Token {
                kind: TokenKind::Label(name.to_string()),
                address: self.address,
                line,
            };
            self.tokens.push(token);
            return Ok(());
        }

        if let Some(spec) = find_opcode(&lexeme) {
            self.emit(TokenKind::Op(spec), line);
            return Ok(());
        }

        if lexeme.len() == 1 {
            if let Ok(id) = lexeme.parse::<RegisterId>() {
                self.emit(TokenKind::Register(id), line);
                return Ok(());
            }
        }

        if lexeme == "+" || lexeme == "-" {
            self.emit(TokenKind::ImmediateLabelReference(lexeme), line);
            return Ok(());
        }

        if is_label_name(&lexeme) {
            self.emit(TokenKind::ImmediateLabelReference(lexeme), line);
            return Ok(());
        }

        if let Some(value) = parse_number(&lexeme) {
            self.emit(TokenKind::Immediate(value), line);
            return Ok(());
        }

        if let Some(rest) = lexeme.strip_prefix('.') {
            if is_directive_shape(rest) {
                return self.directive(rest, line);
            }
            // A dot-led lexeme that doesn't match the `name(...)` shape is
            // not a directive at all; fall through to the unrecognised-token
            // branch below instead of treating it as fatal.
        }

        if let Some(rest) = lexeme.strip_prefix('$') {
            if let Some(value) = parse_number(rest) {
                self.emit(TokenKind::Absolute(value), line);
                return Ok(());
            }
            self.emit(TokenKind::AbsoluteLabelReference(rest.to_string()), line);
            return Ok(());
        }

        if lexeme.starts_with('[') && lexeme.ends_with(']') && lexeme.len() == 3 {
            let letter = &lexeme[1..2];
            if let Ok(id) = letter.parse::<RegisterId>() {
                self.emit(TokenKind::Indirect(id), line);
                return Ok(());
            }
        }

        log::warn!("unrecognised token \"{}\" at line {}, skipped", lexeme, line);
        Ok(())
    }

    /// Handles a dot-led lexeme already confirmed (by [`is_directive_shape`])
    /// to have the `name(...)` shape. A recognised shape with an unknown
    /// name, or known name with invalid content, is a fatal error; the
    /// shape check itself already ruled out the non-fatal "not a directive
    /// at all" case.
    fn directive(&mut self, rest: &str, line: u32) -> Result<(), Error> {
        let open = rest.find('(').expect("shape already validated by caller");
        let name = rest[..open].to_lowercase();
        let arg = &rest[open + 1..rest.len() - 1];

        match name.as_str() {
            "org" => {
                let n = parse_number(arg).ok_or_else(|| {
                    Error::new(line, format!(".org({})", arg), Cause::MalformedDirective)
                })?;
                self.address = n;
                Ok(())
            }
            "ds" => {
                let n = parse_number(arg).ok_or_else(|| {
                    Error::new(line, format!(".ds({})", arg), Cause::MalformedDirective)
                })?;
                self.address = self.address.wrapping_add(n);
                Ok(())
            }
            "text" => {
                let literal = unquote(arg).ok_or_else(|| {
                    Error::new(line, format!(".text({})", arg), Cause::MalformedDirective)
                })?;
                // Matches the original assembler's documented quirk: a real
                // newline inside the literal is replaced with the two
                // characters `\` and `n` rather than preserved as-is.
                let escaped = literal.replace('\n', "\\n");
                for ch in escaped.chars() {
                    self.emit(TokenKind::Immediate(ch as u16), line);
                }
                Ok(())
            }
            _ => Err(Error::new(
                line,
                format!(".{}", rest),
                Cause::MalformedDirective,
            )),
        }
    }
}

/// Whether the text following a leading `.` has the directive shape
/// `\w+(...)`: a non-empty word-character name, then a parenthesised span
/// running to the end of the lexeme. Anything else (a bare `.foo` with no
/// parens, an empty name, unbalanced parens) is not a directive at all.
fn is_directive_shape(rest: &str) -> bool {
    match rest.find('(') {
        Some(open) if open > 0 && rest.ends_with(')') => {
            rest[..open].chars().all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Matches `^[a-z]\w+$` case-insensitive on the leading letter: an ASCII
/// letter of either case, followed by at least one more word character. A
/// bare single letter (even a lowercase one that isn't a register) does not
/// qualify.
fn is_label_name(lexeme: &str) -> bool {
    let mut chars = lexeme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    let rest: Vec<char> = chars.collect();
    !rest.is_empty() && rest.iter().all(|&c| c.is_alphanumeric() || c == '_')
}

fn unquote(arg: &str) -> Option<String> {
    let bytes = arg.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        Some(arg[1..arg.len() - 1].to_string())
    } else {
        None
    }
}

fn parse_number(s: &str) -> Option<u16> {
    let lower = s.to_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u16::from_str_radix(bin, 2).ok()
    } else if !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit()) {
        lower.parse::<u16>().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::matches;

    #[test]
    fn tokenizes_nop() {
        let tokens = tokenize("nop").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Op(spec) if spec.mnemonic == "nop"));
    }

    #[test]
    fn op_mnemonics_are_case_sensitive() {
        let tokens = tokenize("NOP").unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn tokenizes_register_and_immediate() {
        let tokens = tokenize("mov a 5").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[1].kind, TokenKind::Register(RegisterId::a)));
        assert!(matches!(tokens[2].kind, TokenKind::Immediate(5)));
    }

    #[test]
    fn tokenizes_label_and_reference() {
        let tokens = tokenize("jsr $sub\next a\nsub: mov a 42").unwrap();
        assert!(matches!(&tokens[1].kind, TokenKind::AbsoluteLabelReference(name) if name == "sub"));
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.kind, TokenKind::Label(name) if name == "sub")));
    }

    #[test]
    fn text_directive_escapes_embedded_newline() {
        let tokens = tokenize(".text('a\nb')").unwrap();
        let chars: Vec<u16> = tokens
            .iter()
            .map(|t| match t.kind {
                TokenKind::Immediate(v) => v,
                _ => panic!("expected immediate"),
            })
            .collect();
        assert_eq!(chars, vec!['a' as u16, '\\' as u16, 'n' as u16, 'b' as u16]);
    }

    #[test]
    fn ds_reserves_words_without_emitting_tokens() {
        let tokens = tokenize(".ds(3)\nnop").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].address, 3);
    }

    #[test]
    fn org_sets_emission_address() {
        let tokens = tokenize(".org(0x10)\nnop").unwrap();
        assert_eq!(tokens[0].address, 0x10);
    }

    #[test]
    fn malformed_org_is_fatal() {
        let err = tokenize(".org(abc)").unwrap_err();
        assert_eq!(err.cause, Cause::MalformedDirective);
    }

    #[test]
    fn dot_lexeme_without_parens_is_unrecognised_not_fatal() {
        let tokens = tokenize(".foo\nnop").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Op(spec) if spec.mnemonic == "nop"));
    }

    #[test]
    fn unknown_directive_name_with_valid_shape_is_fatal() {
        let err = tokenize(".frob(1)").unwrap_err();
        assert_eq!(err.cause, Cause::MalformedDirective);
    }

    #[test]
    fn uppercase_led_label_reference_is_tokenized() {
        let tokens = tokenize("jmp Sub").unwrap();
        assert!(matches!(&tokens[1].kind, TokenKind::ImmediateLabelReference(name) if name == "Sub"));
    }

    #[test]
    fn bare_single_letter_non_register_is_unrecognised() {
        let tokens = tokenize("jmp e").unwrap();
        assert_eq!(tokens.len(), 1);
    }
}
