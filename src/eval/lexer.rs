use super::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Str(String),
    Num(f64),
    Ident(String),
    Punct(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Num(n) => write!(f, "{n}"),
            Self::Ident(i) => f.write_str(i),
            Self::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// A token along with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

const PUNCTUATION: &[char] = &['(', ')', '[', ']', '{', '}', '.', ',', ';', '+', '-', '!'];

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, EvalError> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
    };
    let mut tokens = Vec::new();

    while let Some(&(pos, c)) = lexer.chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                lexer.chars.next();
                continue;
            }
            '\'' | '"' => Token::Str(lexer.string(pos, c)?),
            '0'..='9' => Token::Num(lexer.number(pos)?),
            '.' if lexer.source[pos + 1..].starts_with(|n: char| n.is_ascii_digit()) => {
                Token::Num(lexer.number(pos)?)
            }
            c if is_ident_start(c) => Token::Ident(lexer.ident(pos)),
            c if PUNCTUATION.contains(&c) => {
                lexer.chars.next();
                Token::Punct(c)
            }
            ch => return Err(EvalError::UnexpectedChar { ch, pos }),
        };
        tokens.push(Spanned { token, pos });
    }

    Ok(tokens)
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

const fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Lexer<'_> {
    fn take_while(&mut self, start: usize, mut pred: impl FnMut(char) -> bool) -> usize {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        end
    }

    fn ident(&mut self, start: usize) -> String {
        let end = self.take_while(start, is_ident_continue);
        self.source[start..end].to_string()
    }

    #[allow(clippy::cast_precision_loss)]
    fn number(&mut self, start: usize) -> Result<f64, EvalError> {
        let rest = &self.source[start..];
        let end = if rest.starts_with("0x") || rest.starts_with("0X") {
            self.chars.next();
            self.chars.next();
            self.take_while(start + 2, |c| c.is_ascii_hexdigit())
        } else {
            let mut prev = ' ';
            self.take_while(start, |c| {
                let ok = c.is_ascii_digit()
                    || c == '.'
                    || matches!(c, 'e' | 'E')
                    || (matches!(c, '+' | '-') && matches!(prev, 'e' | 'E'));
                prev = c;
                ok
            })
        };

        let literal = &self.source[start..end];
        if self.chars.peek().is_some_and(|&(_, c)| is_ident_start(c)) {
            return Err(EvalError::InvalidNumber(literal.to_string()));
        }

        let parsed = match literal.get(..2) {
            Some("0x" | "0X") => u64::from_str_radix(&literal[2..], 16).ok().map(|n| n as f64),
            _ => literal.parse::<f64>().ok(),
        };
        parsed.ok_or_else(|| EvalError::InvalidNumber(literal.to_string()))
    }

    fn string(&mut self, start: usize, quote: char) -> Result<String, EvalError> {
        self.chars.next();
        let mut out = String::new();

        loop {
            let Some((pos, c)) = self.chars.next() else {
                return Err(EvalError::UnterminatedString(start));
            };
            match c {
                c if c == quote => return Ok(out),
                '\n' | '\r' => return Err(EvalError::UnterminatedString(start)),
                '\\' => self.escape(pos, &mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, pos: usize, out: &mut String) -> Result<(), EvalError> {
        let Some((_, c)) = self.chars.next() else {
            return Err(EvalError::InvalidEscape(pos));
        };
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation
            '\n' => {}
            '\r' => {
                self.chars.next_if(|&(_, c)| c == '\n');
            }
            'x' => {
                let code = self.hex_digits(pos, 2)?;
                out.push(char::from_u32(code).ok_or(EvalError::InvalidEscape(pos))?);
            }
            'u' => {
                let unit = self.unicode_escape(pos)?;
                out.push(self.combine_surrogates(pos, unit));
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn unicode_escape(&mut self, pos: usize) -> Result<u32, EvalError> {
        if self.chars.next_if(|&(_, c)| c == '{').is_none() {
            return self.hex_digits(pos, 4);
        }

        let mut code = 0u32;
        loop {
            match self.chars.next() {
                Some((_, '}')) => return Ok(code),
                Some((_, c)) => {
                    let digit = c.to_digit(16).ok_or(EvalError::InvalidEscape(pos))?;
                    code = code
                        .checked_mul(16)
                        .and_then(|v| v.checked_add(digit))
                        .filter(|v| *v <= 0x10_FFFF)
                        .ok_or(EvalError::InvalidEscape(pos))?;
                }
                None => return Err(EvalError::InvalidEscape(pos)),
            }
        }
    }

    /// Joins a `\uD83D\uDE00` style pair, lone surrogates become U+FFFD
    fn combine_surrogates(&mut self, pos: usize, unit: u32) -> char {
        if !(0xD800..=0xDBFF).contains(&unit) {
            return char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER);
        }

        let rest = &self.source[pos..];
        let low = rest
            .get(6..12)
            .filter(|s| s.starts_with("\\u"))
            .and_then(|s| u32::from_str_radix(&s[2..], 16).ok())
            .filter(|low| (0xDC00..=0xDFFF).contains(low));

        let Some(low) = low else {
            return char::REPLACEMENT_CHARACTER;
        };
        for _ in 0..6 {
            self.chars.next();
        }
        let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn hex_digits(&mut self, pos: usize, count: usize) -> Result<u32, EvalError> {
        let mut code = 0;
        for _ in 0..count {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or(EvalError::InvalidEscape(pos))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }
}
