//! Token scanner shared by the DEF and technology-LEF readers.
//!
//! LEF and DEF share the same lexical conventions: whitespace-separated
//! tokens, `#` comments to end of line, double-quoted strings (which may
//! contain statement terminators), and `(`/`)`/`;` acting as punctuation.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// 1-based source line, for error reporting.
    pub line: usize,
}

pub struct TokenStream {
    toks: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(src: &str) -> Self {
        Self {
            toks: tokenize(src),
            pos: 0,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.toks.get(self.pos)
    }

    pub fn bump(&mut self) -> Option<Token> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

pub fn tokenize(src: &str) -> Vec<Token> {
    let mut toks = Vec::new();
    let mut cur = String::new();
    let mut cur_line = 1;
    let mut line = 1;
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                flush(&mut toks, &mut cur, cur_line);
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' => {
                flush(&mut toks, &mut cur, cur_line);
                let start = line;
                let mut text = String::new();
                for next in chars.by_ref() {
                    if next == '"' {
                        break;
                    }
                    if next == '\n' {
                        line += 1;
                    }
                    text.push(next);
                }
                toks.push(Token { text, line: start });
            }
            '(' | ')' | ';' => {
                flush(&mut toks, &mut cur, cur_line);
                toks.push(Token {
                    text: c.to_string(),
                    line,
                });
            }
            c if c.is_whitespace() => {
                flush(&mut toks, &mut cur, cur_line);
                if c == '\n' {
                    line += 1;
                }
            }
            _ => {
                if cur.is_empty() {
                    cur_line = line;
                }
                cur.push(c);
            }
        }
    }
    flush(&mut toks, &mut cur, cur_line);
    toks
}

fn flush(toks: &mut Vec<Token>, cur: &mut String, line: usize) {
    if !cur.is_empty() {
        toks.push(Token {
            text: std::mem::take(cur),
            line,
        });
    }
}
