//! Tokenizer for binding expressions

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Question,
    Colon,
    Bang,
    Minus,
    Plus,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Token plus its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

impl TokenKind {
    /// Source spelling, for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => crate::value::format_number(*n),
            TokenKind::Str(s) => format!("\"{}\"", s),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Dot => ".".into(),
            TokenKind::LBracket => "[".into(),
            TokenKind::RBracket => "]".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::Question => "?".into(),
            TokenKind::Colon => ":".into(),
            TokenKind::Bang => "!".into(),
            TokenKind::Minus => "-".into(),
            TokenKind::Plus => "+".into(),
            TokenKind::AndAnd => "&&".into(),
            TokenKind::OrOr => "||".into(),
            TokenKind::EqEq => "==".into(),
            TokenKind::NotEq => "!=".into(),
            TokenKind::EqEqEq => "===".into(),
            TokenKind::NotEqEq => "!==".into(),
            TokenKind::Lt => "<".into(),
            TokenKind::Le => "<=".into(),
            TokenKind::Gt => ">".into(),
            TokenKind::Ge => ">=".into(),
        }
    }
}

/// Operators, longest spelling first so `===` wins over `==`
const OPERATORS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::EqEqEq),
    ("!==", TokenKind::NotEqEq),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("!", TokenKind::Bang),
    ("-", TokenKind::Minus),
    ("+", TokenKind::Plus),
    (".", TokenKind::Dot),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Split an expression into tokens
pub fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        let rest = &src[pos..];
        let Some(c) = rest.chars().next() else { break };

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit())) {
            let len = number_len(rest);
            let text = &rest[..len];
            let value = crate::value::parse_number(text)
                .ok_or(ExprError::UnexpectedChar { pos, ch: c })?;
            tokens.push(Token { kind: TokenKind::Number(value), pos });
            pos += len;
            continue;
        }

        if c == '"' || c == '\'' {
            let (value, len) = lex_string(rest, pos)?;
            tokens.push(Token { kind: TokenKind::Str(value), pos });
            pos += len;
            continue;
        }

        if is_ident_start(c) {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !is_ident_char(*ch))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            tokens.push(Token { kind: TokenKind::Ident(rest[..len].to_string()), pos });
            pos += len;
            continue;
        }

        match OPERATORS.iter().find(|(spelling, _)| rest.starts_with(spelling)) {
            Some((spelling, kind)) => {
                tokens.push(Token { kind: kind.clone(), pos });
                pos += spelling.len();
            }
            None => return Err(ExprError::UnexpectedChar { pos, ch: c }),
        }
    }

    Ok(tokens)
}

/// Length of a numeric literal: digits, one fraction, optional exponent
fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Quoted string with backslash escapes; returns the value and bytes consumed
fn lex_string(s: &str, start: usize) -> Result<(String, usize), ExprError> {
    let mut chars = s.char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(ExprError::UnexpectedEnd);
    };
    let mut value = String::new();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((value, i + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            c => value.push(c),
        }
    }

    Err(ExprError::UnterminatedString { pos: start })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_comparison() {
        assert_eq!(
            kinds("item === theme"),
            vec![
                TokenKind::Ident("item".into()),
                TokenKind::EqEqEq,
                TokenKind::Ident("theme".into()),
            ]
        );
    }

    #[test]
    fn lex_literals() {
        assert_eq!(
            kinds("3.5 'a\\'b' \"x\""),
            vec![
                TokenKind::Number(3.5),
                TokenKind::Str("a'b".into()),
                TokenKind::Str("x".into()),
            ]
        );
    }

    #[test]
    fn lex_member_index_not_fraction() {
        assert_eq!(
            kinds("todos.0.title"),
            vec![
                TokenKind::Ident("todos".into()),
                TokenKind::Dot,
                TokenKind::Number(0.0),
                TokenKind::Dot,
                TokenKind::Ident("title".into()),
            ]
        );
    }

    #[test]
    fn lex_longest_operator_first() {
        assert_eq!(kinds("a!==b"), vec![
            TokenKind::Ident("a".into()),
            TokenKind::NotEqEq,
            TokenKind::Ident("b".into()),
        ]);
        assert_eq!(kinds("!a"), vec![TokenKind::Bang, TokenKind::Ident("a".into())]);
    }

    #[test]
    fn lex_positions() {
        let tokens = lex("a  <= 2").unwrap();
        assert_eq!(tokens[1].pos, 3);
        assert_eq!(tokens[2].pos, 6);
    }

    #[test]
    fn lex_errors() {
        assert_eq!(lex("a = b"), Err(ExprError::UnexpectedChar { pos: 2, ch: '=' }));
        assert_eq!(lex("'open"), Err(ExprError::UnterminatedString { pos: 0 }));
        assert!(lex("alert(1); x").is_err());
    }
}
