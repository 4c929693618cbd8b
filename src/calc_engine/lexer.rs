use std::fmt;

use log::debug;

use super::error::LexError;

pub const OPERATORS: [char; 6] = ['+', '-', '*', '/', '%', '^'];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
    End,
}

/// A token and the character position where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Op(op) => write!(f, "operator '{}'", op),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::End => f.write_str("end of input"),
        }
    }
}

/// Splits `input` into tokens, always terminated by [`TokenKind::End`].
///
/// Identifiers are lowercased so lookups in the environment are
/// case-insensitive.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().enumerate().peekable();
    let mut end = 0;

    while let Some(&(position, c)) = chars.peek() {
        end = position + 1;
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            ',' => {
                chars.next();
                TokenKind::Comma
            }
            c if OPERATORS.contains(&c) => {
                chars.next();
                TokenKind::Op(c)
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                let mut has_dot = false;

                while let Some(&(_, ch)) = chars.peek() {
                    match ch {
                        '.' if has_dot => {
                            literal.push(ch);
                            return Err(LexError::MalformedNumber { literal, position });
                        }
                        '.' => has_dot = true,
                        '0'..='9' => {}
                        _ => break,
                    }
                    literal.push(ch);
                    chars.next();
                }

                let value = literal
                    .parse::<f64>()
                    .map_err(|_| LexError::MalformedNumber { literal: literal.clone(), position })?;
                TokenKind::Number(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_alphabetic() || ch.is_ascii_digit() || ch == '_' {
                        ident.extend(ch.to_lowercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(ident)
            }
            _ => return Err(LexError::InvalidCharacter { character: c, position }),
        };
        tokens.push(Token { kind, position });
    }

    tokens.push(Token { kind: TokenKind::End, position: end });
    debug!("tokenized {:?} into {} tokens", input, tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn splits_operators_and_numbers() {
        assert_eq!(
            kinds("12 + 3.5*(4)"),
            vec![
                TokenKind::Number(12.0),
                TokenKind::Op('+'),
                TokenKind::Number(3.5),
                TokenKind::Op('*'),
                TokenKind::LParen,
                TokenKind::Number(4.0),
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn identifiers_are_lowercased() {
        assert_eq!(
            kinds("SQRT(Pi_2, x1)"),
            vec![
                TokenKind::Ident("sqrt".to_string()),
                TokenKind::LParen,
                TokenKind::Ident("pi_2".to_string()),
                TokenKind::Comma,
                TokenKind::Ident("x1".to_string()),
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn digit_then_letters_are_two_tokens() {
        assert_eq!(
            kinds("2pi"),
            vec![
                TokenKind::Number(2.0),
                TokenKind::Ident("pi".to_string()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn leading_and_trailing_dot() {
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5), TokenKind::End]);
        assert_eq!(kinds("5."), vec![TokenKind::Number(5.0), TokenKind::End]);
    }

    #[test]
    fn positions_count_characters() {
        assert_eq!(kinds("π"), vec![TokenKind::Ident("π".to_string()), TokenKind::End]);
        assert_eq!(
            tokenize("é + ;"),
            Err(LexError::InvalidCharacter { character: ';', position: 4 })
        );
    }

    #[test]
    fn identifiers_continue_with_ascii_digits_only() {
        assert_eq!(kinds("x_2"), vec![TokenKind::Ident("x_2".to_string()), TokenKind::End]);
        assert_eq!(
            tokenize("x²"),
            Err(LexError::InvalidCharacter { character: '²', position: 1 })
        );
        assert_eq!(
            tokenize("2 * a½"),
            Err(LexError::InvalidCharacter { character: '½', position: 5 })
        );
    }

    #[test]
    fn end_token_sits_after_input() {
        let tokens = tokenize("1 +  ").unwrap();
        assert_eq!(tokens.last().map(|t| t.position), Some(5));
        assert_eq!(tokenize("").unwrap(), vec![Token { kind: TokenKind::End, position: 0 }]);
    }

    #[test]
    fn second_decimal_point_is_rejected() {
        assert_eq!(
            tokenize("1 + 1.2.3"),
            Err(LexError::MalformedNumber { literal: "1.2.".to_string(), position: 4 })
        );
    }

    #[test]
    fn lone_dot_is_rejected() {
        assert!(matches!(tokenize("."), Err(LexError::MalformedNumber { .. })));
    }

    #[test]
    fn rejects_characters_outside_the_grammar() {
        for (input, character, position) in [
            ("1;2", ';', 1),
            ("x = 3", '=', 2),
            ("a:b", ':', 1),
            ("'1'", '\'', 0),
            ("[1]", '[', 0),
            ("__import__(\"os\")", '"', 11),
        ] {
            assert_eq!(
                tokenize(input),
                Err(LexError::InvalidCharacter { character, position }),
                "{}",
                input
            );
        }
    }
}
