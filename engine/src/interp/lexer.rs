//! Tokenizer for single-line submissions.

use chumsky::prelude::*;

use crate::interp::ast::BinOp;

pub type Span = SimpleSpan;
pub type Spanned<T> = (T, Span);

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    /// Keyword of the full language that this subset does not support.
    Reserved(String),
    True,
    False,
    None,
    And,
    Or,
    Not,
    In,
    Is,
    Lambda,
    If,
    Else,
    For,
    Pass,
    Del,
    Assert,
    Raise,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Assign,
    AugAssign(BinOp),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
}

const RESERVED: &[&str] = &[
    "def", "class", "while", "return", "import", "from", "global", "nonlocal", "with", "try",
    "except", "finally", "yield", "async", "await", "break", "continue", "elif", "as",
];

pub fn lexer<'src>()
-> impl Parser<'src, &'src str, Vec<Spanned<Token>>, extra::Err<Rich<'src, char, Span>>> {
    let digits = text::digits(10).separated_by(just('_')).at_least(1);

    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(digits.clone());

    // `1_000`, `2.`, `1.5`, `1e3`, `.5`
    let number = choice((
        digits
            .clone()
            .then(just('.').then(digits.clone().or_not()).or_not())
            .then(exponent.clone().or_not())
            .ignored(),
        just('.')
            .then(digits)
            .then(exponent.or_not())
            .ignored(),
    ))
    .to_slice()
    .try_map(|literal: &str, span| {
        number_token(literal).map_err(|message| Rich::custom(span, message))
    });

    let string = choice((quoted('\''), quoted('"'))).map(|raw| Token::Str(unescape(raw)));

    let word = any()
        .filter(|character: &char| character.is_alphabetic() || *character == '_')
        .then(
            any()
                .filter(|character: &char| character.is_alphanumeric() || *character == '_')
                .repeated(),
        )
        .to_slice()
        .map(keyword_or_name);

    let augmented = choice((
        just("**=").to(BinOp::Pow),
        just("//=").to(BinOp::FloorDiv),
        just("+=").to(BinOp::Add),
        just("-=").to(BinOp::Sub),
        just("*=").to(BinOp::Mul),
        just("/=").to(BinOp::Div),
        just("%=").to(BinOp::Mod),
    ))
    .map(Token::AugAssign);

    let operator = choice((
        just("**").to(Token::DoubleStar),
        just("//").to(Token::DoubleSlash),
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("<=").to(Token::LessEq),
        just(">=").to(Token::GreaterEq),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('<').to(Token::Less),
        just('>').to(Token::Greater),
        just('=').to(Token::Assign),
    ));

    let punctuation = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just(',').to(Token::Comma),
        just(':').to(Token::Colon),
        just('.').to(Token::Dot),
    ));

    let token = choice((number, string, word, augmented, operator, punctuation));

    let comment = just('#').then(any().repeated()).ignored();
    let padding = text::whitespace().at_least(1).or(comment).repeated();

    padding
        .clone()
        .ignore_then(
            token
                .map_with(|token, extra| (token, extra.span()))
                .then_ignore(padding)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
}

/// Raw text between matching quotes, escapes still in place.
fn quoted<'src>(
    quote: char,
) -> impl Parser<'src, &'src str, &'src str, extra::Err<Rich<'src, char, Span>>> + Clone {
    let escaped = just('\\').then(any()).ignored();
    let plain = any()
        .filter(move |character: &char| !matches!(*character, '\\' | '\n') && *character != quote)
        .ignored();
    just(quote)
        .ignore_then(escaped.or(plain).repeated().to_slice())
        .then_ignore(just(quote))
}

fn number_token(literal: &str) -> Result<Token, &'static str> {
    let cleaned = literal.replace('_', "");
    if cleaned.contains(['.', 'e', 'E']) {
        cleaned
            .parse()
            .map(Token::Float)
            .map_err(|_| "invalid decimal literal")
    } else {
        cleaned
            .parse()
            .map(Token::Int)
            .map_err(|_| "integer literal too large")
    }
}

fn unescape(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(character) = chars.next() {
        if character != '\\' {
            text.push(character);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some('0') => text.push('\0'),
            Some(other @ ('\\' | '\'' | '"')) => text.push(other),
            // Unknown escapes keep their backslash.
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }
    text
}

fn keyword_or_name(word: &str) -> Token {
    match word {
        "True" => Token::True,
        "False" => Token::False,
        "None" => Token::None,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "is" => Token::Is,
        "lambda" => Token::Lambda,
        "if" => Token::If,
        "else" => Token::Else,
        "for" => Token::For,
        "pass" => Token::Pass,
        "del" => Token::Del,
        "assert" => Token::Assert,
        "raise" => Token::Raise,
        other if RESERVED.contains(&other) => Token::Reserved(word.to_string()),
        _ => Token::Name(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::Parser;

    fn tokens(src: &str) -> Vec<Token> {
        lexer()
            .parse(src)
            .into_result()
            .expect("tokens")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn tokenizes_arithmetic_with_compound_operators() {
        assert_eq!(
            tokens("2 ** 3 // 4"),
            vec![
                Token::Int(2),
                Token::DoubleStar,
                Token::Int(3),
                Token::DoubleSlash,
                Token::Int(4),
            ]
        );
    }

    #[test]
    fn tokenizes_floats_in_every_spelling() {
        assert_eq!(
            tokens(".5 2. 1e3 1_000"),
            vec![
                Token::Float(0.5),
                Token::Float(2.0),
                Token::Float(1000.0),
                Token::Int(1000),
            ]
        );
    }

    #[test]
    fn exponent_needs_digits() {
        assert_eq!(
            tokens("1e"),
            vec![Token::Int(1), Token::Name("e".to_string())]
        );
    }

    #[test]
    fn strings_support_both_quotes_and_escapes() {
        let found = tokens(r#"'""' "it\'s\n""#);
        assert_eq!(found[0], Token::Str("\"\"".to_string()));
        assert_eq!(found[1], Token::Str("it's\n".to_string()));
    }

    #[test]
    fn unterminated_string_is_rejected() {
        assert!(lexer().parse("'abc").has_errors());
    }

    #[test]
    fn augmented_assignment_and_comments() {
        assert_eq!(
            tokens("x **= 2  # square"),
            vec![
                Token::Name("x".to_string()),
                Token::AugAssign(BinOp::Pow),
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn spans_cover_the_source_text() {
        let spanned = lexer().parse("ab + 10").into_result().expect("tokens");
        let spans: Vec<(usize, usize)> = spanned
            .iter()
            .map(|(_, span)| (span.start, span.end))
            .collect();
        assert_eq!(spans, vec![(0, 2), (3, 4), (5, 7)]);
    }

    #[test]
    fn semicolon_is_rejected() {
        assert!(lexer().parse("a = 1; b = 2").has_errors());
    }

    #[test]
    fn oversized_integer_literal_is_rejected() {
        assert!(lexer().parse("99999999999999999999").has_errors());
    }

    #[test]
    fn unsupported_keywords_are_reserved() {
        assert_eq!(tokens("def"), vec![Token::Reserved("def".to_string())]);
    }
}
