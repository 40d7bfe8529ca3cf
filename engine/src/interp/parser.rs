//! Token parser producing [`Expr`] and [`Stmt`] trees.
//!
//! Precedence, lowest first: `lambda`, conditional, `or`, `and`, `not`,
//! comparisons, `+ -`, `* / // %`, unary sign, `**`, then calls, subscripts
//! and attribute access.

use std::rc::Rc;

use chumsky::error::RichReason;
use chumsky::input::ValueInput;
use chumsky::pratt::{infix, left, prefix, right};
use chumsky::prelude::*;

use crate::interp::ast::{BinOp, BoolOp, CmpOp, Expr, Index, Stmt, Target, UnaryOp};
use crate::interp::error::{EvalError, EvalResult};
use crate::interp::lexer::{Span, Spanned, Token, lexer};
use crate::interp::value::Value;

/// Maximum bracket/operator nesting accepted by the parser.
const MAX_NESTING: usize = 100;
/// Submissions are single lines; anything longer is rejected outright.
const MAX_TOKENS: usize = 4096;

type ParserError<'src> = extra::Err<Rich<'src, Token, Span>>;

pub fn parse_expression(src: &str) -> EvalResult<Expr> {
    let tokens = tokenize(src)?;
    let eoi = Span::from(src.len()..src.len());
    testlist(expression())
        .then_ignore(end())
        .parse(tokens.as_slice().map(eoi, |(token, span)| (token, span)))
        .into_result()
        .map_err(syntax_error)
}

pub fn parse_statement(src: &str) -> EvalResult<Stmt> {
    let tokens = tokenize(src)?;
    let eoi = Span::from(src.len()..src.len());
    statement()
        .then_ignore(end())
        .parse(tokens.as_slice().map(eoi, |(token, span)| (token, span)))
        .into_result()
        .map_err(syntax_error)
}

fn tokenize(src: &str) -> EvalResult<Vec<Spanned<Token>>> {
    let tokens = lexer().parse(src).into_result().map_err(syntax_error)?;
    if tokens.len() > MAX_TOKENS {
        return Err(EvalError::syntax("submission too long"));
    }
    if nesting(&tokens) > MAX_NESTING {
        return Err(EvalError::syntax("too many nested parentheses"));
    }
    Ok(tokens)
}

/// How deep the grammar would have to recurse to parse `tokens`.
fn nesting(tokens: &[Spanned<Token>]) -> usize {
    let mut brackets = 0usize;
    let mut chained = 0usize;
    let mut signs = 0usize;
    let mut deepest = 0;
    for (token, _) in tokens {
        match token {
            Token::LParen | Token::LBracket | Token::LBrace => brackets += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                brackets = brackets.saturating_sub(1);
            }
            // Right-recursive forms.
            Token::DoubleStar | Token::Else | Token::Lambda => chained += 1,
            _ => {}
        }
        signs = if matches!(token, Token::Plus | Token::Minus | Token::Not) {
            signs + 1
        } else {
            0
        };
        deepest = deepest.max(brackets + chained + signs);
    }
    deepest
}

/// First error as a `SyntaxError`; only custom reasons carry their own text.
fn syntax_error<T>(errors: Vec<Rich<'_, T, Span>>) -> EvalError {
    let message = errors
        .first()
        .and_then(|error| match error.reason() {
            RichReason::Custom(message) => Some(message.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "invalid syntax".to_string());
    EvalError::syntax(message)
}

enum Argument {
    Positional(Expr),
    Keyword(String, Expr),
}

enum Trailer {
    Call {
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
    },
    Subscript(Index),
    Attribute(String),
}

enum ListTail {
    Items(Vec<Expr>),
    Comprehension {
        target: String,
        iter: Expr,
        conditions: Vec<Expr>,
    },
}

enum AssignTail {
    Chain(Vec<Expr>),
    Augmented(BinOp, Expr),
}

/// `test (',' test)* [',']`, producing a tuple when a comma appears.
fn testlist<'src, I, P>(test: P) -> impl Parser<'src, I, Expr, ParserError<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = Span>,
    P: Parser<'src, I, Expr, ParserError<'src>> + Clone,
{
    test.clone()
        .then(
            just(Token::Comma)
                .ignore_then(test)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(just(Token::Comma).or_not())
        .map(|((first, rest), trailing)| {
            if rest.is_empty() && trailing.is_none() {
                first
            } else {
                Expr::Tuple(std::iter::once(first).chain(rest).collect())
            }
        })
}

/// A single `test`: everything but a bare top-level tuple.
fn expression<'src, I>() -> impl Parser<'src, I, Expr, ParserError<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = Span>,
{
    let mut test = Recursive::declare();
    let mut or_test = Recursive::declare();

    let name = select! { Token::Name(name) => name };

    let literal = select! {
        Token::Int(value) => Expr::Const(Value::Int(value)),
        Token::Float(value) => Expr::Const(Value::Float(value)),
        Token::True => Expr::Const(Value::Bool(true)),
        Token::False => Expr::Const(Value::Bool(false)),
        Token::None => Expr::Const(Value::None),
    };

    // Adjacent string literals concatenate.
    let string = select! { Token::Str(text) => text }
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .map(|parts| Expr::Const(Value::Str(parts.concat())));

    let parenthesized = testlist(test.clone())
        .or_not()
        .map(|inner| inner.unwrap_or_else(|| Expr::Tuple(Vec::new())))
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let comprehension = just(Token::For)
        .ignore_then(name.clone())
        .then_ignore(just(Token::In))
        .then(or_test.clone())
        .then(
            just(Token::If)
                .ignore_then(or_test.clone())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|((target, iter), conditions)| ListTail::Comprehension {
            target,
            iter,
            conditions,
        });

    let list_items = just(Token::Comma)
        .ignore_then(test.clone())
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(just(Token::Comma).or_not())
        .map(ListTail::Items);

    let list = test
        .clone()
        .then(choice((comprehension, list_items)))
        .or_not()
        .map(|display| match display {
            None => Expr::List(Vec::new()),
            Some((first, ListTail::Items(rest))) => {
                Expr::List(std::iter::once(first).chain(rest).collect())
            }
            Some((
                element,
                ListTail::Comprehension {
                    target,
                    iter,
                    conditions,
                },
            )) => Expr::ListComp {
                element: Box::new(element),
                target,
                iter: Box::new(iter),
                conditions,
            },
        })
        .delimited_by(just(Token::LBracket), just(Token::RBracket));

    let dict = test
        .clone()
        .then_ignore(just(Token::Colon))
        .then(test.clone())
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .map(Expr::Dict)
        .delimited_by(just(Token::LBrace), just(Token::RBrace));

    let atom = choice((
        literal,
        string,
        name.clone().map(Expr::Name),
        parenthesized,
        list,
        dict,
    ))
    .boxed();

    let argument = choice((
        name.clone()
            .then_ignore(just(Token::Assign))
            .then(test.clone())
            .map(|(name, value)| Argument::Keyword(name, value)),
        test.clone().map(Argument::Positional),
    ));

    let arguments = argument
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .validate(|arguments, extra, emitter| {
            split_arguments(arguments).unwrap_or_else(|message| {
                emitter.emit(Rich::custom(extra.span(), message));
                (Vec::new(), Vec::new())
            })
        });

    let slice_tail = just(Token::Colon)
        .ignore_then(test.clone().or_not())
        .then(
            just(Token::Colon)
                .ignore_then(test.clone().or_not())
                .or_not()
                .map(Option::flatten),
        );

    let index = testlist(test.clone())
        .or_not()
        .then(slice_tail.or_not())
        .try_map(|(lower, slice), span| match (lower, slice) {
            (Some(index), None) => Ok(Index::Single(index)),
            (lower, Some((upper, step))) => Ok(Index::Slice { lower, upper, step }),
            (None, None) => Err(Rich::custom(span, "invalid syntax")),
        });

    let trailer = choice((
        arguments
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|(args, keywords)| Trailer::Call { args, keywords }),
        index
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Trailer::Subscript),
        just(Token::Dot)
            .ignore_then(name.clone())
            .map(Trailer::Attribute),
    ));

    let primary = atom
        .then(trailer.repeated().collect::<Vec<_>>())
        .map(|(atom, trailers)| trailers.into_iter().fold(atom, apply_trailer));

    // `-2 ** 2` is `-(2 ** 2)`, while `2 ** -1` still parses.
    let arith = primary
        .pratt((
            infix(
                left(1),
                select! { Token::Plus => BinOp::Add, Token::Minus => BinOp::Sub },
                |lhs, op, rhs, _| binary(op, lhs, rhs),
            ),
            infix(
                left(2),
                select! {
                    Token::Star => BinOp::Mul,
                    Token::Slash => BinOp::Div,
                    Token::DoubleSlash => BinOp::FloorDiv,
                    Token::Percent => BinOp::Mod,
                },
                |lhs, op, rhs, _| binary(op, lhs, rhs),
            ),
            prefix(
                3,
                select! { Token::Minus => UnaryOp::Neg, Token::Plus => UnaryOp::Pos },
                |op, operand, _| unary(op, operand),
            ),
            infix(right(4), just(Token::DoubleStar), |lhs, _, rhs, _| {
                binary(BinOp::Pow, lhs, rhs)
            }),
        ))
        .boxed();

    let comparison_operator = choice((
        select! {
            Token::EqEq => CmpOp::Eq,
            Token::NotEq => CmpOp::NotEq,
            Token::Less => CmpOp::Lt,
            Token::LessEq => CmpOp::LtE,
            Token::Greater => CmpOp::Gt,
            Token::GreaterEq => CmpOp::GtE,
            Token::In => CmpOp::In,
        },
        just(Token::Not).then(just(Token::In)).to(CmpOp::NotIn),
        just(Token::Is).then(just(Token::Not)).to(CmpOp::IsNot),
        just(Token::Is).to(CmpOp::Is),
    ));

    // Chains stay flat so `a < b < c` evaluates `b` once.
    let comparison = arith
        .clone()
        .then(
            comparison_operator
                .then(arith)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(first, rest)| {
            if rest.is_empty() {
                first
            } else {
                Expr::Compare {
                    first: Box::new(first),
                    rest,
                }
            }
        });

    or_test.define(comparison.pratt((
        infix(left(1), just(Token::Or), |lhs, _, rhs, _| {
            boolean(BoolOp::Or, lhs, rhs)
        }),
        infix(left(2), just(Token::And), |lhs, _, rhs, _| {
            boolean(BoolOp::And, lhs, rhs)
        }),
        prefix(3, just(Token::Not), |_, operand, _| {
            unary(UnaryOp::Not, operand)
        }),
    )));

    let lambda = just(Token::Lambda)
        .ignore_then(
            name.separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(Token::Colon))
        .then(test.clone())
        .validate(|(params, body), extra, emitter| {
            if let Some(name) = first_duplicate(&params) {
                emitter.emit(Rich::custom(
                    extra.span(),
                    format!("duplicate argument '{name}' in function definition"),
                ));
            }
            Expr::Lambda {
                params,
                body: Rc::new(body),
            }
        });

    let conditional = or_test
        .clone()
        .then(
            just(Token::If)
                .ignore_then(or_test)
                .then_ignore(just(Token::Else))
                .then(test.clone())
                .or_not(),
        )
        .map(|(value, branch)| match branch {
            Some((condition, otherwise)) => Expr::IfElse {
                condition: Box::new(condition),
                then: Box::new(value),
                otherwise: Box::new(otherwise),
            },
            None => value,
        });

    test.define(choice((lambda, conditional)));
    test
}

fn statement<'src, I>() -> impl Parser<'src, I, Stmt, ParserError<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = Span>,
{
    let test = expression();
    let expressions = testlist(test.clone());

    let delete = just(Token::Del)
        .ignore_then(
            test.clone()
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .validate(|targets, extra, emitter| {
            match targets.into_iter().map(to_target).collect::<Result<Vec<_>, _>>() {
                Ok(targets) => Stmt::Delete(targets),
                Err(message) => {
                    emitter.emit(Rich::custom(extra.span(), message));
                    Stmt::Pass
                }
            }
        });

    let assert = just(Token::Assert)
        .ignore_then(test.clone())
        .then(just(Token::Comma).ignore_then(test.clone()).or_not())
        .map(|(test, message)| Stmt::Assert { test, message });

    let raise = just(Token::Raise)
        .ignore_then(test.or_not())
        .map(Stmt::Raise);

    let tail = choice((
        just(Token::Assign)
            .ignore_then(expressions.clone())
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map(AssignTail::Chain),
        select! { Token::AugAssign(op) => op }
            .then(expressions.clone())
            .map(|(op, value)| AssignTail::Augmented(op, value)),
    ));

    let expression_statement = expressions
        .then(tail.or_not())
        .validate(|(first, tail), extra, emitter| {
            assignment(first, tail).unwrap_or_else(|message| {
                emitter.emit(Rich::custom(extra.span(), message));
                Stmt::Pass
            })
        });

    choice((
        just(Token::Pass).to(Stmt::Pass),
        delete,
        assert,
        raise,
        expression_statement,
    ))
}

fn split_arguments(
    arguments: Vec<Argument>,
) -> Result<(Vec<Expr>, Vec<(String, Expr)>), String> {
    let mut args = Vec::new();
    let mut keywords: Vec<(String, Expr)> = Vec::new();
    for argument in arguments {
        match argument {
            Argument::Positional(value) if keywords.is_empty() => args.push(value),
            Argument::Positional(_) => {
                return Err("positional argument follows keyword argument".to_string());
            }
            Argument::Keyword(name, value) => {
                if keywords.iter().any(|(existing, _)| *existing == name) {
                    return Err(format!("keyword argument repeated: {name}"));
                }
                keywords.push((name, value));
            }
        }
    }
    Ok((args, keywords))
}

fn first_duplicate(names: &[String]) -> Option<&String> {
    names
        .iter()
        .enumerate()
        .find(|&(at, name)| names[..at].contains(name))
        .map(|(_, name)| name)
}

fn apply_trailer(expr: Expr, trailer: Trailer) -> Expr {
    match trailer {
        Trailer::Call { args, keywords } => Expr::Call {
            func: Box::new(expr),
            args,
            keywords,
        },
        Trailer::Subscript(index) => Expr::Subscript {
            object: Box::new(expr),
            index: Box::new(index),
        },
        Trailer::Attribute(name) => Expr::Attribute {
            object: Box::new(expr),
            name,
        },
    }
}

fn assignment(first: Expr, tail: Option<AssignTail>) -> Result<Stmt, &'static str> {
    match tail {
        None => Ok(Stmt::Expr(first)),
        // `a = b = value`: everything before the last `=` is a target.
        Some(AssignTail::Chain(mut values)) => {
            let value = values.pop().ok_or("invalid syntax")?;
            let targets = std::iter::once(first)
                .chain(values)
                .map(to_target)
                .collect::<Result<_, _>>()?;
            Ok(Stmt::Assign { targets, value })
        }
        Some(AssignTail::Augmented(op, value)) => match to_target(first)? {
            Target::Tuple(_) => Err("illegal expression for augmented assignment"),
            target => Ok(Stmt::AugAssign { target, op, value }),
        },
    }
}

fn to_target(expr: Expr) -> Result<Target, &'static str> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Subscript { object, index } => Ok(Target::Subscript {
            object: *object,
            index: *index,
        }),
        Expr::Tuple(items) | Expr::List(items) if !items.is_empty() => Ok(Target::Tuple(
            items
                .into_iter()
                .map(to_target)
                .collect::<Result<_, _>>()?,
        )),
        Expr::Attribute { .. } => Err("cannot assign to attribute here"),
        Expr::Call { .. } => Err("cannot assign to function call"),
        Expr::Const(_) => Err("cannot assign to literal"),
        _ => Err("cannot assign to expression"),
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn boolean(op: BoolOp, left: Expr, right: Expr) -> Expr {
    Expr::Bool {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;

    fn is_syntax_error(result: EvalResult<impl std::fmt::Debug>) -> bool {
        matches!(result, Err(err) if err.kind() == Some(ErrorKind::SyntaxError))
    }

    fn message(result: EvalResult<impl std::fmt::Debug>) -> String {
        result.expect_err("syntax error").to_string()
    }

    #[test]
    fn power_binds_tighter_than_unary_minus() {
        let expr = parse_expression("-2 ** 2").expect("parse");
        assert!(matches!(
            expr,
            Expr::Unary {
                op: UnaryOp::Neg,
                ..
            }
        ));
    }

    #[test]
    fn power_accepts_a_signed_exponent_and_is_right_associative() {
        match parse_expression("2 ** -1").expect("parse") {
            Expr::Binary {
                op: BinOp::Pow,
                right,
                ..
            } => assert!(matches!(*right, Expr::Unary { op: UnaryOp::Neg, .. })),
            other => panic!("unexpected {other:?}"),
        }
        match parse_expression("2 ** 3 ** 2").expect("parse") {
            Expr::Binary {
                op: BinOp::Pow,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinOp::Pow, .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3").expect("parse");
        match expr {
            Expr::Binary {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        match parse_expression("8 - 4 - 2").expect("parse") {
            Expr::Binary {
                op: BinOp::Sub,
                left,
                right,
            } => {
                assert!(matches!(*left, Expr::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(*right, Expr::Const(Value::Int(2))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn chained_comparison_keeps_every_operator() {
        let expr = parse_expression("1 < x <= 3 not in y").expect("parse");
        match expr {
            Expr::Compare { rest, .. } => {
                let ops: Vec<CmpOp> = rest.iter().map(|(op, _)| *op).collect();
                assert_eq!(ops, vec![CmpOp::Lt, CmpOp::LtE, CmpOp::NotIn]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn not_applies_to_the_whole_comparison() {
        match parse_expression("not a is not b and c").expect("parse") {
            Expr::Bool {
                op: BoolOp::And,
                left,
                ..
            } => match *left {
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand,
                } => assert!(matches!(*operand, Expr::Compare { .. })),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn assignment_is_not_an_expression() {
        assert!(is_syntax_error(parse_expression("a = 1")));
        assert!(matches!(
            parse_statement("a = b = 1").expect("parse"),
            Stmt::Assign { ref targets, .. } if targets.len() == 2
        ));
    }

    #[test]
    fn subscript_and_augmented_assignment() {
        assert!(matches!(
            parse_statement("d['k'] = 'v'").expect("parse"),
            Stmt::Assign { .. }
        ));
        assert!(matches!(
            parse_statement("q *= 2").expect("parse"),
            Stmt::AugAssign { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn invalid_targets_name_the_problem() {
        assert_eq!(message(parse_statement("f() = 1")), "cannot assign to function call");
        assert_eq!(message(parse_statement("1 = x")), "cannot assign to literal");
        assert_eq!(
            message(parse_statement("a, b += 1")),
            "illegal expression for augmented assignment"
        );
    }

    #[test]
    fn tuple_unpacking_target() {
        match parse_statement("a, b = 1, 2").expect("parse") {
            Stmt::Assign { targets, value } => {
                assert!(matches!(targets[0], Target::Tuple(ref items) if items.len() == 2));
                assert!(matches!(value, Expr::Tuple(ref items) if items.len() == 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn keyword_statements() {
        assert!(matches!(parse_statement("pass").expect("parse"), Stmt::Pass));
        assert!(matches!(
            parse_statement("del a, d['k']").expect("parse"),
            Stmt::Delete(ref targets) if targets.len() == 2
        ));
        assert!(matches!(
            parse_statement("assert x, 'msg'").expect("parse"),
            Stmt::Assert { message: Some(_), .. }
        ));
        assert!(matches!(parse_statement("raise").expect("parse"), Stmt::Raise(None)));
        assert!(matches!(
            parse_statement("raise ValueError('no')").expect("parse"),
            Stmt::Raise(Some(Expr::Call { .. }))
        ));
    }

    #[test]
    fn lambda_and_comprehension() {
        assert!(matches!(
            parse_expression("lambda x, y: x + y").expect("parse"),
            Expr::Lambda { ref params, .. } if params.len() == 2
        ));
        assert!(matches!(
            parse_expression("[i * 2 for i in range(5) if i % 2]").expect("parse"),
            Expr::ListComp { ref conditions, .. } if conditions.len() == 1
        ));
    }

    #[test]
    fn duplicate_lambda_parameters_are_rejected() {
        assert_eq!(
            message(parse_expression("lambda x, x: x")),
            "duplicate argument 'x' in function definition"
        );
    }

    #[test]
    fn conditional_expression() {
        assert!(matches!(
            parse_expression("'yes' if ok else 'no'").expect("parse"),
            Expr::IfElse { .. }
        ));
        assert!(is_syntax_error(parse_expression("'yes' if ok")));
    }

    #[test]
    fn keyword_arguments_must_follow_positionals() {
        assert!(parse_expression("print(1, 2, sep='-')").is_ok());
        assert_eq!(
            message(parse_expression("print(sep='-', 1)")),
            "positional argument follows keyword argument"
        );
        assert_eq!(
            message(parse_expression("print(sep='-', sep='+')")),
            "keyword argument repeated: sep"
        );
    }

    #[test]
    fn slices_parse_every_part() {
        match parse_expression("x[::2]").expect("parse") {
            Expr::Subscript { index, .. } => match *index {
                Index::Slice { lower, upper, step } => {
                    assert!(lower.is_none() && upper.is_none() && step.is_some());
                }
                Index::Single(_) => panic!("expected slice"),
            },
            other => panic!("unexpected {other:?}"),
        }
        assert!(is_syntax_error(parse_expression("x[]")));
    }

    #[test]
    fn trailers_apply_left_to_right() {
        match parse_expression("math.floor(x)[0]").expect("parse") {
            Expr::Subscript { object, .. } => match *object {
                Expr::Call { func, args, .. } => {
                    assert_eq!(args.len(), 1);
                    assert!(matches!(*func, Expr::Attribute { ref name, .. } if name == "floor"));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parenthesised_forms() {
        assert!(matches!(parse_expression("()").expect("parse"), Expr::Tuple(ref items) if items.is_empty()));
        assert!(matches!(parse_expression("(1,)").expect("parse"), Expr::Tuple(ref items) if items.len() == 1));
        assert!(matches!(parse_expression("(1)").expect("parse"), Expr::Const(Value::Int(1))));
        assert!(matches!(parse_expression("1, 2").expect("parse"), Expr::Tuple(ref items) if items.len() == 2));
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert!(matches!(
            parse_expression("'a' \"b\"").expect("parse"),
            Expr::Const(Value::Str(ref text)) if text == "ab"
        ));
    }

    #[test]
    fn set_literals_and_reserved_words_are_rejected() {
        assert!(is_syntax_error(parse_expression("{1, 2}")));
        assert!(is_syntax_error(parse_statement("def f(): pass")));
        assert!(is_syntax_error(parse_expression("1 +")));
        assert!(is_syntax_error(parse_statement("")));
    }

    #[test]
    fn lexer_failures_surface_as_syntax_errors() {
        assert!(is_syntax_error(parse_statement("a = 1; b = 2")));
        assert!(is_syntax_error(parse_expression("'abc")));
    }

    #[test]
    fn deep_nesting_is_rejected_without_overflowing() {
        let parens = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(message(parse_expression(&parens)), "too many nested parentheses");
        let signs = format!("{}1", "-".repeat(500));
        assert!(is_syntax_error(parse_expression(&signs)));
    }

    #[test]
    fn nested_displays_parse() {
        let src = format!("{}1{}", "[".repeat(12), "]".repeat(12));
        assert!(matches!(parse_expression(&src).expect("parse"), Expr::List(_)));
    }
}
