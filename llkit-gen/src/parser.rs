use super::lexer::Token;
use chumsky::prelude::*;
use llkit::{Action, Expr, Item, Value, Variable};
use smartstring::alias::String;

/// One meaningful line of a grammar file.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `%term name "display" "pattern"`
    Term {
        name: String,
        display: String,
        pattern: String,
    },
    /// `%start Name`
    Start(String),
    /// `Lhs -> items`
    Production { lhs: String, items: Vec<Item> },
}

pub type Extra<'a> = extra::Err<Rich<'a, Token>>;

pub fn parser<'a>() -> impl Parser<'a, &'a [Token], Vec<Line>, Extra<'a>> {
    let lf = just(Token::LineFeed).labelled("end of line");

    let term = select! { Token::Term(t) => t }.labelled("terminal");
    let nonterm = select! { Token::NonTerm(n) => n }.labelled("nonterminal");
    let string = select! { Token::Str(s) => s }.labelled("string");
    let field = select! {
        Token::Term(f) => f,
        Token::NonTerm(f) => f,
    }
    .labelled("field");

    let variable = select! {
        Token::Result => Variable::RESULT,
        Token::Local => Variable::LOCAL,
        Token::Slot(n) => n as i32,
    }
    .labelled("variable")
    .then_ignore(just(Token::Dot))
    .then(field)
    .map(|(pos, f)| Variable::new(pos, &f));

    let expr = recursive({
        let variable = variable.clone();
        let term = term.clone();
        move |expr| {
            let args = expr
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen));
            let call = term
                .then(args)
                .map(|(name, args): (String, Vec<Expr>)| Expr::call(&name, args));
            let literal = select! {
                Token::Int(n) => Value::Int(n),
                Token::Str(s) => Value::Str(s),
                Token::Term(t) if t.as_str() == "true" => Value::Bool(true),
                Token::Term(t) if t.as_str() == "false" => Value::Bool(false),
                Token::Term(t) if t.as_str() == "null" => Value::Null,
            }
            .map(Expr::Const);
            choice((variable.map(Expr::Var), call, literal)).labelled("expression")
        }
    });

    let action = variable
        .then_ignore(just(Token::Eq))
        .then(expr)
        .map(|(dest, expr)| Action::new(dest, expr));

    let block = action
        .separated_by(just(Token::Semi))
        .allow_trailing()
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBrace), just(Token::RBrace));

    let symbol = choice((
        term.clone().map(|t| Item::sym(&t)),
        nonterm.clone().map(|n| Item::sym(&n)),
        just(Token::Eps).to(Item::epsilon()),
    ))
    .labelled("symbol");

    let item = symbol
        .then(block.repeated().collect::<Vec<_>>())
        .map(|(item, blocks)| blocks.into_iter().flatten().fold(item, Item::act));

    let production = nonterm
        .clone()
        .then_ignore(just(Token::Arrow))
        .then(item.repeated().collect::<Vec<_>>())
        .then_ignore(lf.clone())
        .map(|(lhs, items)| Some(Line::Production { lhs, items }));

    let term_decl = just(Token::TermDecl)
        .ignore_then(term)
        .then(string.clone())
        .then(string)
        .then_ignore(lf.clone())
        .map(|((name, display), pattern)| {
            Some(Line::Term {
                name,
                display,
                pattern,
            })
        });

    let start_decl = just(Token::StartDecl)
        .ignore_then(nonterm)
        .then_ignore(lf.clone())
        .map(|n| Some(Line::Start(n)));

    let empty_line = lf.to(None::<Line>);

    choice((term_decl, start_decl, production, empty_line))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|lines| lines.into_iter().flatten().collect::<Vec<_>>())
}
