//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Table-driven lexer and LL(1) parser construction.
//!
//! `llkit` covers both halves of a classic front end:
//!
//!  * **automata**: character-class [`Condition`]s parsed from mini-patterns,
//!    a [`TransitionBuilder`] that compiles them into an [`Automaton`] with
//!    per-state optimized dispatch, and a maximal-munch [`Tokenizer`];
//!  * **grammars**: a [`GrammarBuilder`] for productions with semantic
//!    actions, the [`convert`] pipeline (left-recursion removal, FIRST/FOLLOW,
//!    analyze tables) and a stack-based [`Evaluator`] that runs the actions
//!    while parsing.
//!
//! Both the automaton and the converted grammar are immutable once built and
//! may be shared by any number of sessions.
//!
//! ```rust
//! use llkit::{
//!     convert, Action, Evaluator, Expr, FunctionTable, GrammarBuilder, Item, Value, Variable,
//!     VecTokens,
//! };
//!
//! let mut b = GrammarBuilder::new();
//! b.terminal("num", "number", "0-9")
//!     .terminal("plus", "+", "+")
//!     .production(
//!         "E",
//!         [
//!             Item::sym("E"),
//!             Item::sym("plus"),
//!             Item::sym("num").act(Action::new(
//!                 Variable::result("v"),
//!                 Expr::call("add", [Expr::var(Variable::slot(0, "v")), Expr::var(Variable::slot(2, "text"))]),
//!             )),
//!         ],
//!     )
//!     .production(
//!         "E",
//!         [Item::sym("num").act(Action::new(
//!             Variable::result("v"),
//!             Expr::call("int", [Expr::var(Variable::slot(0, "text"))]),
//!         ))],
//!     );
//! let grammar = convert(b.build()?)?;
//!
//! let mut functions = FunctionTable::new();
//! functions
//!     .register("int", |a: &[Value]| a[0].as_str().unwrap_or("").parse::<i64>().map(Value::Int))
//!     .register("add", |a: &[Value]| match (&a[0], a[1].as_str().map(str::parse::<i64>)) {
//!         (Value::Int(x), Some(Ok(y))) => Ok(Value::Int(x + y)),
//!         _ => Err("bad operands"),
//!     });
//!
//! let num = grammar.terminal_id("num").unwrap();
//! let plus = grammar.terminal_id("plus").unwrap();
//! let tokens = VecTokens::from_texts([(num, "1"), (plus, "+"), (num, "2"), (plus, "+"), (num, "39")]);
//! let result = Evaluator::new(&grammar, &functions).parse(tokens)?;
//! assert_eq!(result.get("v"), Some(&Value::Int(42)));
//! # Ok::<(), llkit::LlError>(())
//! ```

pub mod action;
pub mod cond;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod eval;
pub mod grammar;
pub mod lexer;
pub mod optimize;
pub mod rewrite;
pub mod symtab;
pub mod table;
pub mod trans;

pub use crate::action::{Action, Expr, Value, Variable};
pub use crate::cond::{Condition, EOF};
pub use crate::convert::{LlGrammar, convert, remove_left_recursion};
pub use crate::cursor::LexerCursor;
pub use crate::error::{LlError, Position, Span};
pub use crate::eval::{Evaluator, FunctionTable, Namespace, NativeFn, ParserStats};
pub use crate::grammar::{
    Element, FirstSet, FollowSet, Grammar, GrammarBuilder, Item, Nonterminal, NonterminalId,
    Production, Symbol, Terminal, TerminalId,
};
pub use crate::lexer::{
    Accept, CharSource, LexerStats, Lexicon, Token, TokenSource, Tokenizer, VecTokens,
};
pub use crate::optimize::{OptimizeConfig, Transfer};
pub use crate::table::{Grid, render_grid};
pub use crate::trans::{Automaton, Edge, Input, StateId, TransitionBuilder};
