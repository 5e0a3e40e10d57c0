use llkit::table::{Grid, render_grid};
use llkit::{
    Accept, Action, Expr, FunctionTable, GrammarBuilder, Item, Lexicon, LlError, LlGrammar,
    Symbol, TokenSource, TransitionBuilder, Value, Variable, convert,
};
use std::sync::{Arc, Mutex};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn v(pos: i32) -> Expr {
    Expr::var(Variable::new(pos, "v"))
}

fn set_v(expr: Expr) -> Action {
    Action::new(Variable::result("v"), expr)
}

/// E -> E + T | T ; T -> ( E ) | id | num
fn expr_grammar() -> LlGrammar {
    let leaf = || set_v(Expr::call("leaf", [Expr::var(Variable::slot(0, "text"))]));
    let mut b = GrammarBuilder::new();
    b.terminal("plus", "+", "+")
        .terminal("lp", "(", "\\(")
        .terminal("rp", ")", "\\)")
        .terminal("id", "identifier", "a-zA-Z_")
        .terminal("num", "number", "0-9")
        .production(
            "E",
            [
                Item::sym("E"),
                Item::sym("plus"),
                Item::sym("T").act(set_v(Expr::call("mknode", [Expr::constant("+"), v(0), v(2)]))),
            ],
        )
        .production("E", [Item::sym("T").act(set_v(v(0)))])
        .production(
            "T",
            [Item::sym("lp"), Item::sym("E"), Item::sym("rp").act(set_v(v(1)))],
        )
        .production("T", [Item::sym("id").act(leaf())])
        .production("T", [Item::sym("num").act(leaf())]);
    convert(b.build().unwrap()).unwrap()
}

fn lexicon(g: &LlGrammar) -> Lexicon<&'static str, ()> {
    let mut b = TransitionBuilder::new();
    b.add_edge("start", '+', "plus", None)
        .unwrap()
        .add_edge("start", '(', "lp", None)
        .unwrap()
        .add_edge("start", ')', "rp", None)
        .unwrap()
        .add_edge("start", "a-zA-Z_", "id", None)
        .unwrap()
        .add_edge("id", "a-zA-Z_0-9", "id", None)
        .unwrap()
        .add_edge("start", "0-9", "num", None)
        .unwrap()
        .add_edge("num", "0-9", "num", None)
        .unwrap()
        .add_edge("start", " |\t|\n", "ws", None)
        .unwrap()
        .add_edge("ws", " |\t|\n", "ws", None)
        .unwrap();
    b.declare("plus").declare("lp").declare("rp");
    let mut lex = Lexicon::new(b.build(&"start").unwrap());
    for name in ["plus", "lp", "rp", "id", "num"] {
        let t = g.terminal_id(name).unwrap();
        lex.accept(&name, Accept::Token(t)).unwrap();
    }
    lex.accept(&"ws", Accept::Skip).unwrap();
    lex
}

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

fn functions() -> (FunctionTable, Calls) {
    let calls: Calls = Arc::default();
    let mut f = FunctionTable::new();
    let log = calls.clone();
    f.register("leaf", |args: &[Value]| Ok::<_, String>(args[0].clone()))
        .register("mknode", move |args: &[Value]| {
            log.lock().map_err(|e| e.to_string())?.push(args.to_vec());
            Ok::<_, String>(Value::List(args.to_vec()))
        });
    (f, calls)
}

fn node(l: Value, r: Value) -> Value {
    Value::List(vec!["+".into(), l, r])
}

#[test]
fn sum_of_two_numbers_builds_one_node() {
    init_logger();
    let g = expr_grammar();
    let lex = lexicon(&g);
    let (f, calls) = functions();
    let mut ev = llkit::Evaluator::new(&g, &f);
    let ns = ev.parse(lex.tokenizer("12 + 7".chars())).unwrap();
    assert_eq!(ns.get("v"), Some(&node("12".into(), "7".into())));
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec![Value::from("+"), "12".into(), "7".into()]);
}

#[test]
fn addition_stays_left_associative() {
    let g = expr_grammar();
    let lex = lexicon(&g);
    let (f, calls) = functions();
    let ns = llkit::Evaluator::new(&g, &f)
        .parse(lex.tokenizer("a + (b + 1) + c".chars()))
        .unwrap();
    let inner = node("b".into(), "1".into());
    let expected = node(node("a".into(), inner.clone()), "c".into());
    assert_eq!(ns.get("v"), Some(&expected));
    // inner node first, then the outer ones left to right
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(Value::List(calls[0].clone()), inner);
    assert_eq!(calls[2][2], Value::from("c"));
}

#[test]
fn deep_nesting_runs_without_native_recursion() {
    let g = expr_grammar();
    let lex = lexicon(&g);
    let (f, _) = functions();
    let depth = 20_000;
    let text = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let mut ev = llkit::Evaluator::new(&g, &f);
    let ns = ev.parse(lex.tokenizer(text.chars())).unwrap();
    assert_eq!(ns.get("v"), Some(&Value::from("x")));
    assert_eq!(ev.stats().tokens, 2 * depth + 1);
}

#[test]
fn unbalanced_input_is_rejected() {
    let g = expr_grammar();
    let lex = lexicon(&g);
    let (f, _) = functions();
    for text in ["(1 + 2", "1 +", "1 2", ")", ""] {
        let err = llkit::Evaluator::new(&g, &f)
            .parse(lex.tokenizer(text.chars()))
            .unwrap_err();
        assert!(matches!(err, LlError::Syntax { .. }), "{}: {:?}", text, err);
        assert!(!err.is_construction());
    }
}

fn text(pos: usize) -> Expr {
    Expr::var(Variable::slot(pos, "text"))
}

/// Builder with the terminals `lexicon` accepts.
fn terminals() -> GrammarBuilder {
    let mut b = GrammarBuilder::new();
    b.terminal("plus", "+", "+")
        .terminal("lp", "(", "\\(")
        .terminal("rp", ")", "\\)")
        .terminal("id", "identifier", "a-zA-Z_")
        .terminal("num", "number", "0-9");
    b
}

fn leads_with_terminals(g: &LlGrammar) -> bool {
    g.nonterminal(g.start())
        .productions
        .iter()
        .all(|p| matches!(p.leading(), Symbol::Terminal(_)))
}

/// A -> num | ( num ) ; S -> A + num, with A numbered before S
#[test]
fn earlier_nonterminal_is_spliced_into_its_user() {
    init_logger();
    let mut b = terminals();
    b.production("A", [Item::sym("num").act(set_v(text(0)))])
        .production(
            "A",
            [Item::sym("lp"), Item::sym("num"), Item::sym("rp").act(set_v(text(1)))],
        )
        .production(
            "S",
            [
                Item::sym("A"),
                Item::sym("plus"),
                Item::sym("num").act(set_v(Expr::call("mknode", [Expr::constant("+"), v(0), text(2)]))),
            ],
        )
        .start("S");
    let g = convert(b.build().unwrap()).unwrap();
    assert!(leads_with_terminals(&g));

    let lex = lexicon(&g);
    let (f, calls) = functions();
    for (input, left, right) in [("7 + 5", "7", "5"), ("(3) + 4", "3", "4")] {
        let ns = llkit::Evaluator::new(&g, &f)
            .parse(lex.tokenizer(input.chars()))
            .unwrap();
        assert_eq!(ns.get("v"), Some(&node(left.into(), right.into())), "{}", input);
    }
    assert_eq!(calls.lock().unwrap().len(), 2);
}

/// E -> E + num | num ; S -> E, with the left-recursive E numbered first
#[test]
fn left_recursive_nonterminal_is_spliced_into_its_user() {
    let mut b = terminals();
    b.production(
        "E",
        [
            Item::sym("E"),
            Item::sym("plus"),
            Item::sym("num").act(set_v(Expr::call("mknode", [Expr::constant("+"), v(0), text(2)]))),
        ],
    )
    .production("E", [Item::sym("num").act(set_v(text(0)))])
    .production(
        "S",
        [Item::sym("E").act(set_v(Expr::call("mknode", [Expr::constant("s"), v(0)])))],
    )
    .start("S");
    let g = convert(b.build().unwrap()).unwrap();
    assert!(leads_with_terminals(&g));

    let lex = lexicon(&g);
    let (f, _) = functions();
    let ns = llkit::Evaluator::new(&g, &f)
        .parse(lex.tokenizer("1 + 2 + 3".chars()))
        .unwrap();
    let sum = node(node("1".into(), "2".into()), "3".into());
    assert_eq!(ns.get("v"), Some(&Value::List(vec!["s".into(), sum])));

    let ns = llkit::Evaluator::new(&g, &f)
        .parse(lex.tokenizer("9".chars()))
        .unwrap();
    assert_eq!(ns.get("v"), Some(&Value::List(vec!["s".into(), "9".into()])));
}

#[test]
fn tokenizer_feeds_terminal_ordinals() {
    let g = expr_grammar();
    let lex = lexicon(&g);
    let mut t = lex.tokenizer("(x1)".chars());
    let names: Vec<_> = std::iter::from_fn(|| {
        let tok = t.next_token().unwrap();
        tok.terminal.map(|id| g.terminal(id).name.to_string())
    })
    .collect();
    assert_eq!(names, ["lp", "id", "rp"]);
}

#[test]
fn ambiguous_alternatives_fail_conversion() {
    let mut b = GrammarBuilder::new();
    b.terminal("a", "a", "a")
        .terminal("b", "b", "b")
        .production("S", [Item::sym("a")])
        .production("S", [Item::sym("a"), Item::sym("b")]);
    let err = convert(b.build().unwrap()).unwrap_err();
    assert!(matches!(err, LlError::AmbiguousGrammar { .. }));
    assert!(err.is_construction());
}

#[test]
fn analyze_table_grid_round_trips() {
    let g = expr_grammar();
    let text = render_grid(&g);
    let grid = Grid::parse(&text).unwrap();
    assert_eq!(grid, Grid::from_grammar(&g));
    assert_eq!(
        grid.columns.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        ["plus", "lp", "rp", "id", "num", "$"]
    );
    let names: Vec<_> = grid.rows.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["E", "T", "E'"]);
    for (i, (_, cells)) in grid.rows.iter().enumerate() {
        assert_eq!(cells, &g.nonterminals()[i].table);
    }
}

#[test]
fn fixed_point_holds_after_conversion() {
    let mut g = expr_grammar().into_grammar();
    assert!(!llkit::convert::first_pass(&mut g));
    assert!(!llkit::convert::follow_pass(&mut g));
}
