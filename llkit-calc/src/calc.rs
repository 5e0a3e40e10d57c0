//! The calculator: shared tables plus a per-instance function table.

use crate::error::CalcError;
use crate::lexer::{self, CalcLexicon};
use llkit::{Evaluator, FunctionTable, LlGrammar, Value, convert};
use log::debug;
use once_cell::sync::Lazy;
use smartstring::alias::String;
use std::collections::HashMap;

const SOURCE: &str = include_str!("calc.llg");

struct Tables {
    grammar: LlGrammar,
    lexicon: CalcLexicon,
}

impl Tables {
    fn build() -> anyhow::Result<Self> {
        let grammar = convert(llkit_gen::load(SOURCE)?)?;
        let lexicon = lexer::lexicon(&grammar)?;
        debug!(
            "calculator tables: {} nonterminals, {} lexer states",
            grammar.nonterminals().len(),
            lexicon.automaton().len()
        );
        Ok(Self { grammar, lexicon })
    }
}

static TABLES: Lazy<Result<Tables, String>> =
    Lazy::new(|| Tables::build().map_err(|e| format!("{:#}", e).into()));

fn tables() -> Result<&'static Tables, CalcError> {
    TABLES.as_ref().map_err(|e| CalcError::Tables(e.clone()))
}

/// The converted calculator grammar, shared by every [`Calculator`].
pub fn grammar() -> Result<&'static LlGrammar, CalcError> {
    Ok(&tables()?.grammar)
}

fn int_arg(args: &[Value], i: usize) -> Result<i64, std::string::String> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(format!("operand {} is {}, not an integer", i, other)),
        None => Err(format!("missing operand {}", i)),
    }
}

fn text_arg(args: &[Value], i: usize) -> Result<&str, std::string::String> {
    args.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("operand {} is not text", i))
}

fn binary(
    op: impl Fn(i64, i64) -> Option<i64> + Send + Sync + 'static,
    what: &'static str,
) -> impl Fn(&[Value]) -> Result<Value, std::string::String> + Send + Sync + 'static {
    move |args: &[Value]| {
        let (a, b) = (int_arg(args, 0)?, int_arg(args, 1)?);
        op(a, b).map(Value::Int).ok_or_else(|| format!("{} of {} and {}", what, a, b))
    }
}

/// `10k`, `4M`, `2g`: binary multiples of the leading number.
pub fn parse_size(text: &str) -> Result<i64, std::string::String> {
    let Some(suffix) = text.chars().last() else {
        return Err("empty size".into());
    };
    let shift = match suffix.to_ascii_lowercase() {
        'k' => 10,
        'm' => 20,
        'g' => 30,
        _ => return Err(format!("{:?} has no size suffix", text)),
    };
    let digits = &text[..text.len() - suffix.len_utf8()];
    let n: i64 = digits.parse().map_err(|e| format!("{:?}: {}", text, e))?;
    n.checked_mul(1 << shift)
        .ok_or_else(|| format!("{:?} is out of range", text))
}

/// Evaluates integer expressions with `+ - * /`, unary minus, parentheses,
/// size literals and named variables.
pub struct Calculator {
    functions: FunctionTable,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::with_vars(std::iter::empty::<(&str, i64)>())
    }

    /// A calculator whose identifiers resolve to `vars`.
    pub fn with_vars<'n>(vars: impl IntoIterator<Item = (&'n str, i64)>) -> Self {
        let vars: HashMap<String, i64> = vars.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let mut functions = FunctionTable::new();
        functions
            .register("int", |args: &[Value]| {
                let text = text_arg(args, 0)?;
                text.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|e| format!("{:?}: {}", text, e))
            })
            .register("scale", |args: &[Value]| {
                parse_size(text_arg(args, 0)?).map(Value::Int)
            })
            .register("add", binary(i64::checked_add, "overflow in sum"))
            .register("sub", binary(i64::checked_sub, "overflow in difference"))
            .register("mul", binary(i64::checked_mul, "overflow in product"))
            .register(
                "div",
                binary(
                    |a, b| if b == 0 { None } else { a.checked_div(b) },
                    "undefined quotient",
                ),
            )
            .register("neg", |args: &[Value]| {
                let a = int_arg(args, 0)?;
                a.checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| format!("overflow negating {}", a))
            })
            .register("var", move |args: &[Value]| {
                let name = text_arg(args, 0)?;
                vars.get(name)
                    .copied()
                    .map(Value::Int)
                    .ok_or_else(|| format!("unknown variable {}", name))
            });
        Self { functions }
    }

    /// Evaluate one expression.
    pub fn eval(&self, input: &str) -> Result<i64, CalcError> {
        let tables = tables()?;
        let mut evaluator = Evaluator::new(&tables.grammar, &self.functions);
        let result = evaluator.parse(tables.lexicon.tokenizer(input.chars()))?;
        debug!("{:?}: {:?}", input, evaluator.stats());
        match result.get("v") {
            Some(Value::Int(n)) => Ok(*n),
            Some(other) => Err(CalcError::NotInteger(other.clone())),
            None => Err(CalcError::NotInteger(Value::Null)),
        }
    }
}
