use super::lexer::Lexer;
use super::parser::{self, Line};
use anyhow::{Context, Result, anyhow};
use chumsky::Parser;
use llkit::table::{write_first_follow, write_prods, write_table};
use llkit::{Grammar, GrammarBuilder, LlGrammar, convert};
use log::{debug, info};
use std::io::Write;
use std::path::Path;

/// Read a grammar from `.llg` source text.
///
/// Terminals are numbered in `%term` order and nonterminals in order of first
/// appearance on a left-hand side; the first left-hand side is the start
/// symbol unless `%start` names another.
pub fn load(source: &str) -> Result<Grammar> {
    let toks = Lexer::tokenize_all(source)?;
    let lines = parser::parser()
        .parse(toks.tokens.as_slice())
        .into_result()
        .map_err(|errs| {
            let messages: Vec<std::string::String> = errs
                .iter()
                .map(|e| {
                    let line = toks.line(e.span().start);
                    match e.found() {
                        Some(found) => format!("line {}: unexpected {}", line, found),
                        None => format!("line {}: unexpected end of file", line),
                    }
                })
                .collect();
            anyhow!(messages.join("\n"))
        })
        .context("malformed grammar")?;

    let mut b = GrammarBuilder::new();
    let mut n_prods = 0;
    for line in lines {
        match line {
            Line::Term {
                name,
                display,
                pattern,
            } => {
                b.terminal(&name, &display, &pattern);
            }
            Line::Start(name) => {
                b.start(&name);
            }
            Line::Production { lhs, items } => {
                n_prods += 1;
                b.production(&lhs, items);
            }
        }
    }
    debug!("grammar source: {} productions", n_prods);
    let grammar = b.build().context("invalid grammar")?;
    Ok(grammar)
}

/// Read a grammar file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Grammar> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("can't read {}", path.display()))?;
    load(&source).with_context(|| format!("in {}", path.display()))
}

/// Write the conversion report for `g`: productions, FIRST/FOLLOW sets and
/// the analyze table.
pub fn write_report<W: Write>(out: &mut W, g: &LlGrammar) -> Result<()> {
    writeln!(out, "/*")?;
    writeln!(out, "Produced by LL(1) table generator llgen")?;
    writeln!(out, "*/\n")?;
    write_prods(out, g)?;
    writeln!(out)?;
    write_first_follow(out, g)?;
    writeln!(out)?;
    write_table(out, g)?;
    Ok(())
}

/// Convert the grammar in `grammar_path` and write its report to `out_path`.
pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(grammar_path: P, out_path: Q) -> Result<()> {
    let grammar = load_file(&grammar_path)?;
    let g = convert(grammar).context("grammar can't be converted to LL(1)")?;
    let out_path = out_path.as_ref();
    let mut out = std::io::BufWriter::new(
        std::fs::File::create(out_path)
            .with_context(|| format!("can't create {}", out_path.display()))?,
    );
    write_report(&mut out, &g)?;
    out.flush()?;
    info!(
        "wrote {} ({} nonterminals, {} terminals)",
        out_path.display(),
        g.nonterminals().len(),
        g.terminals().len()
    );
    Ok(())
}
