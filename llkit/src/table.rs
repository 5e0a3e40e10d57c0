//! Human-readable renderings of a converted grammar.
//!
//! The analyze-table grid has one header line naming the columns (terminal
//! names, then `$` for end-of-input) and one line per nonterminal with the
//! production index chosen in each column, or `.` for an empty cell:
//!
//! ```text
//! TABLE plus num $
//! E     .    0   .
//! E'    0    .   1
//! ```
//!
//! [`Grid::parse`] reads that text back into the same structure
//! [`Grid::from_grammar`] builds directly.

use crate::LlError;
use crate::convert::LlGrammar;
use crate::grammar::{FirstSet, FollowSet, NonterminalId};
use smartstring::alias::String;
use std::fmt::Write as _;
use std::io::{self, Write};

const CORNER: &str = "TABLE";
const END: &str = "$";
const EMPTY: &str = ".";

/// Analyze tables as plain data: row names, column names and cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<Option<usize>>)>,
}

impl Grid {
    pub fn from_grammar(g: &LlGrammar) -> Self {
        let mut columns: Vec<String> = g.terminals().iter().map(|t| t.name.clone()).collect();
        columns.push(END.into());
        let rows = g
            .nonterminals()
            .iter()
            .map(|n| (n.name.clone(), n.table.clone()))
            .collect();
        Self { columns, rows }
    }

    pub fn parse(text: &str) -> Result<Self, LlError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());
        let Some((line, header)) = lines.next() else {
            return Err(grid_error(0, "no header line"));
        };
        let mut words = header.split_whitespace();
        if words.next() != Some(CORNER) {
            return Err(grid_error(line, "header must start with TABLE"));
        }
        let columns: Vec<String> = words.map(String::from).collect();
        if columns.last().map(|c| c.as_str()) != Some(END) {
            return Err(grid_error(line, "last column must be $"));
        }

        let mut rows = Vec::new();
        for (line, text) in lines {
            let mut words = text.split_whitespace();
            let Some(name) = words.next() else {
                continue;
            };
            let cells = words
                .map(|w| match w {
                    EMPTY => Ok(None),
                    n => n
                        .parse::<usize>()
                        .map(Some)
                        .map_err(|_| grid_error(line, &format!("bad cell {:?}", n))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if cells.len() != columns.len() {
                return Err(grid_error(
                    line,
                    &format!("row {} has {} cells, expected {}", name, cells.len(), columns.len()),
                ));
            }
            rows.push((String::from(name), cells));
        }
        Ok(Self { columns, rows })
    }
}

fn grid_error(line: usize, message: &str) -> LlError {
    LlError::Grid {
        line: line + 1,
        message: message.into(),
    }
}

/// Render every analyze table as an aligned grid.
pub fn render_grid(g: &LlGrammar) -> std::string::String {
    let grid = Grid::from_grammar(g);
    let first_width = grid
        .rows
        .iter()
        .map(|(name, _)| name.len())
        .chain([CORNER.len()])
        .max()
        .unwrap_or(0);
    let cell = |c: &Option<usize>| c.map_or(EMPTY.into(), |i| i.to_string());
    let widths: Vec<usize> = grid
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            grid.rows
                .iter()
                .map(|(_, cells)| cell(&cells[i]).len())
                .chain([name.len()])
                .max()
                .unwrap_or(1)
        })
        .collect();

    let mut out = std::string::String::new();
    let mut line = std::string::String::new();
    let _ = write!(line, "{:<first_width$}", CORNER);
    for (name, &w) in grid.columns.iter().zip(&widths) {
        let _ = write!(line, " {:<w$}", name.as_str());
    }
    out.push_str(line.trim_end());
    out.push('\n');
    for (name, cells) in &grid.rows {
        line.clear();
        let _ = write!(line, "{:<first_width$}", name.as_str());
        for (c, &w) in cells.iter().zip(&widths) {
            let _ = write!(line, " {:<w$}", cell(c));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Writes every production, numbered per nonterminal:
///
/// ```text
/// P,<lhs>,<index>,<lhs> -> <rhs symbols> {actions}
/// ```
pub fn write_prods<W: Write>(out: &mut W, g: &LlGrammar) -> io::Result<()> {
    let total: usize = g.nonterminals().iter().map(|n| n.productions.len()).sum();
    writeln!(out, "PS,{}\n", total)?;
    for (i, n) in g.nonterminals().iter().enumerate() {
        for p in 0..n.productions.len() {
            writeln!(
                out,
                "P,{},{},{}",
                n.name,
                p,
                g.production_string(NonterminalId(i), p)
            )?;
        }
    }
    Ok(())
}

fn write_set<W: Write>(
    out: &mut W,
    g: &LlGrammar,
    label: &str,
    name: &str,
    terms: impl Iterator<Item = usize>,
    flag: Option<&str>,
) -> io::Result<()> {
    write!(out, "{},{},{{", label, name)?;
    if let Some(flag) = flag {
        write!(out, "{}, ", flag)?;
    }
    for t in terms {
        write!(out, "{}, ", g.column_name(t))?;
    }
    writeln!(out, "}}")
}

/// Writes FIRST then FOLLOW sets of every nonterminal, with `` `empty' ``
/// marking nullable ones and `$` marking end-of-input.
pub fn write_first_follow<W: Write>(out: &mut W, g: &LlGrammar) -> io::Result<()> {
    for n in g.nonterminals() {
        let FirstSet { terms, empty } = &n.first;
        let flag = empty.then_some("`empty'");
        write_set(out, g, "FIRST", &n.name, terms.iter().map(|t| t.0), flag)?;
    }
    writeln!(out)?;
    for n in g.nonterminals() {
        let FollowSet { terms, end } = &n.follow;
        let flag = end.then_some(END);
        write_set(out, g, "FOLLOW", &n.name, terms.iter().map(|t| t.0), flag)?;
    }
    Ok(())
}

pub fn write_table<W: Write>(out: &mut W, g: &LlGrammar) -> io::Result<()> {
    out.write_all(render_grid(g).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert;
    use crate::grammar::{GrammarBuilder, Item};

    fn sum_grammar() -> LlGrammar {
        let mut b = GrammarBuilder::new();
        b.terminal("plus", "+", "+")
            .terminal("num", "number", "0-9")
            .production("E", [Item::sym("E"), Item::sym("plus"), Item::sym("num")])
            .production("E", [Item::sym("num")]);
        convert(b.build().unwrap()).unwrap()
    }

    #[test]
    fn grid_layout() {
        let text = render_grid(&sum_grammar());
        assert_eq!(text, "TABLE plus num $\nE     .    0   .\nE'    0    .   1\n");
    }

    #[test]
    fn grid_round_trip() {
        let g = sum_grammar();
        let parsed = Grid::parse(&render_grid(&g)).unwrap();
        assert_eq!(parsed, Grid::from_grammar(&g));
        assert_eq!(parsed.rows[1].1, vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn malformed_grids_are_rejected() {
        assert!(matches!(Grid::parse(""), Err(LlError::Grid { line: 1, .. })));
        assert!(matches!(
            Grid::parse("ROWS a $\n"),
            Err(LlError::Grid { line: 1, .. })
        ));
        assert!(matches!(
            Grid::parse("TABLE a $\nS 0\n"),
            Err(LlError::Grid { line: 2, .. })
        ));
        assert!(matches!(
            Grid::parse("TABLE a $\nS x .\n"),
            Err(LlError::Grid { line: 2, .. })
        ));
    }

    #[test]
    fn report_writers() {
        let g = sum_grammar();
        let mut out = Vec::new();
        write_prods(&mut out, &g).unwrap();
        write_first_follow(&mut out, &g).unwrap();
        let text = std::string::String::from_utf8(out).unwrap();
        assert!(text.starts_with("PS,3\n"));
        assert!(text.contains("P,E',0,E' -> plus num E'\n"));
        assert!(text.contains("FIRST,E',{`empty', plus, }\n"));
        assert!(text.contains("FOLLOW,E,{$, }\n"));
    }
}
