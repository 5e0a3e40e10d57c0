//! Command-line interface for llkit-calc.
//!
//! Evaluates the expression given as an argument, or every non-empty line
//! of standard input when there is none.

use anyhow::Result;
use clap::Parser as ClapParser;
use llkit_calc::Calculator;
use std::io::BufRead;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Expression to evaluate; read lines from stdin when omitted
    expr: Option<String>,

    /// Variable binding `name=value`, may be repeated
    #[arg(short = 'v', long = "var", value_parser = parse_binding)]
    vars: Vec<(String, i64)>,
}

fn parse_binding(s: &str) -> Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", s))?;
    let value = value.trim().parse().map_err(|e| format!("{}: {}", value, e))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let calc = Calculator::with_vars(args.vars.iter().map(|(k, v)| (k.as_str(), *v)));

    if let Some(expr) = args.expr {
        println!("{}", calc.eval(&expr)?);
        return Ok(());
    }

    let mut failed = false;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match calc.eval(&line) {
            Ok(n) => println!("{}", n),
            Err(e) => {
                eprintln!("error: {}", e);
                failed = true;
            }
        }
    }
    if failed {
        anyhow::bail!("some expressions failed");
    }
    Ok(())
}
