use llkit::{Evaluator, FunctionTable, Value, VecTokens, convert};
use std::path::PathBuf;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const LIST: &str = r#"
-- comma separated list, collected left to right
%term num "number" "0-9"
%term comma "," ","
%term lb "[" "\["
%term rb "]" "\]"

List -> lb Items rb {$.v = $1.v}
Items -> Items comma num {$.v = push($0.v, $2.text)}
Items -> num {$.v = push(null, $0.text)}
"#;

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("llgen-{}-{}", std::process::id(), name))
}

#[test]
fn loaded_grammar_evaluates() {
    init_logger();
    let g = convert(llkit_gen::load(LIST).unwrap()).unwrap();
    let mut f = FunctionTable::new();
    f.register("push", |a: &[Value]| {
        let mut items = match &a[0] {
            Value::List(items) => items.clone(),
            Value::Null => Vec::new(),
            other => return Err(format!("not a list: {}", other)),
        };
        items.push(a[1].clone());
        Ok(Value::List(items))
    });
    let id = |name| g.terminal_id(name).unwrap();
    let tokens = VecTokens::from_texts([
        (id("lb"), "["),
        (id("num"), "1"),
        (id("comma"), ","),
        (id("num"), "2"),
        (id("comma"), ","),
        (id("num"), "3"),
        (id("rb"), "]"),
    ]);
    let ns = Evaluator::new(&g, &f).parse(tokens).unwrap();
    assert_eq!(
        ns.get("v"),
        Some(&Value::List(vec!["1".into(), "2".into(), "3".into()]))
    );
}

#[test]
fn generate_writes_report() {
    init_logger();
    let input = scratch("list.llg");
    let output = scratch("list.txt");
    std::fs::write(&input, LIST).unwrap();
    llkit_gen::generate(&input, &output).unwrap();
    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.contains("P,List,0,List -> lb Items rb"));
    assert!(report.contains("FOLLOW,Items,{rb, }"));
    let header = report.lines().find(|l| l.starts_with("TABLE")).unwrap();
    assert_eq!(
        header.split_whitespace().collect::<Vec<_>>(),
        ["TABLE", "num", "comma", "lb", "rb", "$"]
    );
    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&output);
}

#[test]
fn generate_reports_conflicts() {
    let input = scratch("ambiguous.llg");
    let output = scratch("ambiguous.txt");
    std::fs::write(&input, "%term a \"a\" \"a\"\nS -> a\nS -> a a\n").unwrap();
    let err = llkit_gen::generate(&input, &output).unwrap_err();
    assert!(format!("{:#}", err).contains("LL(1)"), "{:#}", err);
    let _ = std::fs::remove_file(&input);
}

#[test]
fn missing_file_names_the_path() {
    let err = llkit_gen::load_file(scratch("does-not-exist.llg")).unwrap_err();
    assert!(err.to_string().contains("does-not-exist.llg"));
}
