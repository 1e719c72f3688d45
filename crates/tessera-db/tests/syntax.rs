use camino::Utf8Path;
use salsa::Setter as _;
use tessera_db::{Diagnostic, Dialect, File, RootDatabase, check_file, detect_dialect, parse_file};

/// A diagnostic reduced to its line and message.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Reported {
    line: usize,
    message: String,
}

/// Expectations are comments on the offending line: `%~ ERROR message` in
/// MiniZinc and DataZinc, `$~ ERROR message` in Essence'.
fn expectations(fixture: &str) -> Vec<Reported> {
    fixture
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let (_, comment) = line.split_once("%~").or_else(|| line.split_once("$~"))?;
            let comment = comment.trim();
            let message = comment.strip_prefix("ERROR").unwrap_or(comment).trim();
            (!message.is_empty()).then(|| Reported { line: idx + 1, message: message.to_owned() })
        })
        .collect()
}

fn reported(db: &RootDatabase, file: File) -> Vec<Reported> {
    let line_index = file.line_index(db);
    let mut reported = check_file::accumulated::<Diagnostic>(db, file)
        .into_iter()
        .map(|diagnostic| Reported {
            line: line_index.line_col(diagnostic.range().start()).line as usize + 1,
            message: diagnostic.message().to_owned(),
        })
        .collect::<Vec<_>>();
    reported.sort();
    reported
}

#[track_caller]
fn check(dialect: Dialect, fixture: &str) {
    let db = RootDatabase::default();
    let file = File::new(&db, "fixture".into(), fixture.to_owned(), dialect);

    let mut actual = reported(&db, file);
    let expected = expectations(fixture);
    assert_eq!(
        expected.len(),
        actual.len(),
        "diagnostic count differs\nexpected: {expected:#?}\nactual: {actual:#?}"
    );

    for expectation in &expected {
        let position = actual.iter().position(|diagnostic| {
            diagnostic.line == expectation.line && diagnostic.message.contains(&expectation.message)
        });
        let Some(position) = position else {
            panic!("no diagnostic matches {expectation:?}\nactual: {actual:#?}");
        };
        actual.remove(position);
    }
}

#[test]
fn clean_model() {
    check(
        Dialect::MiniZinc,
        r#"
int: n = 4;
array[1..n] of var 1..n: q;
constraint forall(i in 1..n)(q[i] != i);
solve satisfy;
"#,
    );
}

#[test]
fn unmatched_parenthesis() {
    check(
        Dialect::MiniZinc,
        r#"
int: n = 3;
constraint n > 1); %~ ERROR unexpected `)`
solve satisfy;
"#,
    );
}

#[test]
fn eprime_unmatched_parenthesis() {
    check(
        Dialect::Eprime,
        r#"
given n : int(1..)
such that n > 2) $~ ERROR unexpected `)`
"#,
    );
}

#[test]
fn model_items_in_a_data_file() {
    let db = RootDatabase::default();
    let file = File::new(&db, "data.dzn".into(), "n = 3;\nconstraint n > 1;\n".to_owned(), Dialect::DataZinc);

    let diagnostics = check_file::accumulated::<Diagnostic>(&db, file);
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|diag| u32::from(diag.range().start()) >= 6));
}

#[test]
fn diagnostics_follow_edits() {
    let mut db = RootDatabase::default();
    let file = File::new(&db, "model.mzn".into(), "int: n = (3;\n".to_owned(), Dialect::MiniZinc);
    assert!(!check_file::accumulated::<Diagnostic>(&db, file).is_empty());

    file.set_text(&mut db).to("int: n = (3);\n".to_owned());
    assert!(check_file::accumulated::<Diagnostic>(&db, file).is_empty());
    let tree = parse_file(&db, file).as_ref().unwrap();
    assert!(!tree.has_error());
}

#[test]
fn dialect_detection() {
    let detect = |path: &str, text: &str| detect_dialect(Utf8Path::new(path), text);
    assert_eq!(detect("queens.mzn", ""), Some(Dialect::MiniZinc));
    assert_eq!(detect("queens.dzn", "language ESSENCE' 1.0"), Some(Dialect::DataZinc));
    assert_eq!(detect("model", "\n  language ESSENCE' 1.3\nfind x : bool\n"), Some(Dialect::Eprime));
    assert_eq!(detect("notes.txt", "int: n;"), None);
}
