use camino::Utf8Path;
use salsa::{Accumulator as _, Database};
pub use tessera_errors::Diagnostic;
pub use tessera_inputs::{Dialect, File};
use tessera_parse::{Language, Parser};
use tessera_tree::{SyntaxElement, Tree};
use text_size::TextRange;

#[salsa::db]
#[derive(Default, Clone)]
pub struct RootDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl Database for RootDatabase {}

pub fn language(dialect: Dialect) -> Option<Language> {
    match dialect {
        Dialect::MiniZinc => tessera_minizinc::language(),
        Dialect::DataZinc => tessera_datazinc::language(),
        Dialect::Eprime => tessera_eprime::language(),
    }
}

/// Picks the dialect of a file, from its extension or else its header.
pub fn detect_dialect(path: &Utf8Path, text: &str) -> Option<Dialect> {
    Dialect::from_path(path).or_else(|| {
        text.trim_start().starts_with("language ESSENCE").then_some(Dialect::Eprime)
    })
}

/// Parses a file with the grammar of its dialect. `None` if that grammar
/// could not be loaded.
#[salsa::tracked(returns(ref))]
pub fn parse_file(db: &dyn Database, file: File) -> Option<Tree> {
    let language = language(file.dialect(db))?;
    let _span = tracing::debug_span!("parse_file", path = %file.path(db)).entered();
    Some(Parser::new(language).parse(file.text(db), None, &[]))
}

/// Reports syntax problems of a file as accumulated [`Diagnostic`]s.
#[salsa::tracked]
pub fn check_file(db: &dyn Database, file: File) {
    let Some(tree) = parse_file(db, file) else {
        let dialect = file.dialect(db);
        tracing::warn!(%dialect, "grammar failed to load");
        Diagnostic::error(format!("Error loading {dialect} grammar"), TextRange::empty(0.into()))
            .with_label("while parsing this file")
            .accumulate(db);
        return;
    };
    if !tree.has_error() {
        return;
    }

    let text = file.text(db);
    let mut reported: Option<TextRange> = None;
    for element in tree.root_node().descendants() {
        let range = element.text_range();
        if reported.is_some_and(|reported| reported.contains_range(range)) {
            continue;
        }
        let diagnostic = if element.is_missing() {
            missing(&element, range)
        } else if element.is_error() {
            unexpected(element.utf8_text(text), range)
        } else {
            continue;
        };
        reported = Some(range);
        diagnostic.accumulate(db);
    }
}

fn missing(element: &SyntaxElement<'_>, range: TextRange) -> Diagnostic {
    let message = if element.is_named() {
        format!("missing {}", element.kind_name())
    } else {
        format!("missing `{}`", element.kind_name())
    };
    Diagnostic::error(message, range).with_label("expected here")
}

fn unexpected(source: &str, range: TextRange) -> Diagnostic {
    let source = source.trim();
    let message = if source.is_empty() {
        "unexpected end of input".to_owned()
    } else if source.len() <= 24 && !source.contains('\n') {
        format!("unexpected `{source}`")
    } else {
        "syntax error".to_owned()
    };
    Diagnostic::error(message, range)
}
