use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::{Args, Parser, ValueEnum};
use tessera_db::{Diagnostic, Dialect, File, RootDatabase, check_file, detect_dialect, parse_file};
use tessera_errors::Renderer;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(version)]
enum Options {
    /// Print the syntax tree of a file as an s-expression.
    Parse(Input),
    /// Report the syntax errors of a file.
    Check(Input),
}

#[derive(Args)]
struct Input {
    path: Utf8PathBuf,
    /// Defaults to the one implied by the file extension.
    #[arg(long, value_enum)]
    dialect: Option<DialectArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Mzn,
    Dzn,
    Eprime,
}

impl From<DialectArg> for Dialect {
    fn from(dialect: DialectArg) -> Self {
        match dialect {
            DialectArg::Mzn => Self::MiniZinc,
            DialectArg::Dzn => Self::DataZinc,
            DialectArg::Eprime => Self::Eprime,
        }
    }
}

impl Input {
    fn load(self, db: &RootDatabase) -> anyhow::Result<File> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read `{}`", self.path))?;
        let dialect = match self.dialect {
            Some(dialect) => dialect.into(),
            None => detect_dialect(&self.path, &text).with_context(|| {
                format!("cannot tell the dialect of `{}`, pass `--dialect`", self.path)
            })?,
        };
        tracing::debug!(path = %self.path, %dialect, "loaded file");
        Ok(File::new(db, self.path, text, dialect))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let db = RootDatabase::default();
    match Options::parse() {
        Options::Parse(input) => {
            let file = input.load(&db)?;
            let tree = parse_file(&db, file)
                .as_ref()
                .with_context(|| format!("failed to load the {} grammar", file.dialect(&db)))?;
            println!("{}", tree.to_sexp());
            Ok(())
        }
        Options::Check(input) => {
            let file = input.load(&db)?;
            let diagnostics = check_file::accumulated::<Diagnostic>(&db, file);

            let renderer = Renderer::styled();
            let path = file.path(&db).as_str();
            let text = file.text(&db);
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic.render(&renderer, path, text));
            }

            let errors = diagnostics.len();
            if errors > 0 {
                bail!("found {errors} syntax error(s) in `{path}`");
            }
            Ok(())
        }
    }
}
