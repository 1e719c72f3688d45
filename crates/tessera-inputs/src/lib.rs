use std::fmt;

use camino::Utf8Path;
pub use line_index::LineIndex;


/// The modelling language a file is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    MiniZinc,
    DataZinc,
    Eprime,
}

impl Dialect {
    pub const ALL: [Self; 3] = [Self::MiniZinc, Self::DataZinc, Self::Eprime];

    /// Guesses the dialect from a file extension. Essence' parameter files
    /// (`.param`) use the model syntax.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()? {
            "mzn" => Some(Self::MiniZinc),
            "dzn" => Some(Self::DataZinc),
            "eprime" | "param" => Some(Self::Eprime),
            _ => None,
        }
    }

    /// The grammar name, as used in load failure messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::MiniZinc => "Minizinc",
            Self::DataZinc => "Datazinc",
            Self::Eprime => "Eprime",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[salsa::input(debug)]
pub struct File {
    #[returns(ref)]
    pub path: camino::Utf8PathBuf,
    #[returns(deref)]
    pub text: String,
    pub dialect: Dialect,
}

#[salsa::tracked]
impl File {
    #[salsa::tracked(returns(ref), no_eq)]
    pub fn line_index(self, db: &dyn salsa::Database) -> LineIndex {
        LineIndex::new(self.text(db))
    }
}
