//! Expressions that derive values from bindings.
//!
//! A gate names its inputs and describes small transformations over them
//! (projecting a field out of every record, filtering records, summing).
//! Assertions compare the results.

use crate::value::Value;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A binding by name.
    Ref(String),
    Lit(Value),
    /// One field of a tuple (or element of a sequence).
    Field { of: Box<Expr>, index: usize },
    /// A nested field, following `path` one index at a time.
    Path { of: Box<Expr>, path: Vec<usize> },
    /// Maps every record of a sequence to the nested field at `path`.
    Pluck { of: Box<Expr>, path: Vec<usize> },
    /// Keeps the records whose nested field at `path` equals `equals`.
    Where {
        of: Box<Expr>,
        path: Vec<usize>,
        equals: Box<Expr>,
    },
    /// Total of a sequence of amounts, or of the amount at `path` in each record.
    Sum {
        of: Box<Expr>,
        #[serde(default)]
        path: Vec<usize>,
    },
    Len(Box<Expr>),
    Add(Vec<Expr>),
    Sub(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn reference(name: &str) -> Self {
        Expr::Ref(name.to_string())
    }

    pub fn field(of: Expr, index: usize) -> Self {
        Expr::Field { of: Box::new(of), index }
    }

    pub fn sum(of: Expr, path: &[usize]) -> Self {
        Expr::Sum { of: Box::new(of), path: path.to_vec() }
    }

    /// Every binding name this expression reads.
    pub fn references(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Ref(name) => {
                names.insert(name.as_str());
            }
            Expr::Lit(_) => {}
            Expr::Field { of, .. } | Expr::Path { of, .. } | Expr::Pluck { of, .. } => {
                of.collect_references(names)
            }
            Expr::Sum { of, .. } | Expr::Len(of) => of.collect_references(names),
            Expr::Where { of, equals, .. } => {
                of.collect_references(names);
                equals.collect_references(names);
            }
            Expr::Add(terms) => terms.iter().for_each(|t| t.collect_references(names)),
            Expr::Sub(lhs, rhs) => {
                lhs.collect_references(names);
                rhs.collect_references(names);
            }
        }
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &[usize]) -> fmt::Result {
    path.iter().try_for_each(|i| write!(f, "[{}]", i))
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ref(name) => f.write_str(name),
            Expr::Lit(v) => write!(f, "{}", v),
            Expr::Field { of, index } => write!(f, "{}[{}]", of, index),
            Expr::Path { of, path } => {
                write!(f, "{}", of)?;
                write_path(f, path)
            }
            Expr::Pluck { of, path } => {
                write!(f, "{}[*]", of)?;
                write_path(f, path)
            }
            Expr::Where { of, path, equals } => {
                write!(f, "{}[?", of)?;
                write_path(f, path)?;
                write!(f, " == {}]", equals)
            }
            Expr::Sum { of, path } => {
                write!(f, "sum({}", of)?;
                if !path.is_empty() {
                    f.write_str("[*]")?;
                    write_path(f, path)?;
                }
                f.write_str(")")
            }
            Expr::Len(of) => write!(f, "len({})", of),
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{}", term)?;
                }
                Ok(())
            }
            Expr::Sub(lhs, rhs) => write!(f, "{} - {}", lhs, rhs),
        }
    }
}
