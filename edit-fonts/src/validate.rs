//! The optional validation pass
//!
//! Some relationships between tables, such as the glyph count in `maxp`
//! matching the number of `loca` entries, are the caller's responsibility
//! and are never checked while updating or writing. Validation reports such
//! problems on request.

use std::fmt::{Debug, Display};

/// Validation of a single table.
pub trait Validate {
    /// Ensure that this table is well-formed, reporting any errors.
    fn validate(&self) -> Result<(), ValidationReport> {
        let mut ctx = ValidationCtx::default();
        self.validate_impl(&mut ctx);
        ctx.into_result()
    }

    /// Validate this table, reporting errors to `ctx`.
    fn validate_impl(&self, ctx: &mut ValidationCtx);
}

/// A context for collecting validation errors.
///
/// This tracks the location at which a given error is reported, via calls to
/// methods like [in_table][Self::in_table] and [in_field][Self::in_field].
#[derive(Clone, Debug, Default)]
pub struct ValidationCtx {
    cur_location: Vec<LocationElem>,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
struct ValidationError {
    error: String,
    location: Vec<LocationElem>,
}

/// One or more validation errors.
#[derive(Clone)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
enum LocationElem {
    Table(&'static str),
    Field(&'static str),
    Index(usize),
}

impl ValidationCtx {
    /// Run the provided closure in the context of a new table.
    pub fn in_table(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.with_elem(LocationElem::Table(name), f);
    }

    /// Run the provided closure in the context of a new field.
    pub fn in_field(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.with_elem(LocationElem::Field(name), f);
    }

    /// Run the provided closure in the context of an array item.
    pub fn in_index(&mut self, index: usize, f: impl FnOnce(&mut ValidationCtx)) {
        self.with_elem(LocationElem::Index(index), f);
    }

    /// Report a new error, associating it with the current path.
    pub fn report(&mut self, msg: impl Display) {
        self.errors.push(ValidationError {
            location: self.cur_location.clone(),
            error: msg.to_string(),
        });
    }

    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport {
                errors: self.errors,
            })
        }
    }

    fn with_elem(&mut self, elem: LocationElem, f: impl FnOnce(&mut ValidationCtx)) {
        self.cur_location.push(elem);
        f(self);
        self.cur_location.pop();
    }
}

impl ValidationReport {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The messages of all errors, without their locations.
    pub fn messages(&self) -> impl Iterator<Item = &str> + '_ {
        self.errors.iter().map(|e| e.error.as_str())
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let [error] = self.errors.as_slice() {
            return write!(f, "Validation error:\n{error}");
        }

        writeln!(f, "{} validation errors:", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "#{}\n{error}", i + 1)?;
        }
        Ok(())
    }
}

impl Debug for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl std::error::Error for ValidationReport {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\"{}\"", self.error)?;
        if self.location.is_empty() {
            return Ok(());
        }
        f.write_str("in: ")?;
        for (i, elem) in self.location.iter().enumerate() {
            match elem {
                LocationElem::Table(name) if i == 0 => write!(f, "{name}"),
                LocationElem::Table(name) => write!(f, "/{name}"),
                LocationElem::Field(name) => write!(f, ".{name}"),
                LocationElem::Index(idx) => write!(f, "[{idx}]"),
            }?;
        }
        writeln!(f)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        for (i, item) in self.iter().enumerate() {
            ctx.in_index(i, |ctx| item.validate_impl(ctx));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        values: Vec<u16>,
    }

    impl Validate for Record {
        fn validate_impl(&self, ctx: &mut ValidationCtx) {
            ctx.in_table("Record", |ctx| {
                ctx.in_field("values", |ctx| {
                    if self.values.is_empty() {
                        ctx.report("must not be empty");
                    }
                })
            })
        }
    }

    #[test]
    fn reports_location() {
        let records = vec![Record { values: vec![1] }, Record { values: vec![] }];
        let report = records.validate().unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.to_string(),
            "Validation error:\n\"must not be empty\"\nin: [1]/Record.values\n"
        );
    }

    #[test]
    fn valid_is_ok() {
        assert!(Record { values: vec![2] }.validate().is_ok());
    }
}
