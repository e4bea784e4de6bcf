//! Accessor-expression parsing.
//!
//! An accessor is the stored source text of a lambda that returns a path
//! from its root parameter:
//!
//! ```text
//! root => root.a.b[2].c
//! (root, i) => root.a.b[i].c
//! function pick(root, i) { return root.a.b[i].c; }
//! ```
//!
//! Bracketed segments naming a declared parameter become placeholder steps,
//! resolved to concrete key/index values at call time via
//! [`Accessor::resolve`]. Parses are memoized process-wide, keyed by the
//! exact source text, so each distinct accessor literal pays the parse cost
//! once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;

use crate::{Path, PathStep};

/// Errors raised while parsing or resolving an accessor expression.
///
/// These are programming errors in the accessor literal, raised before any
/// tree work begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessorError {
    #[error("failed to parse accessor parameters: {0}")]
    Parameters(String),
    #[error("failed to parse accessor return expression: {0}")]
    ReturnExpression(String),
    #[error("unknown parameter {0:?} in accessor return expression")]
    UnknownParameter(String),
    #[error("accessor path must start from the root parameter {0:?}")]
    NotRooted(String),
    #[error("missing argument for accessor parameter placeholder {0}")]
    MissingArgument(usize),
}

/// One parsed accessor segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorStep {
    /// Literal object key.
    Key(String),
    /// Literal array index.
    Index(usize),
    /// Placeholder for the n-th extra argument (0-based, root excluded).
    Param(usize),
}

/// Extract the declared parameter names from accessor source text.
///
/// Handles `function name(a, b) { ... }`, `(a, b) => ...`, and the bare
/// single-parameter `a => ...` forms.
pub fn parse_params(source: &str) -> Result<Vec<String>, AccessorError> {
    let param_str = if source.starts_with("function") || source.starts_with('(') {
        let open = source
            .find('(')
            .ok_or_else(|| AccessorError::Parameters(source.to_string()))?;
        let rest = &source[open + 1..];
        let close = rest
            .find(')')
            .ok_or_else(|| AccessorError::Parameters(source.to_string()))?;
        &rest[..close]
    } else {
        let arrow = source
            .find("=>")
            .ok_or_else(|| AccessorError::Parameters(source.to_string()))?;
        &source[..arrow]
    };

    Ok(param_str.split(',').map(|s| s.trim().to_string()).collect())
}

/// Parse the return expression of accessor source text into steps.
///
/// `params` are the declared *extra* parameter names (the root parameter
/// excluded); bracketed segments matching one of them become
/// [`AccessorStep::Param`] with that ordinal.
pub fn parse_return_path(source: &str, params: &[String]) -> Result<Vec<AccessorStep>, AccessorError> {
    let start = match source.find("return ") {
        Some(i) => i + "return ".len(),
        None => source
            .find("=>")
            .map(|i| i + 2)
            .ok_or_else(|| AccessorError::ReturnExpression(source.to_string()))?,
    };

    let mut expr = &source[start..];
    if let Some(term) = expr.find(';').or_else(|| expr.find('\n')) {
        expr = &expr[..term];
    }
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(AccessorError::ReturnExpression(source.to_string()));
    }

    let mut steps = Vec::new();
    let mut rest = expr;
    while !rest.is_empty() {
        if let Some(open) = rest.strip_prefix('[') {
            let close = open
                .find(']')
                .ok_or_else(|| AccessorError::ReturnExpression(source.to_string()))?;
            let inner = open[..close].trim();
            if let Some(ordinal) = params.iter().position(|p| p == inner) {
                steps.push(AccessorStep::Param(ordinal));
            } else if is_integer(inner) {
                let index = inner
                    .parse()
                    .map_err(|_| AccessorError::UnknownParameter(inner.to_string()))?;
                steps.push(AccessorStep::Index(index));
            } else {
                return Err(AccessorError::UnknownParameter(inner.to_string()));
            }
            rest = &open[close + 1..];
        } else {
            let seg = rest.strip_prefix('.').unwrap_or(rest);
            let end = seg
                .find(|c| c == '.' || c == '[')
                .unwrap_or(seg.len());
            steps.push(AccessorStep::Key(seg[..end].trim().to_string()));
            rest = &seg[end..];
        }
    }

    Ok(steps)
}

/// A string is a usable index if it is all digits with no superfluous
/// leading zero.
fn is_integer(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let bytes = s.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

fn cache() -> &'static Mutex<HashMap<String, Arc<Vec<AccessorStep>>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Arc<Vec<AccessorStep>>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// A parsed accessor expression.
///
/// # Examples
///
/// ```
/// use permafrost_path::{path, Accessor, PathStep};
///
/// let acc = Accessor::parse("(root, i) => root.users[i].name").unwrap();
/// let p = acc.resolve(&[PathStep::Index(3)]).unwrap();
/// assert_eq!(p, path!["users", 3, "name"]);
/// ```
#[derive(Debug, Clone)]
pub struct Accessor {
    steps: Arc<Vec<AccessorStep>>,
}

impl Accessor {
    /// Parse accessor source text, consulting the process-wide memo cache.
    pub fn parse(source: &str) -> Result<Self, AccessorError> {
        if let Some(steps) = cache().lock().unwrap().get(source) {
            return Ok(Accessor { steps: steps.clone() });
        }

        let params = parse_params(source)?;
        let full = parse_return_path(source, &params[1..])?;
        match full.first() {
            Some(AccessorStep::Key(k)) if *k == params[0] => {}
            _ => return Err(AccessorError::NotRooted(params[0].clone())),
        }

        let steps = Arc::new(full[1..].to_vec());
        cache()
            .lock()
            .unwrap()
            .insert(source.to_string(), steps.clone());
        Ok(Accessor { steps })
    }

    /// The parsed steps, root segment stripped, placeholders included.
    pub fn steps(&self) -> &[AccessorStep] {
        &self.steps
    }

    /// Substitute placeholder steps with runtime arguments.
    ///
    /// `args` supplies one [`PathStep`] per extra accessor parameter, in
    /// declaration order.
    pub fn resolve(&self, args: &[PathStep]) -> Result<Path, AccessorError> {
        let mut path = Path::root();
        for step in self.steps.iter() {
            path.push(match step {
                AccessorStep::Key(k) => PathStep::Key(k.clone()),
                AccessorStep::Index(i) => PathStep::Index(*i),
                AccessorStep::Param(ordinal) => args
                    .get(*ordinal)
                    .cloned()
                    .ok_or(AccessorError::MissingArgument(*ordinal))?,
            });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<AccessorStep> {
        names.iter().map(|n| AccessorStep::Key(n.to_string())).collect()
    }

    #[test]
    fn params_from_various_forms() {
        assert_eq!(parse_params("o => o.a.b.c").unwrap(), vec!["o"]);
        assert_eq!(parse_params("(o, s) => o.a.b.c").unwrap(), vec!["o", "s"]);
        assert_eq!(
            parse_params("(o, s1, s2) => return o.a.b.c").unwrap(),
            vec!["o", "s1", "s2"]
        );
        assert_eq!(
            parse_params("function(o, $a) { return o.a.b.c; }").unwrap(),
            vec!["o", "$a"]
        );
        assert_eq!(
            parse_params("function foo(o, a, b) {\n  return o.a.b.c;\n}").unwrap(),
            vec!["o", "a", "b"]
        );
    }

    #[test]
    fn return_path_from_various_forms() {
        let expected = keys(&["o", "a", "b", "c"]);
        assert_eq!(parse_return_path("o => o.a.b.c", &[]).unwrap(), expected);
        assert_eq!(parse_return_path("(o, s) => o.a.b.c", &[]).unwrap(), expected);
        assert_eq!(
            parse_return_path("(o, s) => return o.a.b.c", &[]).unwrap(),
            expected
        );
        assert_eq!(
            parse_return_path("function(o) { return o.a.b.c; }", &[]).unwrap(),
            expected
        );
        assert_eq!(
            parse_return_path("function foo(o) {\n  return o.a.b.c;\n}", &[]).unwrap(),
            expected
        );
    }

    #[test]
    fn return_path_with_numeric_index() {
        assert_eq!(
            parse_return_path("o => o.a.b[1].c", &[]).unwrap(),
            vec![
                AccessorStep::Key("o".to_string()),
                AccessorStep::Key("a".to_string()),
                AccessorStep::Key("b".to_string()),
                AccessorStep::Index(1),
                AccessorStep::Key("c".to_string()),
            ]
        );
    }

    #[test]
    fn return_path_with_param_references() {
        assert_eq!(
            parse_return_path("(o, s) => o.a.b[s].c", &["s".to_string()]).unwrap(),
            vec![
                AccessorStep::Key("o".to_string()),
                AccessorStep::Key("a".to_string()),
                AccessorStep::Key("b".to_string()),
                AccessorStep::Param(0),
                AccessorStep::Key("c".to_string()),
            ]
        );
        assert_eq!(
            parse_return_path(
                "(o, $s1, $s2) => o.a[$s1].b[$s2].c",
                &["$s1".to_string(), "$s2".to_string()]
            )
            .unwrap(),
            vec![
                AccessorStep::Key("o".to_string()),
                AccessorStep::Key("a".to_string()),
                AccessorStep::Param(0),
                AccessorStep::Key("b".to_string()),
                AccessorStep::Param(1),
                AccessorStep::Key("c".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_bracket_identifier_is_an_error() {
        assert_eq!(
            parse_return_path("o => o.a[zzz]", &[]),
            Err(AccessorError::UnknownParameter("zzz".to_string()))
        );
        // Leading zeros are not valid integer indices.
        assert_eq!(
            parse_return_path("o => o.a[01]", &[]),
            Err(AccessorError::UnknownParameter("01".to_string()))
        );
    }

    #[test]
    fn accessor_must_be_rooted() {
        assert_eq!(
            Accessor::parse("o => other.a").unwrap_err(),
            AccessorError::NotRooted("o".to_string())
        );
    }

    #[test]
    fn accessor_resolves_placeholders() {
        let acc = Accessor::parse("(o, i, k) => o.a[i].b[k]").unwrap();
        let p = acc
            .resolve(&[PathStep::Index(7), PathStep::Key("x".to_string())])
            .unwrap();
        assert_eq!(p, crate::path!["a", 7, "b", "x"]);
        assert_eq!(
            acc.resolve(&[PathStep::Index(7)]),
            Err(AccessorError::MissingArgument(1))
        );
    }

    #[test]
    fn parse_is_memoized_by_source_text() {
        let a = Accessor::parse("m => m.memoized.path").unwrap();
        let b = Accessor::parse("m => m.memoized.path").unwrap();
        assert!(Arc::ptr_eq(&a.steps, &b.steps));
    }
}
