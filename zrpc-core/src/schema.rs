// MIT License
// Copyright 2023--present zrpc developers

//! Validation schemas.
//!
//! A [`Schema`] describes the accepted shape of one value. The RPC layer needs
//! three things from it:
//!
//! 1. **Classification**: [`Schema::kind`] folds every variant into the closed
//!    set [`SchemaKind`] (object, string, number, boolean, other). The IDL
//!    generator maps that set onto wire scalars.
//! 2. **Field enumeration**: [`Schema::fields`] yields the `(name, schema)`
//!    pairs of an object schema in declaration order. That order defines the
//!    wire field numbers.
//! 3. **Parsing**: [`Schema::parse`] checks a JSON value and returns either the
//!    validated value (unknown object keys stripped, absent optional fields
//!    omitted) or a [`ValidationError`] listing every [`Issue`] found.
//!
//! ```
//! use serde_json::json;
//! use zrpc_core::schema::Schema;
//!
//! let schema = Schema::object([("name", Schema::string().min_len(1))]);
//! assert!(schema.parse(&json!({ "name": "Barrackpore" })).is_ok());
//!
//! let err = schema.parse(&json!({ "name": 12345 })).unwrap_err();
//! assert_eq!(err.issues()[0].path, vec!["name".to_string()]);
//! ```

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// A validation schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String(StringChecks),
    Number(NumberChecks),
    Boolean,
    /// Fixed, ordered set of named fields.
    Object(Vec<(String, Schema)>),
    Array(Box<Schema>),
    /// One of a fixed set of string literals.
    Enum(Vec<String>),
    /// Accepts a missing value or `null` in addition to the inner schema.
    Optional(Box<Schema>),
    /// First matching variant wins.
    Union(Vec<Schema>),
    /// Accepts any value unchanged.
    Any,
}

/// Refinements applied to string schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringChecks {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub email: bool,
}

/// Refinements applied to number schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberChecks {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub int: bool,
}

/// Closed classification of schema nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Object,
    String,
    Number,
    Boolean,
    /// Arrays, enums, optionals, unions and `Any`.
    Other,
}

impl Schema {
    pub fn string() -> Self {
        Schema::String(StringChecks::default())
    }

    pub fn number() -> Self {
        Schema::Number(NumberChecks::default())
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn any() -> Self {
        Schema::Any
    }

    /// Object schema; field order is preserved.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object(
            fields
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        )
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn union<I>(variants: I) -> Self
    where
        I: IntoIterator<Item = Schema>,
    {
        Schema::Union(variants.into_iter().collect())
    }

    /// Wrap this schema so that a missing value (or `null`) is accepted.
    pub fn optional(self) -> Self {
        Schema::Optional(Box::new(self))
    }

    /// Minimum string length in characters. Ignored on non-string schemas.
    pub fn min_len(mut self, len: usize) -> Self {
        if let Schema::String(checks) = &mut self {
            checks.min_len = Some(len);
        }
        self
    }

    /// Maximum string length in characters. Ignored on non-string schemas.
    pub fn max_len(mut self, len: usize) -> Self {
        if let Schema::String(checks) = &mut self {
            checks.max_len = Some(len);
        }
        self
    }

    /// Require a plausible e-mail address. Ignored on non-string schemas.
    pub fn email(mut self) -> Self {
        if let Schema::String(checks) = &mut self {
            checks.email = true;
        }
        self
    }

    /// Inclusive lower bound. Ignored on non-number schemas.
    pub fn min(mut self, min: f64) -> Self {
        if let Schema::Number(checks) = &mut self {
            checks.min = Some(min);
        }
        self
    }

    /// Inclusive upper bound. Ignored on non-number schemas.
    pub fn max(mut self, max: f64) -> Self {
        if let Schema::Number(checks) = &mut self {
            checks.max = Some(max);
        }
        self
    }

    /// Require an integral value. Ignored on non-number schemas.
    pub fn int(mut self) -> Self {
        if let Schema::Number(checks) = &mut self {
            checks.int = true;
        }
        self
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Object(_) => SchemaKind::Object,
            Schema::String(_) => SchemaKind::String,
            Schema::Number(_) => SchemaKind::Number,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Array(_)
            | Schema::Enum(_)
            | Schema::Optional(_)
            | Schema::Union(_)
            | Schema::Any => SchemaKind::Other,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Schema::Object(_))
    }

    /// Named fields in declaration order, or `None` for non-object schemas.
    pub fn fields(&self) -> Option<impl Iterator<Item = (&str, &Schema)>> {
        match self {
            Schema::Object(fields) => Some(
                fields
                    .iter()
                    .map(|(name, schema)| (name.as_str(), schema)),
            ),
            _ => None,
        }
    }

    /// Validate `value`, returning the validated value or every issue found.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut path = Vec::new();
        let mut issues = Vec::new();
        let parsed = self.check(Some(value), &mut path, &mut issues);
        if issues.is_empty() {
            Ok(parsed.unwrap_or(Value::Null))
        } else {
            Err(ValidationError { issues })
        }
    }

    /// `None` in and out means "absent".
    fn check(
        &self,
        value: Option<&Value>,
        path: &mut Vec<String>,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        if let Schema::Optional(inner) = self {
            return match value {
                None | Some(Value::Null) => None,
                Some(_) => inner.check(value, path, issues),
            };
        }

        let Some(value) = value else {
            issues.push(Issue::new(IssueCode::Required, path, "Required"));
            return None;
        };

        match self {
            Schema::String(checks) => {
                let Value::String(s) = value else {
                    issues.push(invalid_type("string", value, path));
                    return None;
                };
                checks.check(s, path, issues);
                Some(value.clone())
            }
            Schema::Number(checks) => {
                let Some(n) = value.as_f64() else {
                    issues.push(invalid_type("number", value, path));
                    return None;
                };
                checks.check(n, path, issues);
                Some(value.clone())
            }
            Schema::Boolean => {
                if value.is_boolean() {
                    Some(value.clone())
                } else {
                    issues.push(invalid_type("boolean", value, path));
                    None
                }
            }
            Schema::Object(fields) => {
                let Value::Object(map) = value else {
                    issues.push(invalid_type("object", value, path));
                    return None;
                };
                let mut out = Map::new();
                for (name, schema) in fields {
                    path.push(name.clone());
                    if let Some(v) = schema.check(map.get(name), path, issues) {
                        out.insert(name.clone(), v);
                    }
                    path.pop();
                }
                Some(Value::Object(out))
            }
            Schema::Array(items) => {
                let Value::Array(values) = value else {
                    issues.push(invalid_type("array", value, path));
                    return None;
                };
                let mut out = Vec::with_capacity(values.len());
                for (i, v) in values.iter().enumerate() {
                    path.push(i.to_string());
                    out.push(items.check(Some(v), path, issues).unwrap_or(Value::Null));
                    path.pop();
                }
                Some(Value::Array(out))
            }
            Schema::Enum(options) => match value {
                Value::String(s) if options.iter().any(|o| o == s) => Some(value.clone()),
                _ => {
                    let expected = options
                        .iter()
                        .map(|o| format!("'{o}'"))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    issues.push(Issue::new(
                        IssueCode::InvalidEnumValue,
                        path,
                        format!("Invalid enum value. Expected {expected}, received {value}"),
                    ));
                    None
                }
            },
            Schema::Union(variants) => {
                for variant in variants {
                    let mut scratch = Vec::new();
                    let parsed = variant.check(Some(value), path, &mut scratch);
                    if scratch.is_empty() {
                        return parsed;
                    }
                }
                issues.push(Issue::new(IssueCode::InvalidUnion, path, "Invalid input"));
                None
            }
            Schema::Any => Some(value.clone()),
            Schema::Optional(inner) => inner.check(Some(value), path, issues),
        }
    }
}

impl StringChecks {
    fn check(&self, s: &str, path: &[String], issues: &mut Vec<Issue>) {
        let len = s.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                issues.push(Issue::new(
                    IssueCode::TooSmall,
                    path,
                    format!("String must contain at least {min} character(s)"),
                ));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                issues.push(Issue::new(
                    IssueCode::TooBig,
                    path,
                    format!("String must contain at most {max} character(s)"),
                ));
            }
        }
        if self.email && !looks_like_email(s) {
            issues.push(Issue::new(IssueCode::InvalidString, path, "Invalid email"));
        }
    }
}

impl NumberChecks {
    fn check(&self, n: f64, path: &[String], issues: &mut Vec<Issue>) {
        if self.int && n.fract() != 0.0 {
            issues.push(Issue::new(
                IssueCode::NotInteger,
                path,
                "Expected integer, received float",
            ));
        }
        if let Some(min) = self.min {
            if n < min {
                issues.push(Issue::new(
                    IssueCode::TooSmall,
                    path,
                    format!("Number must be greater than or equal to {min}"),
                ));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                issues.push(Issue::new(
                    IssueCode::TooBig,
                    path,
                    format!("Number must be less than or equal to {max}"),
                ));
            }
        }
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_type(expected: &str, value: &Value, path: &[String]) -> Issue {
    Issue::new(
        IssueCode::InvalidType,
        path,
        format!("Expected {expected}, received {}", type_name(value)),
    )
}

/// Category of a validation [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    InvalidType,
    Required,
    TooSmall,
    TooBig,
    InvalidString,
    InvalidEnumValue,
    InvalidUnion,
    NotInteger,
}

/// One field-level complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub code: IssueCode,
    /// Object keys and array indices leading to the offending value.
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    fn new(code: IssueCode, path: &[String], message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// Structured failure returned by [`Schema::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issue messages joined with `", "`, without paths.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hello_request() -> Schema {
        Schema::object([("name", Schema::string())])
    }

    #[test]
    fn kinds_are_closed_over_variants() {
        assert_eq!(hello_request().kind(), SchemaKind::Object);
        assert_eq!(Schema::string().kind(), SchemaKind::String);
        assert_eq!(Schema::number().int().kind(), SchemaKind::Number);
        assert_eq!(Schema::boolean().kind(), SchemaKind::Boolean);
        assert_eq!(Schema::array(Schema::string()).kind(), SchemaKind::Other);
        assert_eq!(Schema::enumeration(["a", "b"]).kind(), SchemaKind::Other);
        assert_eq!(Schema::string().optional().kind(), SchemaKind::Other);
        assert_eq!(
            Schema::union([Schema::string(), Schema::number()]).kind(),
            SchemaKind::Other
        );
        assert_eq!(Schema::any().kind(), SchemaKind::Other);
    }

    #[test]
    fn fields_keep_declaration_order() {
        let schema = Schema::object([
            ("zeta", Schema::string()),
            ("alpha", Schema::number()),
            ("mid", Schema::boolean()),
        ]);
        let names: Vec<_> = schema.fields().unwrap().map(|(n, _)| n).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(Schema::string().fields().is_none());
    }

    #[test]
    fn valid_object_passes_through() {
        let value = json!({ "name": "Barrackpore" });
        assert_eq!(hello_request().parse(&value).unwrap(), value);
    }

    #[test]
    fn wrong_type_reports_field_path() {
        let err = hello_request().parse(&json!({ "name": 12345 })).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        let issue = &err.issues()[0];
        assert_eq!(issue.code, IssueCode::InvalidType);
        assert_eq!(issue.path, vec!["name".to_string()]);
        assert_eq!(issue.message, "Expected string, received number");
    }

    #[test]
    fn missing_field_is_required() {
        let err = hello_request().parse(&json!({})).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::Required);
        assert_eq!(err.summary(), "Required");
    }

    #[test]
    fn unknown_keys_are_stripped() {
        let parsed = hello_request()
            .parse(&json!({ "name": "a", "admin": true }))
            .unwrap();
        assert_eq!(parsed, json!({ "name": "a" }));
    }

    #[test]
    fn optional_fields_may_be_absent_or_null() {
        let schema = Schema::object([
            ("id", Schema::string()),
            ("nickname", Schema::string().optional()),
        ]);
        assert_eq!(
            schema.parse(&json!({ "id": "1" })).unwrap(),
            json!({ "id": "1" })
        );
        assert_eq!(
            schema.parse(&json!({ "id": "1", "nickname": null })).unwrap(),
            json!({ "id": "1" })
        );
        assert!(schema.parse(&json!({ "id": "1", "nickname": 3 })).is_err());
    }

    #[test]
    fn collects_every_issue() {
        let schema = Schema::object([
            ("id", Schema::string().min_len(1)),
            ("email", Schema::string().email()),
            ("age", Schema::number().int().min(0.0)),
        ]);
        let err = schema
            .parse(&json!({ "id": "", "email": "nope", "age": -1.5 }))
            .unwrap_err();
        let codes: Vec<_> = err.issues().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            [
                IssueCode::TooSmall,
                IssueCode::InvalidString,
                IssueCode::NotInteger,
                IssueCode::TooSmall,
            ]
        );
        assert_eq!(
            err.summary(),
            "String must contain at least 1 character(s), Invalid email, \
             Expected integer, received float, Number must be greater than or equal to 0"
        );
    }

    #[test]
    fn email_check() {
        let schema = Schema::string().email();
        assert!(schema.parse(&json!("puja@example.com")).is_ok());
        for bad in ["", "a@b", "@example.com", "a b@example.com", "a@@b.com", "a@b."] {
            assert!(schema.parse(&json!(bad)).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn max_len_counts_characters() {
        let schema = Schema::string().max_len(3);
        assert!(schema.parse(&json!("äöü")).is_ok());
        assert!(schema.parse(&json!("äöüß")).is_err());
    }

    #[test]
    fn array_issue_paths_include_index() {
        let schema = Schema::object([("tags", Schema::array(Schema::string()))]);
        let err = schema
            .parse(&json!({ "tags": ["ok", false] }))
            .unwrap_err();
        assert_eq!(err.issues()[0].path, vec!["tags".to_string(), "1".to_string()]);
        assert_eq!(err.to_string(), "validation failed: tags.1: Expected string, received boolean");
    }

    #[test]
    fn enum_and_union() {
        let color = Schema::enumeration(["red", "green"]);
        assert!(color.parse(&json!("red")).is_ok());
        let err = color.parse(&json!("blue")).unwrap_err();
        assert_eq!(
            err.summary(),
            "Invalid enum value. Expected 'red' | 'green', received \"blue\""
        );

        let id = Schema::union([Schema::string(), Schema::number()]);
        assert_eq!(id.parse(&json!(7)).unwrap(), json!(7));
        assert_eq!(
            id.parse(&json!(true)).unwrap_err().issues()[0].code,
            IssueCode::InvalidUnion
        );
    }

    #[test]
    fn refinements_on_other_kinds_are_ignored() {
        assert_eq!(Schema::boolean().min_len(3), Schema::boolean());
        assert_eq!(Schema::string().int(), Schema::string());
    }
}
