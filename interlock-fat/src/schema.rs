//! Structural check of FAT documents
//!
//! Validates a JSON document against the fixed test-definition schema the
//! test runner accepts: required keys, JSON types, the `groupType` enum and
//! the per-expectation `oneOf(value, commandResult)` rule.

use serde_json::{Map, Value};
use std::fmt;

const GROUP_TYPES: &[&str] = &["CONTROL", "ASSESS", "COMMAND"];

const TEST_CASE_REQUIRED: &[&str] = &[
    "name",
    "parent",
    "autoSetControlValues",
    "autoAssess",
    "assessmentLockoutTime",
    "autoAssessTimeout",
    "switchOperationTime",
    "signalGroups",
    "testSteps",
];

/// First schema violation found in a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {reason}")]
pub struct SchemaError {
    /// JSON-pointer-like location, e.g. `/testCases/0/testSteps/3/expected/1`
    pub path: String,
    pub reason: String,
}

impl SchemaError {
    fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a FAT document
pub fn validate_document(document: &Value) -> Result<(), SchemaError> {
    let root = Path::root();
    let obj = expect_object(document, &root)?;

    expect_kind(required(obj, "version", &root)?, Kind::String, &root.key("version"))?;

    let cases_path = root.key("testCases");
    let cases = expect_array(required(obj, "testCases", &root)?, &cases_path)?;
    for (i, case) in cases.iter().enumerate() {
        validate_test_case(case, &cases_path.index(i))?;
    }
    Ok(())
}

fn validate_test_case(case: &Value, path: &Path) -> Result<(), SchemaError> {
    let obj = expect_object(case, path)?;
    for key in TEST_CASE_REQUIRED {
        required(obj, key, path)?;
    }

    let kinds = [
        ("name", Kind::String),
        ("parent", Kind::String),
        ("autoSetControlValues", Kind::Boolean),
        ("autoAssess", Kind::Boolean),
        ("assessmentLockoutTime", Kind::Number),
        ("autoAssessTimeout", Kind::Number),
        ("switchOperationTime", Kind::Number),
    ];
    for (key, kind) in kinds {
        expect_kind(&obj[key], kind, &path.key(key))?;
    }

    let groups_path = path.key("signalGroups");
    for (i, group) in expect_array(&obj["signalGroups"], &groups_path)?.iter().enumerate() {
        validate_signal_group(group, &groups_path.index(i))?;
    }

    let steps_path = path.key("testSteps");
    for (i, step) in expect_array(&obj["testSteps"], &steps_path)?.iter().enumerate() {
        validate_test_step(step, &steps_path.index(i))?;
    }
    Ok(())
}

fn validate_signal_group(group: &Value, path: &Path) -> Result<(), SchemaError> {
    let obj = expect_object(group, path)?;

    let type_path = path.key("groupType");
    let group_type = required(obj, "groupType", path)?;
    match group_type.as_str() {
        Some(t) if GROUP_TYPES.contains(&t) => {}
        Some(t) => {
            return Err(SchemaError::new(
                &type_path,
                format!("{:?} is not one of {:?}", t, GROUP_TYPES),
            ))
        }
        None => return expect_kind(group_type, Kind::String, &type_path),
    }

    let refs_path = path.key("signalRefs");
    for (i, r) in expect_array(required(obj, "signalRefs", path)?, &refs_path)?
        .iter()
        .enumerate()
    {
        expect_kind(r, Kind::String, &refs_path.index(i))?;
    }
    Ok(())
}

fn validate_test_step(step: &Value, path: &Path) -> Result<(), SchemaError> {
    let obj = expect_object(step, path)?;

    if let Some(description) = obj.get("description") {
        expect_kind(description, Kind::String, &path.key("description"))?;
    }
    expect_kind(required(obj, "ordered", path)?, Kind::Boolean, &path.key("ordered"))?;

    let expected_path = path.key("expected");
    for (i, entry) in expect_array(required(obj, "expected", path)?, &expected_path)?
        .iter()
        .enumerate()
    {
        validate_expectation(entry, &expected_path.index(i))?;
    }
    Ok(())
}

fn validate_expectation(entry: &Value, path: &Path) -> Result<(), SchemaError> {
    let obj = expect_object(entry, path)?;
    expect_kind(required(obj, "signalRef", path)?, Kind::String, &path.key("signalRef"))?;

    match (obj.get("value"), obj.get("commandResult")) {
        (Some(value), None) => {
            if value.is_string() || value.is_boolean() {
                Ok(())
            } else {
                Err(SchemaError::new(
                    &path.key("value"),
                    format!("expected string or boolean, found {}", Kind::of(value)),
                ))
            }
        }
        (None, Some(result)) => expect_kind(result, Kind::String, &path.key("commandResult")),
        (Some(_), Some(_)) => Err(SchemaError::new(
            path,
            "must have exactly one of \"value\" or \"commandResult\", found both",
        )),
        (None, None) => Err(SchemaError::new(
            path,
            "must have exactly one of \"value\" or \"commandResult\", found neither",
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        };
        f.write_str(name)
    }
}

fn expect_kind(value: &Value, kind: Kind, path: &Path) -> Result<(), SchemaError> {
    let found = Kind::of(value);
    if found == kind {
        Ok(())
    } else {
        Err(SchemaError::new(path, format!("expected {}, found {}", kind, found)))
    }
}

fn expect_object<'v>(value: &'v Value, path: &Path) -> Result<&'v Map<String, Value>, SchemaError> {
    value.as_object().ok_or_else(|| {
        SchemaError::new(path, format!("expected object, found {}", Kind::of(value)))
    })
}

fn expect_array<'v>(value: &'v Value, path: &Path) -> Result<&'v Vec<Value>, SchemaError> {
    value.as_array().ok_or_else(|| {
        SchemaError::new(path, format!("expected array, found {}", Kind::of(value)))
    })
}

fn required<'v>(
    obj: &'v Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<&'v Value, SchemaError> {
    obj.get(key)
        .ok_or_else(|| SchemaError::new(path, format!("missing required property {:?}", key)))
}

/// Location inside the document being validated
#[derive(Debug, Clone)]
struct Path(String);

impl Path {
    fn root() -> Self {
        Path(String::new())
    }

    fn key(&self, key: &str) -> Self {
        Path(format!("{}/{}", self.0, key))
    }

    fn index(&self, i: usize) -> Self {
        Path(format!("{}/{}", self.0, i))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "version": "1.2",
            "testCases": [{
                "name": "QB1 close",
                "parent": "AA1D1Q01A1",
                "autoSetControlValues": true,
                "autoAssess": true,
                "assessmentLockoutTime": 1.5,
                "autoAssessTimeout": 1.5,
                "switchOperationTime": 1.5,
                "signalGroups": [
                    {"groupType": "CONTROL", "signalRefs": ["B1/QA1"]},
                    {"groupType": "ASSESS", "signalRefs": ["B1CTRL/CILO"]},
                    {"groupType": "COMMAND", "signalRefs": ["B1CTRL/CSWI"]}
                ],
                "testSteps": [{
                    "description": "",
                    "ordered": false,
                    "expected": [
                        {"signalRef": "B1/QA1", "value": "POS_OFF"},
                        {"signalRef": "B1CTRL/CILO", "value": true},
                        {"signalRef": "B1CTRL/CSWI", "commandResult": "CAR_NO_OPERATION"}
                    ]
                }]
            }]
        })
    }

    #[test]
    fn test_valid_document() {
        assert_eq!(validate_document(&valid()), Ok(()));
    }

    #[test]
    fn test_missing_version() {
        let mut doc = valid();
        doc.as_object_mut().unwrap().remove("version");
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(err.path, "/");
        assert!(err.reason.contains("version"));
    }

    #[test]
    fn test_both_value_and_command_result() {
        let mut doc = valid();
        doc["testCases"][0]["testSteps"][0]["expected"][2]["value"] = json!("POS_ON");
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(err.path, "/testCases/0/testSteps/0/expected/2");
        assert!(err.reason.contains("found both"));
    }

    #[test]
    fn test_neither_value_nor_command_result() {
        let mut doc = valid();
        doc["testCases"][0]["testSteps"][0]["expected"][0] = json!({"signalRef": "B1/QA1"});
        let err = validate_document(&doc).unwrap_err();
        assert!(err.reason.contains("found neither"));
    }

    #[test]
    fn test_unknown_group_type() {
        let mut doc = valid();
        doc["testCases"][0]["signalGroups"][1]["groupType"] = json!("MEASURE");
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(err.path, "/testCases/0/signalGroups/1/groupType");
    }

    #[test]
    fn test_wrong_types() {
        let mut doc = valid();
        doc["testCases"][0]["switchOperationTime"] = json!("fast");
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(err.path, "/testCases/0/switchOperationTime");
        assert_eq!(err.reason, "expected number, found string");

        let mut doc = valid();
        doc["testCases"][0]["testSteps"][0]["expected"][0]["value"] = json!(3);
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(err.path, "/testCases/0/testSteps/0/expected/0/value");
    }
}
