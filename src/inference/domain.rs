//! Request schema for the prediction endpoint.
//!
//! Validation is table driven: [`FEATURE_SCHEMA`] lists the thirteen clinical
//! features in the order the model consumes them, each with its numeric kind.
//! Coercion is lax in the same way for every field; see [`FieldKind::coerce`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FEATURE_COUNT: usize = 13;

/// Declared numeric type of a request field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Int,
    Float,
}

/// One entry of the request schema.
#[derive(Copy, Clone, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn int(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Int,
    }
}

const fn float(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Float,
    }
}

/// Request fields in model input order.
pub const FEATURE_SCHEMA: [FieldSpec; FEATURE_COUNT] = [
    int("age"),
    int("sex"),
    int("cp"),
    int("trestbps"),
    int("chol"),
    int("fbs"),
    int("restecg"),
    int("thalach"),
    int("exang"),
    float("oldpeak"),
    int("slope"),
    int("ca"),
    int("thal"),
];

/// Feature names in model input order.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_SCHEMA.iter().map(|spec| spec.name)
}

/// A single validation failure, shaped for the 422 response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldError {
    fn new(loc: &[&str], kind: &str, msg: &str, input: Option<&Value>) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.to_string(),
            kind: kind.to_string(),
            input: input.cloned(),
        }
    }

    fn at_field(field: &str, kind: &str, msg: &str, input: Option<&Value>) -> Self {
        Self::new(&["body", field], kind, msg, input)
    }

    /// The request carried no body at all.
    pub fn body_missing() -> Self {
        Self::new(&["body"], "missing", "Field required", None)
    }

    /// The body was not valid JSON.
    pub fn json_invalid(detail: impl std::fmt::Display) -> Self {
        Self::new(
            &["body"],
            "json_invalid",
            &format!("JSON decode error: {detail}"),
            None,
        )
    }

    /// The body was valid JSON but not an object.
    pub fn not_an_object(input: &Value) -> Self {
        Self::new(
            &["body"],
            "model_attributes_type",
            "Input should be a valid dictionary or object to extract fields from",
            Some(input),
        )
    }
}

/// A field value after coercion to its declared kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn as_i64(self) -> i64 {
        match self {
            Scalar::Int(v) => v,
            Scalar::Float(v) => v as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }
}

impl FieldKind {
    /// Coerce a raw JSON value to this kind.
    ///
    /// Integers accept whole JSON numbers, booleans, and strings holding an
    /// integer or a decimal with an all-zero fraction (`"61"`, `"61.0"`), but
    /// not exponent notation. Floats accept numbers, booleans and any string
    /// `f64` parses, including `"nan"` and `"inf"`; non-finite values are left
    /// for the model to refuse.
    pub fn coerce(self, field: &str, raw: &Value) -> Result<Scalar, FieldError> {
        match self {
            FieldKind::Int => coerce_int(field, raw).map(Scalar::Int),
            FieldKind::Float => coerce_float(field, raw).map(Scalar::Float),
        }
    }
}

fn int_from_f64(field: &str, v: f64, raw: &Value) -> Result<i64, FieldError> {
    if v.fract() != 0.0 {
        return Err(FieldError::at_field(
            field,
            "int_from_float",
            "Input should be a valid integer, got a number with a fractional part",
            Some(raw),
        ));
    }
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if !(v >= i64::MIN as f64 && v < i64::MAX as f64) {
        return Err(int_size_error(field, raw));
    }
    Ok(v as i64)
}

fn int_size_error(field: &str, raw: &Value) -> FieldError {
    FieldError::at_field(
        field,
        "int_parsing_size",
        "Input should be a valid integer, unable to parse input as an integer within range",
        Some(raw),
    )
}

/// Parse `[+-]digits` optionally followed by `.` and zeros.
fn int_from_str(field: &str, s: &str, raw: &Value) -> Result<i64, FieldError> {
    let parse_error = || {
        FieldError::at_field(
            field,
            "int_parsing",
            "Input should be a valid integer, unable to parse string as an integer",
            Some(raw),
        )
    };

    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    let digits = whole.strip_prefix(['+', '-']).unwrap_or(whole);
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b == b'0')
    {
        return Err(parse_error());
    }
    whole.parse::<i64>().map_err(|_| int_size_error(field, raw))
}

fn coerce_int(field: &str, raw: &Value) -> Result<i64, FieldError> {
    match raw {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(v) => Ok(v),
            None => int_from_f64(field, n.as_f64().unwrap_or(f64::NAN), raw),
        },
        Value::String(s) => int_from_str(field, s.trim(), raw),
        _ => Err(FieldError::at_field(
            field,
            "int_type",
            "Input should be a valid integer",
            Some(raw),
        )),
    }
}

fn coerce_float(field: &str, raw: &Value) -> Result<f64, FieldError> {
    match raw {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            FieldError::at_field(field, "float_type", "Input should be a valid number", Some(raw))
        }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            FieldError::at_field(
                field,
                "float_parsing",
                "Input should be a valid number, unable to parse string as a number",
                Some(raw),
            )
        }),
        _ => Err(FieldError::at_field(
            field,
            "float_type",
            "Input should be a valid number",
            Some(raw),
        )),
    }
}

/// The thirteen clinical measurements accepted by `/predict`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub age: i64,
    pub sex: i64,
    pub cp: i64,
    pub trestbps: i64,
    pub chol: i64,
    pub fbs: i64,
    pub restecg: i64,
    pub thalach: i64,
    pub exang: i64,
    pub oldpeak: f64,
    pub slope: i64,
    pub ca: i64,
    pub thal: i64,
}

impl PredictionRequest {
    /// Validate a raw JSON body against [`FEATURE_SCHEMA`].
    ///
    /// Every failing field is reported, in schema order. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(obj) = body.as_object() else {
            return Err(vec![FieldError::not_an_object(body)]);
        };

        let mut values = Vec::with_capacity(FEATURE_COUNT);
        let mut errors = Vec::new();
        for spec in &FEATURE_SCHEMA {
            match obj.get(spec.name) {
                None => errors.push(FieldError::at_field(
                    spec.name,
                    "missing",
                    "Field required",
                    None,
                )),
                Some(raw) => match spec.kind.coerce(spec.name, raw) {
                    Ok(v) => values.push(v),
                    Err(e) => errors.push(e),
                },
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // Indices follow FEATURE_SCHEMA.
        let int = |i: usize| values[i].as_i64();
        Ok(Self {
            age: int(0),
            sex: int(1),
            cp: int(2),
            trestbps: int(3),
            chol: int(4),
            fbs: int(5),
            restecg: int(6),
            thalach: int(7),
            exang: int(8),
            oldpeak: values[9].as_f64(),
            slope: int(10),
            ca: int(11),
            thal: int(12),
        })
    }

    /// Feature vector in model input order.
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.age as f64,
            self.sex as f64,
            self.cp as f64,
            self.trestbps as f64,
            self.chol as f64,
            self.fbs as f64,
            self.restecg as f64,
            self.thalach as f64,
            self.exang as f64,
            self.oldpeak,
            self.slope as f64,
            self.ca as f64,
            self.thal as f64,
        ]
    }
}

/// Outcome of a single inference call.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: i64,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "age": 50, "sex": 1, "cp": 3, "trestbps": 130, "chol": 250,
            "fbs": 0, "restecg": 1, "thalach": 150, "exang": 0,
            "oldpeak": 2.3, "slope": 2, "ca": 0, "thal": 2
        })
    }

    #[test]
    fn schema_matches_request_struct_order() {
        let req = PredictionRequest::from_json(&sample()).unwrap();
        let serialized = serde_json::to_value(&req).unwrap();
        let obj = serialized.as_object().unwrap();
        let names: Vec<&str> = feature_names().collect();
        assert_eq!(names.len(), obj.len());
        for (name, value) in names.iter().zip(req.to_row()) {
            assert_eq!(obj[*name].as_f64().unwrap(), value);
        }
    }

    #[test]
    fn valid_body_yields_fixed_order_row() {
        let req = PredictionRequest::from_json(&sample()).unwrap();
        assert_eq!(
            req.to_row(),
            vec![50.0, 1.0, 3.0, 130.0, 250.0, 0.0, 1.0, 150.0, 0.0, 2.3, 2.0, 0.0, 2.0]
        );
    }

    #[test]
    fn every_missing_field_is_reported() {
        let errors = PredictionRequest::from_json(&json!({"age": 50})).unwrap_err();
        assert_eq!(errors.len(), FEATURE_COUNT - 1);
        assert_eq!(errors[0].loc, vec!["body", "sex"]);
        assert!(errors.iter().all(|e| e.kind == "missing"));
    }

    #[test]
    fn each_single_omission_fails() {
        for name in feature_names() {
            let mut body = sample();
            body.as_object_mut().unwrap().remove(name);
            let errors = PredictionRequest::from_json(&body).unwrap_err();
            assert_eq!(errors.len(), 1, "omitting {name}");
            assert_eq!(errors[0].loc, vec!["body".to_string(), name.to_string()]);
        }
    }

    #[test]
    fn lax_coercion_accepts_numeric_strings_and_whole_floats() {
        let mut body = sample();
        body["age"] = json!("61");
        body["chol"] = json!(233.0);
        body["oldpeak"] = json!("1.4");
        body["thal"] = json!(" 3 ");
        let req = PredictionRequest::from_json(&body).unwrap();
        assert_eq!(req.age, 61);
        assert_eq!(req.chol, 233);
        assert_eq!(req.oldpeak, 1.4);
        assert_eq!(req.thal, 3);
    }

    #[test]
    fn integer_oldpeak_is_a_float() {
        let mut body = sample();
        body["oldpeak"] = json!(1);
        assert_eq!(PredictionRequest::from_json(&body).unwrap().oldpeak, 1.0);
    }

    #[test]
    fn rejects_non_numeric_values() {
        let cases = [
            ("age", json!("fifty"), "int_parsing"),
            ("age", json!("1e2"), "int_parsing"),
            ("sex", json!("1.5"), "int_parsing"),
            ("cp", json!(null), "int_type"),
            ("chol", json!([250]), "int_type"),
            ("trestbps", json!(130.5), "int_from_float"),
            ("oldpeak", json!("high"), "float_parsing"),
            ("oldpeak", json!({"v": 1}), "float_type"),
            ("ca", json!(1e300), "int_parsing_size"),
            ("thal", json!("99999999999999999999"), "int_parsing_size"),
        ];
        for (field, value, kind) in cases {
            let mut body = sample();
            body[field] = value.clone();
            let errors = PredictionRequest::from_json(&body).unwrap_err();
            assert_eq!(errors.len(), 1, "{field}={value}");
            assert_eq!(errors[0].kind, kind, "{field}={value}");
            assert_eq!(errors[0].input, Some(value));
        }
    }

    #[test]
    fn booleans_coerce_to_zero_and_one() {
        let mut body = sample();
        body["sex"] = json!(true);
        body["fbs"] = json!(false);
        body["oldpeak"] = json!(true);
        let req = PredictionRequest::from_json(&body).unwrap();
        assert_eq!(req.sex, 1);
        assert_eq!(req.fbs, 0);
        assert_eq!(req.oldpeak, 1.0);
    }

    #[test]
    fn zero_fraction_strings_are_integers() {
        let mut body = sample();
        body["age"] = json!("61.0");
        body["ca"] = json!("-0");
        let req = PredictionRequest::from_json(&body).unwrap();
        assert_eq!(req.age, 61);
        assert_eq!(req.ca, 0);
    }

    #[test]
    fn non_finite_strings_pass_the_float_field() {
        for raw in ["nan", "NaN", "inf", "-Infinity"] {
            let mut body = sample();
            body["oldpeak"] = json!(raw);
            let req = PredictionRequest::from_json(&body).unwrap();
            assert!(!req.oldpeak.is_finite(), "{raw}");
            assert!(!req.to_row()[9].is_finite(), "{raw}");
        }

        let mut body = sample();
        body["oldpeak"] = json!("1e-1");
        assert_eq!(PredictionRequest::from_json(&body).unwrap().oldpeak, 0.1);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut body = sample();
        body["comment"] = json!("extra");
        assert!(PredictionRequest::from_json(&body).is_ok());
    }

    #[test]
    fn non_object_body_is_one_error_at_body() {
        let errors = PredictionRequest::from_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].loc, vec!["body"]);
        assert_eq!(errors[0].kind, "model_attributes_type");
    }

    #[test]
    fn field_error_serializes_type_key() {
        let err = FieldError::json_invalid("expected value at line 1 column 1");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "json_invalid");
        assert!(v.get("input").is_none());
    }
}
