//! Request parameters gathered from the query string and the body.
//!
//! The n8n workflows send the same fields as query parameters, JSON bodies
//! or URL-encoded forms, sometimes mixing them. Query values are the base, a
//! JSON object body overrides them key by key, and form fields only fill
//! keys the query left out.

use actix_web::HttpRequest;
use actix_web::http::header::CONTENT_TYPE;
use escola_core::{EscolaError, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    values: Map<String, Value>,
}

impl RequestParams {
    pub fn from_request(req: &HttpRequest, body: &[u8]) -> Self {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        Self::from_parts(req.query_string(), content_type, body)
    }

    pub fn from_parts(query: &str, content_type: &str, body: &[u8]) -> Self {
        let mut values: Map<String, Value> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();

        if body.iter().all(u8::is_ascii_whitespace) {
            return Self { values };
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(object)) => values.extend(object),
            Ok(other) => {
                tracing::debug!(kind = json_kind(&other), "ignoring non-object JSON body");
            }
            Err(_) if content_type.starts_with("application/x-www-form-urlencoded") => {
                for (k, v) in url::form_urlencoded::parse(body) {
                    values
                        .entry(k.into_owned())
                        .or_insert_with(|| Value::String(v.into_owned()));
                }
            }
            Err(e) => tracing::debug!(error = %e, "request body is neither JSON nor a form"),
        }

        Self { values }
    }

    /// Raw value, with `null` and blank strings treated as absent.
    pub fn value(&self, key: &str) -> Option<&Value> {
        present(self.values.get(key)?)
    }

    /// Text form of a scalar value. Numbers and booleans are stringified.
    pub fn str(&self, key: &str) -> Option<String> {
        scalar_text(self.value(key)?)
    }

    /// `professores.professor1` style lookup into a nested object.
    pub fn nested_str(&self, parent: &str, key: &str) -> Option<String> {
        let nested = self.value(parent)?.as_object()?.get(key)?;
        scalar_text(present(nested)?)
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| EscolaError::invalid(format!("Valor inválido para {key}: {value}")))
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "sim" | "yes" => Some(true),
                "false" | "0" | "não" | "nao" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| EscolaError::invalid(format!("Valor inválido para {key}: {value}")))
    }

    /// Names among `keys` that have no usable value.
    pub fn missing<'a>(&self, keys: &[&'a str]) -> Vec<&'a str> {
        keys.iter().copied().filter(|k| self.value(k).is_none()).collect()
    }

    /// Like [`missing`](Self::missing), but zero, `false` and empty
    /// lists or objects also count as absent.
    pub fn missing_or_empty<'a>(&self, keys: &[&'a str]) -> Vec<&'a str> {
        keys.iter()
            .copied()
            .filter(|k| self.value(k).is_none_or(is_empty_value))
            .collect()
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn present(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
