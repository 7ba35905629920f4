use crate::errors::JudgeError;
use crate::model::{Opinion, Verdict};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref EMBEDDED_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").expect("static regex");
}

/// Parse the whole reply as JSON; failing that, the outermost `{...}` fragment in it.
pub fn extract_object(text: &str) -> Result<serde_json::Map<String, Value>, JudgeError> {
    let text = text.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Ok(map);
    }
    let fragment = EMBEDDED_OBJECT
        .find(text)
        .ok_or(JudgeError::Unparsable)?
        .as_str();
    match serde_json::from_str::<Value>(fragment) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(JudgeError::Unparsable),
    }
}

/// Structural checks on a parsed reply, then conversion into an `Opinion`
/// attributed to `persona` for `dimension`.
pub fn validate(
    obj: &serde_json::Map<String, Value>,
    dimension: &str,
    persona: &str,
) -> Result<Opinion, JudgeError> {
    for field in ["dimension", "verdict", "confidence", "reasoning"] {
        if !obj.contains_key(field) {
            return Err(JudgeError::Invalid(format!("missing required field: {}", field)));
        }
    }

    let reported = obj["dimension"]
        .as_str()
        .ok_or_else(|| JudgeError::Invalid("dimension must be a string".into()))?;
    if !reported.trim().eq_ignore_ascii_case(dimension.trim()) {
        return Err(JudgeError::Invalid(format!(
            "opinion is for dimension '{}' but '{}' was requested",
            reported, dimension
        )));
    }

    let verdict = obj["verdict"]
        .as_str()
        .and_then(Verdict::parse)
        .ok_or_else(|| JudgeError::Invalid(format!("invalid verdict: {}", obj["verdict"])))?;

    let confidence = obj["confidence"]
        .as_f64()
        .filter(|c| (0.0..=1.0).contains(c))
        .ok_or_else(|| {
            JudgeError::Invalid(format!("invalid confidence: {}", obj["confidence"]))
        })?;

    let reasoning = obj["reasoning"]
        .as_str()
        .ok_or_else(|| JudgeError::Invalid("reasoning must be a string".into()))?;

    let evidence_ids = match obj.get("evidence_ids") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| JudgeError::Invalid("evidence_ids must hold strings".into()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(JudgeError::Invalid("evidence_ids must be a list".into())),
    };

    let minority_opinion = match obj.get("minority_opinion") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(JudgeError::Invalid(
                "minority_opinion must be a string".into(),
            ))
        }
    };

    Ok(Opinion {
        dimension: dimension.to_string(),
        persona: persona.to_string(),
        verdict,
        confidence,
        reasoning: format!("[{}] {}", persona, reasoning),
        evidence_ids,
        minority_opinion,
        round: 0,
    })
}

pub fn parse_judge_output(text: &str, dimension: &str, persona: &str) -> Result<Opinion, JudgeError> {
    let obj = extract_object(text)?;
    validate(&obj, dimension, persona)
}
