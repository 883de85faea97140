use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_TOP_K: u32 = 10;
pub const MAX_TOP_K: u32 = 10_000;

/// A vector stored in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Similarity query. Serializes to the vector index's wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub top_k: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    pub include_metadata: bool,
    pub include_values: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoredVector {
    pub id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query result as reported by the index. Fields we don't model are kept in
/// `extra` so the response can be relayed untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<ScoredVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Evaluates a metadata filter using the index's operator language:
/// `$eq $ne $gt $gte $lt $lte $in $nin`, combined with `$and` / `$or`.
/// A bare value is shorthand for `$eq`.
pub fn metadata_matches(filter: &Value, metadata: Option<&Map<String, Value>>) -> bool {
    let Some(clauses) = filter.as_object() else {
        return false;
    };

    clauses.iter().all(|(key, condition)| match key.as_str() {
        "$and" => condition
            .as_array()
            .is_some_and(|parts| parts.iter().all(|f| metadata_matches(f, metadata))),
        "$or" => condition
            .as_array()
            .is_some_and(|parts| parts.iter().any(|f| metadata_matches(f, metadata))),
        field => field_matches(metadata.and_then(|m| m.get(field)), condition),
    })
}

fn field_matches(actual: Option<&Value>, condition: &Value) -> bool {
    match condition.as_object() {
        Some(ops) if ops.keys().all(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, expected)| apply_operator(op, actual, expected))
        }
        _ => apply_operator("$eq", actual, condition),
    }
}

fn apply_operator(op: &str, actual: Option<&Value>, expected: &Value) -> bool {
    match (op, actual) {
        ("$ne", None) | ("$nin", None) => true,
        (_, None) => false,
        ("$eq", Some(v)) => values_equal(v, expected),
        ("$ne", Some(v)) => !values_equal(v, expected),
        ("$in", Some(v)) => expected
            .as_array()
            .is_some_and(|set| set.iter().any(|e| values_equal(v, e))),
        ("$nin", Some(v)) => expected
            .as_array()
            .is_some_and(|set| !set.iter().any(|e| values_equal(v, e))),
        ("$gt", Some(v)) => compare(v, expected).is_some_and(|o| o.is_gt()),
        ("$gte", Some(v)) => compare(v, expected).is_some_and(|o| o.is_ge()),
        ("$lt", Some(v)) => compare(v, expected).is_some_and(|o| o.is_lt()),
        ("$lte", Some(v)) => compare(v, expected).is_some_and(|o| o.is_le()),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}
