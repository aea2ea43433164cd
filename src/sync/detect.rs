// ABOUTME: Change detection between the last published snapshot and a fresh fetch
// ABOUTME: Applies per-resource field rules so volatile fields never trigger a publish

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Default absolute tolerance for numeric comparisons.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Decides whether a freshly fetched value should replace the published one.
///
/// Implementations must be pure: no I/O, no mutation, same answer for the same inputs.
pub trait ChangeDetector<T>: Send + Sync {
    fn has_changed(&self, previous: Option<&T>, next: &T) -> bool;
}

impl<T, F> ChangeDetector<T> for F
where
    F: Fn(Option<&T>, &T) -> bool + Send + Sync,
{
    fn has_changed(&self, previous: Option<&T>, next: &T) -> bool {
        self(previous, next)
    }
}

/// Which fields of a resource are significant, and which are noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    /// Identity key of entities inside lists
    pub key_field: String,
    /// Fields compared on keyed list entities (empty = every non-volatile field)
    pub entity_fields: Vec<String>,
    /// Significant subset for records that carry at least one of these fields
    pub record_fields: Vec<String>,
    /// Fields that are never compared
    pub volatile_fields: Vec<String>,
    /// Absolute tolerance for numbers
    pub tolerance: f64,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            key_field: "id".to_string(),
            entity_fields: Vec::new(),
            record_fields: Vec::new(),
            volatile_fields: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl FieldRules {
    /// Rules for the tracked items list.
    pub fn items() -> Self {
        Self {
            entity_fields: strings(&[
                "current_price",
                "desired_price",
                "title",
                "notification_sent",
            ]),
            volatile_fields: strings(&["last_checked", "updated_at", "created_at"]),
            ..Self::default()
        }
    }

    /// Rules for the user profile.
    pub fn profile() -> Self {
        Self {
            record_fields: strings(&[
                "id",
                "telegram_id",
                "subscription_status",
                "subscription_end_date",
                "subscription_id",
                "first_name",
                "username",
            ]),
            volatile_fields: strings(&["last_checked", "last_active", "updated_at", "created_at"]),
            ..Self::default()
        }
    }

    fn is_volatile(&self, field: &str) -> bool {
        self.volatile_fields.iter().any(|v| v == field)
    }
}

/// Change detector over the JSON projection of a value.
///
/// Lists of keyed entities are compared by length, key set and the significant entity
/// fields. Records are stripped of volatile fields and compared on the significant subset
/// when it applies, otherwise field by field (recursively). Anything else falls back to
/// plain equality, with numbers compared under the configured tolerance.
#[derive(Debug, Clone, Default)]
pub struct JsonChangeDetector {
    rules: FieldRules,
}

impl JsonChangeDetector {
    pub fn new(rules: FieldRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Compare two JSON values under the configured rules.
    pub fn values_differ(&self, previous: &Value, next: &Value) -> bool {
        match (previous, next) {
            (Value::Array(prev), Value::Array(next)) => self.lists_differ(prev, next),
            (Value::Object(prev), Value::Object(next)) => self.records_differ(prev, next),
            (Value::Number(prev), Value::Number(next)) => match (prev.as_f64(), next.as_f64()) {
                (Some(a), Some(b)) => self.numbers_differ(a, b),
                _ => prev != next,
            },
            _ => previous != next,
        }
    }

    fn entity_key<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        value.as_object()?.get(&self.rules.key_field)
    }

    /// Difference beyond the tolerance, ignoring f64 representation error of the inputs.
    fn numbers_differ(&self, a: f64, b: f64) -> bool {
        let slack = 4.0 * f64::EPSILON * a.abs().max(b.abs()).max(1.0);
        (a - b).abs() > self.rules.tolerance + slack
    }

    fn lists_differ(&self, previous: &[Value], next: &[Value]) -> bool {
        if previous.len() != next.len() {
            return true;
        }

        let (Some(prev_keys), Some(next_keys)) = (self.key_index(previous), self.key_index(next))
        else {
            return self.positions_differ(previous, next);
        };

        let prev_set: BTreeSet<&String> = prev_keys.iter().map(|(key, _)| key).collect();
        let next_set: BTreeSet<&String> = next_keys.iter().map(|(key, _)| key).collect();
        if prev_set != next_set {
            return true;
        }

        // Repeated keys cannot be matched by identity
        if prev_set.len() != previous.len() || next_set.len() != next.len() {
            return prev_keys
                .iter()
                .zip(&next_keys)
                .any(|((pk, prev), (nk, next))| pk != nk || self.entity_differs(prev, next));
        }

        let by_key: HashMap<&String, &Map<String, Value>> =
            prev_keys.iter().map(|(key, entity)| (key, *entity)).collect();
        next_keys.iter().any(|(key, next)| match by_key.get(key) {
            Some(prev) => self.entity_differs(prev, next),
            None => true,
        })
    }

    /// Key and object of every entity, or None when any element is not a keyed object.
    fn key_index<'a>(&self, list: &'a [Value]) -> Option<Vec<(String, &'a Map<String, Value>)>> {
        list.iter()
            .map(|v| Some((self.entity_key(v)?.to_string(), v.as_object()?)))
            .collect()
    }

    fn positions_differ(&self, previous: &[Value], next: &[Value]) -> bool {
        previous
            .iter()
            .zip(next)
            .any(|(prev, next)| match (prev.as_object(), next.as_object()) {
                (Some(prev), Some(next)) => self.entity_differs(prev, next),
                _ => self.values_differ(prev, next),
            })
    }

    fn entity_differs(&self, previous: &Map<String, Value>, next: &Map<String, Value>) -> bool {
        if self.rules.entity_fields.is_empty() {
            return self.records_differ(previous, next);
        }
        let fields: Vec<&str> = self
            .rules
            .entity_fields
            .iter()
            .map(String::as_str)
            .filter(|f| !self.rules.is_volatile(f))
            .collect();
        self.fields_differ(&fields, previous, next)
    }

    fn records_differ(&self, previous: &Map<String, Value>, next: &Map<String, Value>) -> bool {
        let subset_applies = self
            .rules
            .record_fields
            .iter()
            .any(|f| previous.contains_key(f) || next.contains_key(f));

        let fields: Vec<&str> = if subset_applies {
            self.rules
                .record_fields
                .iter()
                .map(String::as_str)
                .filter(|f| !self.rules.is_volatile(f))
                .collect()
        } else {
            previous
                .keys()
                .chain(next.keys())
                .map(String::as_str)
                .filter(|f| !self.rules.is_volatile(f))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        self.fields_differ(&fields, previous, next)
    }

    fn fields_differ(
        &self,
        fields: &[&str],
        previous: &Map<String, Value>,
        next: &Map<String, Value>,
    ) -> bool {
        fields
            .iter()
            .any(|field| match (previous.get(*field), next.get(*field)) {
                (None, None) => false,
                (Some(prev), Some(next)) => self.values_differ(prev, next),
                _ => true,
            })
    }
}

impl<T: Serialize> ChangeDetector<T> for JsonChangeDetector {
    fn has_changed(&self, previous: Option<&T>, next: &T) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        match (serde_json::to_value(previous), serde_json::to_value(next)) {
            (Ok(prev), Ok(next)) => self.values_differ(&prev, &next),
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!("Treating snapshot as changed, serialization failed: {}", e);
                true
            }
        }
    }
}
