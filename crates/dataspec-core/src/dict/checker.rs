//! Per-check state for a mapping.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::descriptor::{check_value_base_type, BaseType};
use crate::dict::{DictRule, Slot};
use crate::errors::{CheckError, CheckResult, Failure, InvalidValue, Location};
use crate::value::{Map, Value};

/// Lives for one top-level mapping check. A conditional sub-schema runs
/// against the same checker, so it sees and extends the same output.
pub(crate) struct Checker<'a> {
    mapping: &'a Map,
    output: Map,
    unhandled: BTreeSet<&'a Value>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(mapping: &'a Map) -> Self {
        Self {
            mapping,
            output: Map::new(),
            unhandled: mapping.keys().collect(),
        }
    }

    pub(crate) fn into_output(self) -> Map {
        self.output
    }

    /// Run every rule of `rule` against the mapping, then its post rules.
    pub(crate) fn check_dict(&mut self, rule: &DictRule, unhandled_ok: bool) -> CheckResult<()> {
        let mut failures = Vec::new();
        self.check_value_keys(rule, &mut failures)?;
        self.check_type_keys(rule, &mut failures)?;

        if !unhandled_ok && !self.unhandled.is_empty() {
            failures.push(self.unhandled_failure(rule));
        }

        if !failures.is_empty() {
            debug!(spec = %rule.name, failures = failures.len(), "mapping does not conform");
            return Err(
                InvalidValue::aggregate("Does not conform with dict schema", failures).into(),
            );
        }

        self.post_process(rule)
    }

    fn check_value_keys(&mut self, rule: &DictRule, failures: &mut Vec<Failure>) -> CheckResult<()> {
        let mapping = self.mapping;
        for (key, slot) in &rule.value_keys {
            let Some(value) = mapping.get(key) else {
                self.fill_missing(key, slot, failures)?;
                continue;
            };
            self.unhandled.remove(key);
            let checked = match slot {
                Slot::Type(base) => check_value_base_type(base, value),
                Slot::Conditional(conditional) => conditional.check(self, value),
            };
            match checked {
                Ok(checked) => {
                    self.output.insert(key.clone(), checked);
                }
                Err(CheckError::Invalid(e)) => failures.push(Failure::caused(
                    Some(Location::Key(key.clone())),
                    format!("Invalid value for key {}", key),
                    e,
                )),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn fill_missing(
        &mut self,
        key: &Value,
        slot: &Slot,
        failures: &mut Vec<Failure>,
    ) -> CheckResult<()> {
        let filled = match slot {
            Slot::Type(BaseType::Spec(spec)) if spec.is_optional() => {
                debug!(key = %key, spec = %spec.type_name(), "substituting default for missing key");
                spec.check_value(&spec.default_value())
            }
            Slot::Conditional(conditional) if conditional.is_optional() => {
                debug!(key = %key, "substituting conditional default for missing key");
                conditional.apply_default(self)
            }
            _ => {
                failures.push(Failure::at(
                    Location::Key(key.clone()),
                    format!("Missing required mapping key {}", key),
                ));
                return Ok(());
            }
        };
        match filled {
            Ok(value) => {
                self.output.insert(key.clone(), value);
            }
            Err(CheckError::Invalid(e)) => failures.push(Failure::caused(
                Some(Location::Key(key.clone())),
                format!("Invalid default for key {}", key),
                e,
            )),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn check_type_keys(&mut self, rule: &DictRule, failures: &mut Vec<Failure>) -> CheckResult<()> {
        if rule.type_keys.is_empty() || self.unhandled.is_empty() {
            return Ok(());
        }
        let mapping = self.mapping;
        let pending: Vec<&'a Value> = self.unhandled.iter().copied().collect();
        for key in pending {
            let Some(value) = mapping.get(key) else {
                continue;
            };
            match match_type_key(&rule.type_keys, key, value) {
                Ok(Some((c_key, c_value))) => {
                    trace!(key = %key, "claimed by type key rule");
                    self.unhandled.remove(key);
                    self.output.insert(c_key, c_value);
                }
                Ok(None) => {}
                Err(CheckError::Invalid(e)) => {
                    self.unhandled.remove(key);
                    failures.push(Failure::caused(
                        Some(Location::Key(key.clone())),
                        format!("Value for key {} does not conform with spec", key),
                        e,
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn unhandled_failure(&self, rule: &DictRule) -> Failure {
        let unhandled: Vec<String> = self.unhandled.iter().map(|k| k.to_string()).collect();
        let valid: Vec<String> = rule
            .value_keys
            .iter()
            .map(|(key, _)| key.to_string())
            .chain(rule.type_keys.iter().map(|(pattern, _)| pattern.type_name()))
            .collect();
        Failure::new(format!(
            "Keys {} are unhandled; valid keys: {}",
            unhandled.join(", "),
            valid.join(", ")
        ))
    }

    fn post_process(&mut self, rule: &DictRule) -> CheckResult<()> {
        let mut failures = Vec::new();
        for post in &rule.post {
            if let Err(e) = post.evaluate(&mut self.output) {
                failures.push(Failure::new(e.to_string()));
            }
        }
        if failures.is_empty() {
            return Ok(());
        }
        debug!(spec = %rule.name, failures = failures.len(), "post processing failed");
        Err(InvalidValue::aggregate("Post processing has failed", failures).into())
    }
}

/// The first pattern matching `key` decides the outcome: its value
/// descriptor either accepts the value or the key fails. A key matching no
/// pattern yields `None`.
fn match_type_key(
    rules: &[(BaseType, BaseType)],
    key: &Value,
    value: &Value,
) -> CheckResult<Option<(Value, Value)>> {
    for (pattern, spec) in rules {
        let c_key = match check_value_base_type(pattern, key) {
            Ok(c_key) => c_key,
            Err(CheckError::Invalid(_)) => continue,
            Err(e) => return Err(e),
        };
        return check_value_base_type(spec, value).map(|c_value| Some((c_key, c_value)));
    }
    Ok(None)
}
