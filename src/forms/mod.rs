//! Form binder: maps records to editable control state and validated submissions back to
//! record payloads.
//!
//! Only required-ness and per-kind type checks are performed here. Cross-field rules
//! (an end date after a start date, for example) are left to the backend.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

use crate::errors::ValidationErrors;
use crate::models::{FieldKind, FieldSpec, Record, ResourceDescriptor};

/// Whether a submission creates a record or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Raw value of one input control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    Flag(bool),
}

/// Control values of one form, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: Vec<(String, FormValue)>,
}

impl FormState {
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: &str, value: FormValue) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((key.to_string(), value)),
        }
    }

    /// Text of a control; checkboxes read as `"true"`/`"false"`.
    pub fn text(&self, key: &str) -> &str {
        match self.get(key) {
            Some(FormValue::Text(s)) => s,
            Some(FormValue::Flag(true)) => "true",
            Some(FormValue::Flag(false)) => "false",
            None => "",
        }
    }

    pub fn checked(&self, key: &str) -> bool {
        match self.get(key) {
            Some(FormValue::Flag(b)) => *b,
            Some(FormValue::Text(s)) => truthy(s),
            None => false,
        }
    }

    /// Build state from an HTML form post. Unchecked checkboxes are simply absent from the
    /// post, so checkbox presence decides the flag.
    pub fn from_submission(
        descriptor: &ResourceDescriptor,
        submitted: &HashMap<String, String>,
    ) -> Self {
        let mut state = Self::default();
        for (key, spec) in &descriptor.fields {
            let value = match spec.kind {
                FieldKind::Checkbox => {
                    FormValue::Flag(submitted.get(key).map(|v| truthy(v)).unwrap_or(false))
                }
                _ => FormValue::Text(submitted.get(key).cloned().unwrap_or_default()),
            };
            state.set(key, value);
        }
        state
    }
}

/// Seed control values from `record`, falling back to empty defaults.
pub fn to_form_state(descriptor: &ResourceDescriptor, record: Option<&Record>) -> FormState {
    let mut state = FormState::default();
    for (key, spec) in &descriptor.fields {
        let current = record.and_then(|r| r.get(key));
        let value = match spec.kind {
            FieldKind::Checkbox => FormValue::Flag(current.map(value_truthy).unwrap_or(false)),
            _ => FormValue::Text(current.map(value_text).unwrap_or_default()),
        };
        state.set(key, value);
    }
    state
}

/// Coerce and validate control values into a payload.
///
/// Create-only fields are included only in [`Mode::Create`]. Checkbox fields are always
/// present as booleans. Any validation failure rejects the whole submission.
pub fn from_form_state(
    descriptor: &ResourceDescriptor,
    state: &FormState,
    mode: Mode,
) -> Result<Record, ValidationErrors> {
    let mut record = Record::new();
    let mut errors = ValidationErrors::default();

    for (key, spec) in &descriptor.fields {
        if spec.create_only && mode == Mode::Update {
            continue;
        }

        if spec.kind == FieldKind::Checkbox {
            record.insert(key.as_str(), Value::Bool(state.checked(key)));
            continue;
        }

        match coerce(spec, state.text(key)) {
            Ok(Value::Null) if spec.required => {
                errors.push(key, format!("{} is required", spec.label));
            }
            Ok(value) => record.insert(key.as_str(), value),
            Err(message) => errors.push(key, message),
        }
    }

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(errors)
    }
}

/// Keep only the payload entries whose value differs from `original`.
pub fn changed_fields(original: &Record, payload: Record) -> Record {
    let mut changed = Record::new();
    for (key, value) in payload.0 {
        if original.get(&key) != Some(&value) {
            changed.insert(key, value);
        }
    }
    changed
}

/// Coerce one non-checkbox control. `Ok(Null)` means empty.
fn coerce(spec: &FieldSpec, raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    match spec.kind {
        FieldKind::Number => match parse_number(trimmed) {
            Some(n) => Ok(Value::Number(n)),
            // An optional number that does not parse is sent as null
            None if !spec.required => Ok(Value::Null),
            None => Err(format!("{} must be a number", spec.label)),
        },
        FieldKind::Select => match spec.option_for(trimmed) {
            Some(option) => Ok(option.value.clone()),
            None => Err(format!(
                "{} must be one of: {}",
                spec.label,
                spec.options
                    .iter()
                    .map(|o| o.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        },
        FieldKind::Date => {
            if is_iso_date(trimmed) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(format!("{} must be a date (YYYY-MM-DD)", spec.label))
            }
        }
        FieldKind::Time => {
            if is_iso_time(trimmed) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(format!("{} must be a time (HH:MM)", spec.label))
            }
        }
        FieldKind::Email => match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Value::String(trimmed.to_string()))
            }
            _ => Err(format!("{} must be an email address", spec.label)),
        },
        FieldKind::Text | FieldKind::Password | FieldKind::Textarea => {
            Ok(Value::String(raw.to_string()))
        }
        FieldKind::Checkbox => Ok(Value::Bool(truthy(trimmed))),
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Number::from(i));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_iso_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || DateTime::parse_from_rfc3339(raw).is_ok()
}

fn is_iso_time(raw: &str) -> bool {
    NaiveTime::parse_from_str(raw, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(raw, "%H:%M:%S%.f").is_ok()
}

fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => truthy(s),
        _ => false,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog;
    use crate::models::Scope;
    use serde_json::json;

    fn turnos() -> &'static ResourceDescriptor {
        catalog::descriptor(Scope::Top, "turnos").unwrap()
    }

    fn users() -> &'static ResourceDescriptor {
        catalog::descriptor(Scope::Top, "users").unwrap()
    }

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn test_empty_state_defaults() {
        let state = to_form_state(turnos(), None);
        assert_eq!(state.get("nombre"), Some(&FormValue::Text(String::new())));
        assert_eq!(state.get("activo"), Some(&FormValue::Flag(false)));
        let keys: Vec<&str> = state.values.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["nombre", "codigo", "hora_inicio", "hora_fin", "es_descanso", "activo"]
        );
    }

    #[test]
    fn test_round_trip_turno() {
        let original = record(json!({
            "nombre": "Night",
            "codigo": "NGT",
            "hora_inicio": "22:00",
            "hora_fin": "06:00",
            "es_descanso": false,
            "activo": true
        }));

        let state = to_form_state(turnos(), Some(&original));
        let rebuilt = from_form_state(turnos(), &state, Mode::Update).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_round_trip_numbers_selects_and_nulls() {
        let payroll = catalog::descriptor(Scope::Top, "payroll").unwrap();
        let original = record(json!({
            "employee_id": 42,
            "payroll_period": "2025-01",
            "period_start": "2025-01-01",
            "period_end": "2025-01-15",
            "base_salary": 15000.5,
            "gross_pay": 1500.0,
            "total_deductions": null,
            "net_pay": 0,
            "payment_status": "PAID"
        }));

        let state = to_form_state(payroll, Some(&original));
        assert_eq!(state.text("total_deductions"), "");
        let rebuilt = from_form_state(payroll, &state, Mode::Create).unwrap();
        assert_eq!(rebuilt, original);

        let schedules = catalog::descriptor(Scope::Top, "horarios-base").unwrap();
        let original = record(json!({ "empleado_id": 3, "turno_id": 7, "dia_semana": 6 }));
        let state = to_form_state(schedules, Some(&original));
        assert_eq!(state.text("dia_semana"), "6");
        assert_eq!(
            from_form_state(schedules, &state, Mode::Update).unwrap(),
            original
        );
    }

    #[test]
    fn test_round_trip_ignores_server_keys() {
        let original = record(json!({
            "id": 7,
            "nombre": "Day",
            "codigo": "DAY",
            "hora_inicio": "08:00:00",
            "hora_fin": "16:00:00",
            "es_descanso": false,
            "activo": false,
            "created_at": "2025-01-01T00:00:00"
        }));

        let state = to_form_state(turnos(), Some(&original));
        let rebuilt = from_form_state(turnos(), &state, Mode::Update).unwrap();
        assert_eq!(rebuilt.id(), None);
        assert_eq!(rebuilt.get("hora_inicio"), Some(&json!("08:00:00")));
        assert_eq!(rebuilt.0.len(), 6);
    }

    #[test]
    fn test_checkbox_always_boolean() {
        let mut state = to_form_state(turnos(), None);
        state.set("nombre", FormValue::Text("N".into()));
        state.set("codigo", FormValue::Text("N".into()));
        state.set("hora_inicio", FormValue::Text("22:00".into()));
        state.set("hora_fin", FormValue::Text("06:00".into()));

        for raw in ["", "on", "off", "garbage", "TRUE", "0"] {
            state.set("activo", FormValue::Text(raw.to_string()));
            let payload = from_form_state(turnos(), &state, Mode::Create).unwrap();
            assert!(payload.get("activo").unwrap().is_boolean(), "input {:?}", raw);
            assert!(payload.get("es_descanso").unwrap().is_boolean());
        }

        let submitted = HashMap::from([("activo".to_string(), "on".to_string())]);
        let state = FormState::from_submission(turnos(), &submitted);
        assert!(state.checked("activo"));
        assert!(!state.checked("es_descanso"));
    }

    #[test]
    fn test_required_empty_yields_one_error() {
        let mut state = to_form_state(turnos(), None);
        state.set("codigo", FormValue::Text("NGT".into()));
        state.set("hora_inicio", FormValue::Text("22:00".into()));
        state.set("hora_fin", FormValue::Text("06:00".into()));
        state.set("nombre", FormValue::Text("   ".into()));

        let errors = from_form_state(turnos(), &state, Mode::Create).unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.for_field("nombre"), Some("Name is required"));
    }

    #[test]
    fn test_create_only_follows_mode() {
        let mut state = to_form_state(users(), None);
        state.set("name", FormValue::Text("Ana".into()));
        state.set("email", FormValue::Text("ana@example.com".into()));
        state.set("password", FormValue::Text("s3cret".into()));
        state.set("role", FormValue::Text("admin".into()));

        let created = from_form_state(users(), &state, Mode::Create).unwrap();
        assert_eq!(created.get("password"), Some(&json!("s3cret")));

        let updated = from_form_state(users(), &state, Mode::Update).unwrap();
        assert!(updated.get("password").is_none());

        // A required create-only field left empty does not block updates
        state.set("password", FormValue::Text(String::new()));
        assert!(from_form_state(users(), &state, Mode::Update).is_ok());
        assert!(from_form_state(users(), &state, Mode::Create).is_err());
    }

    #[test]
    fn test_number_coercion() {
        let mut state = to_form_state(users(), None);
        state.set("name", FormValue::Text("Ana".into()));
        state.set("email", FormValue::Text("ana@example.com".into()));
        state.set("role", FormValue::Text("employee".into()));

        state.set("salary", FormValue::Text("abc".into()));
        let payload = from_form_state(users(), &state, Mode::Update).unwrap();
        assert_eq!(payload.get("salary"), Some(&Value::Null));

        state.set("salary", FormValue::Text("1234.50".into()));
        let payload = from_form_state(users(), &state, Mode::Update).unwrap();
        assert_eq!(payload.get("salary"), Some(&json!(1234.5)));

        let absences = catalog::descriptor(Scope::Top, "absence-requests").unwrap();
        let mut state = to_form_state(absences, None);
        state.set("total_days", FormValue::Text("NaN days".into()));
        let errors = from_form_state(absences, &state, Mode::Create).unwrap_err();
        assert_eq!(errors.for_field("total_days"), Some("Total Days must be a number"));
    }

    #[test]
    fn test_select_rejects_undeclared_option() {
        let mut state = to_form_state(users(), None);
        state.set("name", FormValue::Text("Ana".into()));
        state.set("email", FormValue::Text("ana@example.com".into()));
        state.set("role", FormValue::Text("root".into()));

        let errors = from_form_state(users(), &state, Mode::Update).unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert!(errors.for_field("role").unwrap().starts_with("Role must be one of"));
    }

    #[test]
    fn test_type_checks() {
        let mut state = to_form_state(turnos(), None);
        state.set("nombre", FormValue::Text("N".into()));
        state.set("codigo", FormValue::Text("N".into()));
        state.set("hora_inicio", FormValue::Text("25:99".into()));
        state.set("hora_fin", FormValue::Text("06:00".into()));
        let errors = from_form_state(turnos(), &state, Mode::Create).unwrap_err();
        assert_eq!(errors.for_field("hora_inicio"), Some("Start Time must be a time (HH:MM)"));

        let mut state = to_form_state(users(), None);
        state.set("name", FormValue::Text("Ana".into()));
        state.set("email", FormValue::Text("not-an-email".into()));
        state.set("role", FormValue::Text("employee".into()));
        state.set("hire_date", FormValue::Text("31/12/2024".into()));
        let errors = from_form_state(users(), &state, Mode::Update).unwrap_err();
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.for_field("email").is_some());
        assert!(errors.for_field("hire_date").is_some());
    }

    #[test]
    fn test_optional_empty_text_is_null() {
        let mut state = to_form_state(users(), None);
        state.set("name", FormValue::Text("Ana".into()));
        state.set("email", FormValue::Text("ana@example.com".into()));
        state.set("role", FormValue::Text("employee".into()));

        let payload = from_form_state(users(), &state, Mode::Update).unwrap();
        assert_eq!(payload.get("department"), Some(&Value::Null));
        assert_eq!(payload.get("hire_date"), Some(&Value::Null));
    }

    #[test]
    fn test_changed_fields() {
        let original = record(json!({
            "id": 7,
            "nombre": "Night",
            "codigo": "NGT",
            "activo": true
        }));
        let payload = record(json!({
            "nombre": "Night",
            "codigo": "NGT",
            "activo": false
        }));

        let changed = changed_fields(&original, payload);
        assert_eq!(changed.into_value(), json!({ "activo": false }));
    }
}
