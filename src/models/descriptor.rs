//! Declarative resource descriptors driving list, form and transport behavior.

use serde::Serialize;
use serde_json::Value;

/// Input control kind of a descriptor field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Number,
    Date,
    Time,
    Select,
    Checkbox,
    Textarea,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Password => "password",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Textarea => "textarea",
        }
    }
}

/// One `(value, label)` pair of a select field. The value is the JSON scalar sent to the API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    /// Option whose value doubles as its label.
    pub fn plain(value: &str) -> Self {
        Self {
            value: Value::String(value.to_string()),
            label: value.to_string(),
        }
    }

    /// Option carrying an integer value under a display label.
    pub fn numbered(value: i64, label: &str) -> Self {
        Self {
            value: Value::from(value),
            label: label.to_string(),
        }
    }

    /// The option value as it appears in a submitted form.
    pub fn form_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Metadata of one descriptor field.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Accepted on create, omitted on update and display
    pub create_only: bool,
}

impl FieldSpec {
    pub fn new(kind: FieldKind, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            required: false,
            options: Vec::new(),
            step: None,
            create_only: false,
        }
    }

    pub fn text(label: &str) -> Self {
        Self::new(FieldKind::Text, label)
    }

    pub fn email(label: &str) -> Self {
        Self::new(FieldKind::Email, label)
    }

    pub fn password(label: &str) -> Self {
        Self::new(FieldKind::Password, label)
    }

    pub fn number(label: &str) -> Self {
        Self::new(FieldKind::Number, label)
    }

    pub fn date(label: &str) -> Self {
        Self::new(FieldKind::Date, label)
    }

    pub fn time(label: &str) -> Self {
        Self::new(FieldKind::Time, label)
    }

    pub fn checkbox(label: &str) -> Self {
        Self::new(FieldKind::Checkbox, label)
    }

    pub fn textarea(label: &str) -> Self {
        Self::new(FieldKind::Textarea, label)
    }

    pub fn select(label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::new(FieldKind::Select, label)
        }
    }

    /// Select over string values that are their own labels.
    pub fn choice(label: &str, values: &[&str]) -> Self {
        Self::select(label, values.iter().map(|v| SelectOption::plain(v)).collect())
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Find the declared option matching a submitted form value.
    pub fn option_for(&self, raw: &str) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.form_value() == raw)
    }
}

/// Where a resource lives in the API's path space.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// `/api/v1/<resource>/`
    Top,
    /// `/api/v1/users/{userId}/<resource>/`
    User,
}

/// Declarative schema for one entity type.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub entity_key: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Path segment below the scope prefix, e.g. `turnos`
    pub endpoint_path: String,
    pub scope: Scope,
    pub fields: Vec<(String, FieldSpec)>,
    /// Number of leading non-create-only fields shown as list columns
    pub list_columns: usize,
}

impl ResourceDescriptor {
    pub fn new(entity_key: &str, display_name: &str, endpoint_path: &str) -> Self {
        Self {
            entity_key: entity_key.to_string(),
            display_name: display_name.to_string(),
            description: String::new(),
            endpoint_path: endpoint_path.trim_matches('/').to_string(),
            scope: Scope::Top,
            fields: Vec::new(),
            list_columns: 5,
        }
    }

    pub fn user_scoped(mut self) -> Self {
        self.scope = Scope::User;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn columns(mut self, count: usize) -> Self {
        self.list_columns = count;
        self
    }

    pub fn field(mut self, key: &str, spec: FieldSpec) -> Self {
        self.fields.push((key.to_string(), spec));
        self
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.get_field(key).is_some()
    }

    /// Fields shown in list tables, in declaration order.
    pub fn list_fields(&self) -> impl Iterator<Item = &(String, FieldSpec)> {
        self.fields
            .iter()
            .filter(|(_, f)| !f.create_only)
            .take(self.list_columns)
    }

    /// Collection path for this resource, e.g. `/api/v1/users/42/dependents/`.
    ///
    /// Returns `None` for a user-scoped resource addressed without a user id.
    pub fn collection_path(&self, user_id: Option<i64>) -> Option<String> {
        match (self.scope, user_id) {
            (Scope::Top, _) => Some(format!("/api/v1/{}/", self.endpoint_path)),
            (Scope::User, Some(uid)) => {
                Some(format!("/api/v1/users/{}/{}/", uid, self.endpoint_path))
            }
            (Scope::User, None) => None,
        }
    }

    /// Item path for this resource, e.g. `/api/v1/turnos/7`.
    pub fn item_path(&self, user_id: Option<i64>, id: i64) -> Option<String> {
        self.collection_path(user_id)
            .map(|base| format!("{}{}", base, id))
    }
}
