//! Minimal HTML rendering for console pages. Every interpolated value goes through [`escape`].

use serde_json::Value;

use crate::errors::ValidationErrors;
use crate::forms::{FormState, Mode};
use crate::models::{Claims, FieldKind, Record, ResourceDescriptor};

/// Longest cell text shown in list tables.
const CELL_MAX_CHARS: usize = 50;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Navigation bar. Admin-only links are a rendering hint; the backend enforces access.
pub fn nav(claims: Option<&Claims>, links: &[(String, String, bool)]) -> String {
    let is_admin = claims.map(Claims::is_admin).unwrap_or(false);
    let mut out = String::from("<nav><a href=\"/\">Dashboard</a>");
    for (href, label, admin_only) in links {
        if *admin_only && !is_admin {
            continue;
        }
        out.push_str(&format!(" | <a href=\"{}\">{}</a>", escape(href), escape(label)));
    }
    if let Some(user_id) = claims.and_then(Claims::user_id) {
        out.push_str(&format!(" | <a href=\"/users/{}\">My records</a>", user_id));
    }
    let who = claims
        .and_then(|c| c.email.clone())
        .unwrap_or_else(|| "signed in".to_string());
    out.push_str(&format!(
        " <span class=\"who\">{} ({})</span>\
         <form method=\"post\" action=\"/logout\" class=\"inline\"><button type=\"submit\">Logout</button></form></nav>",
        escape(&who),
        escape(claims.map(Claims::role).unwrap_or("unknown"))
    ));
    out
}

pub fn layout(title: &str, nav: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{} - MDM</title></head><body>{}<main><h1>{}</h1>{}</main></body></html>",
        escape(title),
        nav,
        escape(title),
        body
    )
}

pub fn flash(message: Option<&str>, kind: &str) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(
            "<p class=\"flash {}\" role=\"status\">{}</p>",
            escape(kind),
            escape(m)
        ),
        _ => String::new(),
    }
}

/// Text shown for one record value in a list cell.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(Value::String(s)) => s.chars().take(CELL_MAX_CHARS).collect(),
        Some(other) => other.to_string().chars().take(CELL_MAX_CHARS).collect(),
    }
}

pub fn table(descriptor: &ResourceDescriptor, records: &[Record], base: &str) -> String {
    if records.is_empty() {
        return "<p class=\"empty\">No records found.</p>".to_string();
    }

    let mut out = String::from("<table><thead><tr><th>ID</th>");
    for (_, spec) in descriptor.list_fields() {
        out.push_str(&format!("<th>{}</th>", escape(&spec.label)));
    }
    out.push_str("<th>Actions</th></tr></thead><tbody>");

    for record in records {
        let id = record
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!("<tr><td>{}</td>", escape(&id)));
        for (key, _) in descriptor.list_fields() {
            out.push_str(&format!("<td>{}</td>", escape(&cell_text(record.get(key)))));
        }
        match record.id() {
            Some(id) => out.push_str(&format!(
                "<td><a href=\"{base}/{id}/edit\">Edit</a> <a href=\"{base}/{id}/delete\">Delete</a></td>",
                base = escape(base),
                id = id
            )),
            None => out.push_str("<td></td>"),
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

/// Render the input form for `descriptor` seeded with `state`.
pub fn form(
    descriptor: &ResourceDescriptor,
    state: &FormState,
    errors: &ValidationErrors,
    action: &str,
    mode: Mode,
    cancel: &str,
) -> String {
    let mut out = format!("<form method=\"post\" action=\"{}\">", escape(action));

    for (key, spec) in &descriptor.fields {
        if spec.create_only && mode == Mode::Update {
            continue;
        }
        let id = format!("f-{}", key);
        let required = if spec.required { " required" } else { "" };
        let marker = if spec.required { " *" } else { "" };
        out.push_str("<div class=\"field\">");

        match spec.kind {
            FieldKind::Checkbox => {
                let checked = if state.checked(key) { " checked" } else { "" };
                out.push_str(&format!(
                    "<label for=\"{id}\"><input type=\"checkbox\" id=\"{id}\" name=\"{name}\" value=\"true\"{checked}> {label}</label>",
                    id = escape(&id),
                    name = escape(key),
                    checked = checked,
                    label = escape(&spec.label)
                ));
            }
            FieldKind::Select => {
                out.push_str(&format!(
                    "<label for=\"{}\">{}{}</label><select id=\"{}\" name=\"{}\"{}><option value=\"\">Select...</option>",
                    escape(&id),
                    escape(&spec.label),
                    marker,
                    escape(&id),
                    escape(key),
                    required
                ));
                let current = state.text(key);
                for option in &spec.options {
                    let value = option.form_value();
                    let selected = if value == current { " selected" } else { "" };
                    out.push_str(&format!(
                        "<option value=\"{}\"{}>{}</option>",
                        escape(&value),
                        selected,
                        escape(&option.label)
                    ));
                }
                out.push_str("</select>");
            }
            FieldKind::Textarea => {
                out.push_str(&format!(
                    "<label for=\"{id}\">{label}{marker}</label><textarea id=\"{id}\" name=\"{name}\" rows=\"3\"{required}>{value}</textarea>",
                    id = escape(&id),
                    label = escape(&spec.label),
                    marker = marker,
                    name = escape(key),
                    required = required,
                    value = escape(state.text(key))
                ));
            }
            kind => {
                let step = spec
                    .step
                    .map(|s| format!(" step=\"{}\"", s))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "<label for=\"{id}\">{label}{marker}</label><input type=\"{kind}\" id=\"{id}\" name=\"{name}\" value=\"{value}\"{step}{required}>",
                    id = escape(&id),
                    label = escape(&spec.label),
                    marker = marker,
                    kind = kind.as_str(),
                    name = escape(key),
                    value = escape(state.text(key)),
                    step = step,
                    required = required
                ));
            }
        }

        if let Some(message) = errors.for_field(key) {
            out.push_str(&format!("<p class=\"error\">{}</p>", escape(message)));
        }
        out.push_str("</div>");
    }

    let submit = match mode {
        Mode::Create => "Create",
        Mode::Update => "Update",
    };
    out.push_str(&format!(
        "<button type=\"submit\">{}</button> <a href=\"{}\">Cancel</a></form>",
        submit,
        escape(cancel)
    ));
    out
}

/// Explicit confirmation step in front of every delete.
pub fn confirm_delete(display_name: &str, id: i64, action: &str, cancel: &str) -> String {
    format!(
        "<p>Delete {} record #{}? This cannot be undone.</p>\
         <form method=\"post\" action=\"{}\"><input type=\"hidden\" name=\"confirm\" value=\"yes\">\
         <button type=\"submit\">Delete</button> <a href=\"{}\">Cancel</a></form>",
        escape(display_name),
        id,
        escape(action),
        escape(cancel)
    )
}

pub fn login(error: Option<&str>, email: &str) -> String {
    format!(
        "{}<form method=\"post\" action=\"/login\">\
         <div class=\"field\"><label for=\"email\">Email</label><input type=\"email\" id=\"email\" name=\"email\" value=\"{}\" required></div>\
         <div class=\"field\"><label for=\"password\">Password</label><input type=\"password\" id=\"password\" name=\"password\" required></div>\
         <button type=\"submit\">Sign in</button></form>",
        flash(error, "error"),
        escape(email)
    )
}
