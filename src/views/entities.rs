//! Generic entity list, form and delete pages for every descriptor in the catalog.
//!
//! The same handlers serve top-level entities (`/entities/{key}`) and employee-scoped
//! entities (`/users/{user_id}/entities/{key}`).

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::{html, Visitor};
use crate::errors::{ClientError, ValidationErrors};
use crate::forms::{changed_fields, from_form_state, to_form_state, FormState, Mode};
use crate::models::{catalog, ResourceDescriptor, Scope};
use crate::resource::ResourceController;
use crate::AppState;

/// Path parameters shared by all entity routes.
#[derive(Debug, Deserialize)]
pub struct EntityPath {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub key: String,
    #[serde(default)]
    pub id: Option<i64>,
}

/// `?message=` set by the redirect after a successful mutation.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    #[serde(default)]
    pub message: Option<String>,
}

impl FlashQuery {
    pub fn message(&self) -> Option<&'static str> {
        match self.message.as_deref()? {
            "created" => Some("Record created successfully!"),
            "updated" => Some("Record updated successfully!"),
            "unchanged" => Some("No changes to save."),
            "deleted" => Some("Record deleted successfully!"),
            _ => None,
        }
    }
}

/// A resolved descriptor plus the console URL it lives under.
struct Target {
    descriptor: &'static ResourceDescriptor,
    user_id: Option<i64>,
    id: Option<i64>,
    base: String,
}

impl Target {
    fn resolve(path: &EntityPath) -> Result<Self, ClientError> {
        let scope = if path.user_id.is_some() {
            Scope::User
        } else {
            Scope::Top
        };
        let descriptor = catalog::descriptor(scope, &path.key)
            .ok_or_else(|| ClientError::UnknownEntity(path.key.clone()))?;
        let base = match path.user_id {
            Some(uid) => format!("/users/{}/entities/{}", uid, descriptor.entity_key),
            None => format!("/entities/{}", descriptor.entity_key),
        };
        Ok(Self {
            descriptor,
            user_id: path.user_id,
            id: path.id,
            base,
        })
    }

    fn controller<'a>(&self, visitor: &'a Visitor) -> ResourceController<'a> {
        let controller = ResourceController::new(self.descriptor, &visitor.client);
        match self.user_id {
            Some(uid) => controller.for_user(uid),
            None => controller,
        }
    }

    fn title(&self, suffix: &str) -> String {
        let mut title = self.descriptor.display_name.clone();
        if !suffix.is_empty() {
            title.push(' ');
            title.push_str(suffix);
        }
        if let Some(uid) = self.user_id {
            title.push_str(&format!(" (User #{})", uid));
        }
        title
    }

    /// In-flight key: one pending mutation per visitor and entity.
    fn guard_key(&self, visitor: &Visitor) -> String {
        format!("{}:{}", visitor.session_id, self.base)
    }

    fn record_id(&self) -> Result<i64, ClientError> {
        self.id
            .ok_or_else(|| ClientError::Decode("missing record id in path".to_string()))
    }

    fn redirect(&self, message: &str) -> Response {
        Redirect::to(&format!("{}?message={}", self.base, message)).into_response()
    }
}

/// Resolve visitor and target, or produce the response that ends the request.
async fn prepare(
    state: &AppState,
    headers: &HeaderMap,
    path: &EntityPath,
) -> Result<(Visitor, Target), Response> {
    let Some(visitor) = Visitor::resolve(state, headers).await else {
        return Err(Redirect::to("/login").into_response());
    };
    match Target::resolve(path) {
        Ok(target) => Ok((visitor, target)),
        Err(e) => Err(visitor.failure(e, "/")),
    }
}

fn form_page(
    visitor: &Visitor,
    target: &Target,
    form: &FormState,
    errors: &ValidationErrors,
    mode: Mode,
    notice: Option<&str>,
) -> Response {
    let (action, title) = match (mode, target.id) {
        (Mode::Update, Some(id)) => (format!("{}/{}", target.base, id), target.title("- Edit")),
        _ => (target.base.clone(), target.title("- New")),
    };
    let mut body = html::flash(notice, "error");
    body.push_str(&html::form(
        target.descriptor,
        form,
        errors,
        &action,
        mode,
        &target.base,
    ));
    let response = visitor.page(&title, &body);
    if errors.is_empty() && notice.is_none() {
        response
    } else {
        (StatusCode::UNPROCESSABLE_ENTITY, response).into_response()
    }
}

/// GET /entities/{key} - List records as returned by the backend.
pub async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let records = match target
        .controller(&visitor)
        .list(Some(state.config.list_limit))
        .await
    {
        Ok(records) => records,
        Err(e) => return visitor.failure(e, "/"),
    };

    let mut body = html::flash(flash.message(), "success");
    body.push_str(&format!(
        "<p><a href=\"{}/new\">Add {}</a></p>",
        html::escape(&target.base),
        html::escape(&target.descriptor.display_name)
    ));
    body.push_str(&html::table(target.descriptor, &records, &target.base));
    visitor.page(&target.title(""), &body)
}

/// GET /entities/{key}/new - Empty create form.
pub async fn new_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let form = to_form_state(target.descriptor, None);
    form_page(
        &visitor,
        &target,
        &form,
        &ValidationErrors::default(),
        Mode::Create,
        None,
    )
}

/// POST /entities/{key} - Validate and create a record.
pub async fn create_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
    Form(submitted): Form<HashMap<String, String>>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let form = FormState::from_submission(target.descriptor, &submitted);
    let payload = match from_form_state(target.descriptor, &form, Mode::Create) {
        Ok(payload) => payload,
        Err(errors) => return form_page(&visitor, &target, &form, &errors, Mode::Create, None),
    };

    let Some(_ticket) = state.guard.begin(target.guard_key(&visitor)) else {
        let notice = ClientError::InFlight.message();
        return form_page(
            &visitor,
            &target,
            &form,
            &ValidationErrors::default(),
            Mode::Create,
            Some(&notice),
        );
    };

    match target.controller(&visitor).create(payload).await {
        Ok(record) => {
            tracing::info!(
                "Created {} record {:?}",
                target.descriptor.entity_key,
                record.id()
            );
            target.redirect("created")
        }
        Err(e) if e.is_unauthorized() => visitor.failure(e, &target.base),
        Err(e) => {
            let notice = format!("Error creating record: {}", e.message());
            form_page(
                &visitor,
                &target,
                &form,
                &ValidationErrors::default(),
                Mode::Create,
                Some(&notice),
            )
        }
    }
}

/// GET /entities/{key}/{id}/edit - Edit form seeded from the current record.
pub async fn edit_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let record = match target.record_id() {
        Ok(id) => target.controller(&visitor).get(id).await,
        Err(e) => Err(e),
    };
    match record {
        Ok(record) => {
            let form = to_form_state(target.descriptor, Some(&record));
            form_page(
                &visitor,
                &target,
                &form,
                &ValidationErrors::default(),
                Mode::Update,
                None,
            )
        }
        Err(e) => visitor.failure(e, &target.base),
    }
}

/// POST /entities/{key}/{id} - Validate and send the changed fields of a record.
pub async fn update_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
    Form(submitted): Form<HashMap<String, String>>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    let id = match target.record_id() {
        Ok(id) => id,
        Err(e) => return visitor.failure(e, &target.base),
    };

    let form = FormState::from_submission(target.descriptor, &submitted);
    let payload = match from_form_state(target.descriptor, &form, Mode::Update) {
        Ok(payload) => payload,
        Err(errors) => return form_page(&visitor, &target, &form, &errors, Mode::Update, None),
    };

    let Some(_ticket) = state.guard.begin(target.guard_key(&visitor)) else {
        let notice = ClientError::InFlight.message();
        return form_page(
            &visitor,
            &target,
            &form,
            &ValidationErrors::default(),
            Mode::Update,
            Some(&notice),
        );
    };

    let controller = target.controller(&visitor);
    let original = match controller.get(id).await {
        Ok(original) => original,
        Err(e) => return visitor.failure(e, &target.base),
    };

    let changed = changed_fields(&original, payload);
    if changed.is_empty() {
        return target.redirect("unchanged");
    }

    match controller.update(id, changed).await {
        Ok(_) => {
            tracing::info!("Updated {} record {}", target.descriptor.entity_key, id);
            target.redirect("updated")
        }
        Err(e) if e.is_unauthorized() => visitor.failure(e, &target.base),
        Err(e) => {
            let notice = format!("Error updating record: {}", e.message());
            form_page(
                &visitor,
                &target,
                &form,
                &ValidationErrors::default(),
                Mode::Update,
                Some(&notice),
            )
        }
    }
}

/// GET /entities/{key}/{id}/delete - Confirmation page; issues no API call.
pub async fn confirm_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    let id = match target.record_id() {
        Ok(id) => id,
        Err(e) => return visitor.failure(e, &target.base),
    };

    let body = html::confirm_delete(
        &target.descriptor.display_name,
        id,
        &format!("{}/{}/delete", target.base, id),
        &target.base,
    );
    visitor.page(&target.title("- Delete"), &body)
}

/// POST /entities/{key}/{id}/delete - Delete, only when the confirmation was submitted.
pub async fn delete_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<EntityPath>,
    Form(submitted): Form<HashMap<String, String>>,
) -> Response {
    let (visitor, target) = match prepare(&state, &headers, &path).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    let id = match target.record_id() {
        Ok(id) => id,
        Err(e) => return visitor.failure(e, &target.base),
    };

    if submitted.get("confirm").map(String::as_str) != Some("yes") {
        return visitor.failure(ClientError::NotConfirmed, &format!("{}/{}/delete", target.base, id));
    }

    let Some(_ticket) = state.guard.begin(target.guard_key(&visitor)) else {
        return visitor.failure(ClientError::InFlight, &target.base);
    };

    match target.controller(&visitor).delete(id).await {
        Ok(()) => {
            tracing::info!("Deleted {} record {}", target.descriptor.entity_key, id);
            target.redirect("deleted")
        }
        Err(e) => visitor.failure(e, &target.base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(user_id: Option<i64>, key: &str, id: Option<i64>) -> EntityPath {
        EntityPath {
            user_id,
            key: key.to_string(),
            id,
        }
    }

    #[test]
    fn test_target_resolves_scope_from_path() {
        let top = Target::resolve(&path(None, "turnos", Some(7))).unwrap();
        assert_eq!(top.base, "/entities/turnos");
        assert_eq!(top.title("- Edit"), "Shifts - Edit");

        let nested = Target::resolve(&path(Some(42), "horarios-base", None)).unwrap();
        assert_eq!(nested.base, "/users/42/entities/horarios-base");
        assert_eq!(nested.title(""), "Base Schedules (User #42)");
    }

    #[test]
    fn test_target_rejects_wrong_scope() {
        assert!(matches!(
            Target::resolve(&path(None, "dependents", None)),
            Err(ClientError::UnknownEntity(_))
        ));
        assert!(matches!(
            Target::resolve(&path(Some(1), "nope", None)),
            Err(ClientError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_flash_messages() {
        let flash = FlashQuery {
            message: Some("deleted".to_string()),
        };
        assert_eq!(flash.message(), Some("Record deleted successfully!"));
        assert_eq!(FlashQuery::default().message(), None);
        assert_eq!(
            FlashQuery {
                message: Some("<script>".to_string())
            }
            .message(),
            None
        );
    }
}
