//! Dashboard and employee detail pages.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tokio::task::JoinSet;

use super::{html, FlashQuery, Visitor};
use crate::errors::ClientError;
use crate::models::{catalog, Scope};
use crate::resource::ResourceController;
use crate::AppState;

/// GET / - Record counts per top-level entity.
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let Some(visitor) = Visitor::resolve(&state, &headers).await else {
        return Redirect::to("/login").into_response();
    };

    let mut counts = JoinSet::new();
    for (index, descriptor) in catalog::descriptors(Scope::Top).iter().enumerate() {
        let client = visitor.client.clone();
        counts.spawn(async move {
            let count = ResourceController::new(descriptor, &client).count().await;
            (index, count)
        });
    }

    let mut results: Vec<Option<Result<usize, ClientError>>> =
        (0..catalog::descriptors(Scope::Top).len()).map(|_| None).collect();
    while let Some(joined) = counts.join_next().await {
        match joined {
            Ok((index, count)) => results[index] = Some(count),
            Err(e) => tracing::error!("Dashboard count task failed: {}", e),
        }
    }

    let mut body = html::flash(flash.message(), "success");
    body.push_str("<ul class=\"cards\">");
    for (descriptor, result) in catalog::descriptors(Scope::Top).iter().zip(results) {
        let count = match result {
            Some(Ok(n)) => n.to_string(),
            Some(Err(e)) if e.is_unauthorized() => {
                return Redirect::to("/login?expired=1").into_response();
            }
            Some(Err(e)) => {
                tracing::warn!("Count for {} unavailable: {}", descriptor.entity_key, e);
                "-".to_string()
            }
            None => "-".to_string(),
        };
        body.push_str(&format!(
            "<li><a href=\"/entities/{}\"><strong>{}</strong></a> <span class=\"count\">{}</span><br><small>{}</small></li>",
            html::escape(&descriptor.entity_key),
            html::escape(&descriptor.display_name),
            count,
            html::escape(&descriptor.description)
        ));
    }
    body.push_str("</ul>");

    visitor.page("Master Data Management", &body)
}

/// GET /users/{user_id} - Employee record with links to the per-employee entities.
pub async fn user_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> Response {
    let Some(visitor) = Visitor::resolve(&state, &headers).await else {
        return Redirect::to("/login").into_response();
    };

    let Some(users) = catalog::descriptor(Scope::Top, "users") else {
        return visitor.failure(ClientError::UnknownEntity("users".to_string()), "/");
    };

    let user = match ResourceController::new(users, &visitor.client)
        .get(user_id)
        .await
    {
        Ok(user) => user,
        Err(e) => return visitor.failure(e, "/entities/users"),
    };

    let mut body = String::from("<dl>");
    for (key, spec) in users.fields.iter().filter(|(_, f)| !f.create_only) {
        body.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>",
            html::escape(&spec.label),
            html::escape(&html::cell_text(user.get(key)))
        ));
    }
    body.push_str("</dl><h2>Employee records</h2><ul>");
    for descriptor in catalog::descriptors(Scope::User) {
        body.push_str(&format!(
            "<li><a href=\"/users/{}/entities/{}\">{}</a></li>",
            user_id,
            html::escape(&descriptor.entity_key),
            html::escape(&descriptor.display_name)
        ));
    }
    body.push_str(&format!(
        "</ul><p><a href=\"/entities/users/{}/edit\">Edit user</a></p>",
        user_id
    ));

    let title = user
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("User #{}", user_id));
    visitor.page(&title, &body)
}
