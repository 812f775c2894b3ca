use axum::Json;
use serde_json::json;
use std::sync::atomic;

use crate::RequireAuthContext;
use crate::ResError;

use messbuddy_shared::update::handle::*;
use messbuddy_shared::update::Update;

/// Post a broadcast update as the mess role.
pub async fn post_update(
    ctx: RequireAuthContext,
    Json(descriptor): Json<PostUpdateDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    ctx.require_mess().map_err(ResError)?;

    if descriptor.title.trim().is_empty() {
        return Err(ResError(super::Error::TitleEmpty).into());
    }

    if let Some(hash) = descriptor.image {
        let cache = crate::issue::cache::INSTANCE.caches.read();
        match cache.iter().find(|e| e.hash == hash) {
            Some(e) => e.blocked.store(true, atomic::Ordering::Release),
            None => return Err(ResError(crate::issue::cache::Error::NotFound).into()),
        }
    }

    let update = super::INSTANCE
        .append(super::UpdateDraft {
            title: descriptor.title,
            description: descriptor.description,
            image: descriptor.image,
            category: descriptor.category,
            urgent: descriptor.urgent,
        })
        .await
        .map_err(ResError)?;

    Ok(Json(json!({ "update_id": update.id })))
}

/// Get the updates matching every filter, newest first.
pub async fn get_updates(
    _ctx: RequireAuthContext,
    Json(descriptor): Json<GetUpdatesDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let updates: Vec<Update> = super::INSTANCE
        .all()
        .into_iter()
        .filter(|u| {
            descriptor
                .filters
                .iter()
                .all(|f| matches_get_update_filter(f, u))
        })
        .collect();

    Ok(Json(json!({ "updates": updates })))
}

/// If the target update matches this filter.
fn matches_get_update_filter(filter: &GetUpdatesFilter, update: &Update) -> bool {
    match filter {
        GetUpdatesFilter::After(date) => update.time.date_naive() >= *date,
        GetUpdatesFilter::Before(date) => update.time.date_naive() <= *date,
        GetUpdatesFilter::Category(category) => update.category.as_deref() == Some(category.as_str()),
        GetUpdatesFilter::Urgent => update.urgent,
    }
}
