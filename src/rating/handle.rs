use axum::Json;
use serde_json::json;
use std::collections::BTreeMap;

use crate::RequireAuthContext;
use crate::ResError;

use messbuddy_shared::meal::MEALS;
use messbuddy_shared::rating::handle::*;

/// Rate one served meal as a student.
pub async fn submit_rating(
    ctx: RequireAuthContext,
    Json(descriptor): Json<SubmitRatingDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let author = ctx.require_student().map_err(ResError)?.to_string();

    if !(1..=5).contains(&descriptor.stars) {
        return Err(ResError(super::Error::StarsOutOfRange).into());
    }

    let rating = super::INSTANCE
        .append(super::RatingDraft {
            author,
            meal: descriptor.meal,
            date: descriptor.date,
            stars: descriptor.stars,
            text: descriptor.text,
        })
        .await
        .map_err(ResError)?;

    Ok(Json(json!({ "rating_id": rating.id })))
}

/// Get one day's ratings and per-meal averages for the mess role.
pub async fn get_ratings(
    ctx: RequireAuthContext,
    Json(descriptor): Json<GetRatingsDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    ctx.require_mess().map_err(ResError)?;

    let ratings: Vec<_> = super::INSTANCE
        .all()
        .into_iter()
        .filter(|r| r.date == descriptor.date)
        .collect();

    let mut averages = BTreeMap::new();
    for meal in MEALS {
        if let Some(average) = super::INSTANCE.average(descriptor.date, meal) {
            averages.insert(meal.key().to_string(), average);
        }
    }

    Ok(Json(json!({ "ratings": ratings, "averages": averages })))
}
