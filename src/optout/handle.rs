use axum::Json;
use serde_json::json;
use std::collections::BTreeMap;

use crate::RequireAuthContext;
use crate::ResError;

use messbuddy_shared::meal::MEALS;
use messbuddy_shared::optout::handle::*;

/// Declare skipped meals, for one meal or a whole-day range.
pub async fn submit_opt_out(
    ctx: RequireAuthContext,
    Json(descriptor): Json<SubmitOptOutDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let author = ctx.require_student().map_err(ResError)?.to_string();

    if descriptor.end_date < descriptor.start_date {
        return Err(ResError(super::Error::DateRangeInverted).into());
    }
    if (descriptor.end_date - descriptor.start_date).num_days() > super::MAX_RANGE_DAYS {
        return Err(ResError(super::Error::DateOutOfRange).into());
    }

    let opt_out = super::INSTANCE
        .append(super::OptOutDraft {
            author,
            meal: descriptor.meal,
            start_date: descriptor.start_date,
            end_date: descriptor.end_date,
            reason: descriptor.reason,
        })
        .await
        .map_err(ResError)?;

    Ok(Json(json!({ "opt_out_id": opt_out.id })))
}

/// Get the requesting student's own declarations, newest first.
pub async fn get_opt_outs(
    ctx: RequireAuthContext,
) -> axum::response::Result<Json<serde_json::Value>> {
    let author = ctx.require_student().map_err(ResError)?.to_string();

    let opt_outs: Vec<_> = super::INSTANCE
        .all()
        .into_iter()
        .filter(|o| o.author == author)
        .collect();

    Ok(Json(json!({ "opt_outs": opt_outs })))
}

/// Aggregate per-day per-meal opt-out counts for the mess role.
pub async fn overview(
    ctx: RequireAuthContext,
    Json(descriptor): Json<OverviewDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    ctx.require_mess().map_err(ResError)?;

    if descriptor.end_date < descriptor.start_date {
        return Err(ResError(super::Error::DateRangeInverted).into());
    }
    if (descriptor.end_date - descriptor.start_date).num_days() > super::MAX_RANGE_DAYS {
        return Err(ResError(super::Error::DateOutOfRange).into());
    }

    let total_students = crate::config::INSTANCE.mess.total_students;
    let mut days = Vec::new();
    let mut date = descriptor.start_date;

    while date <= descriptor.end_date {
        let mut opt_out = BTreeMap::new();
        for meal in MEALS {
            opt_out.insert(meal.key().to_string(), super::INSTANCE.count(date, meal));
        }

        days.push(DayOverview {
            date,
            total_students,
            opt_out,
        });

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(Json(json!({ "days": days })))
}
