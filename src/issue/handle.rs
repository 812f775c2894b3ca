use axum::body::Bytes;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use std::ops::{Deref, DerefMut};
use std::sync::atomic;

use super::cache::MediaCache;
use super::{Issue, IssueStatus, StageResponse, STAGES};
use crate::account::session::Identity;
use crate::RequireAuthContext;
use crate::ResError;

use messbuddy_shared::issue::handle::*;

/// Read and store an uploaded attachment with its cache hash returned.
pub async fn upload_media(
    ctx: RequireAuthContext,
    bytes: Bytes,
) -> axum::response::Result<Json<serde_json::Value>> {
    let uploader = match &ctx.identity {
        Identity::Student(email) => email.clone(),
        Identity::Mess(username) => username.clone(),
    };

    let cache = MediaCache::new(&bytes, uploader).map_err(ResError)?;
    let hash = cache.hash;

    super::cache::INSTANCE.push(cache);

    Ok(Json(json!({ "hash": hash })))
}

/// Get image png bytes from the target media cache hash.
pub async fn get_media(
    _ctx: RequireAuthContext,
    Json(descriptor): Json<GetMediaDescriptor>,
) -> axum::response::Result<Vec<u8>> {
    if let Some(_media) = super::cache::INSTANCE
        .caches
        .read()
        .iter()
        .find(|e| e.hash == descriptor.hash)
    {
        #[cfg(not(test))]
        return std::fs::read(format!("./data/media/{}.png", _media.hash))
            .map_err(|_| ResError(super::cache::Error::NotFound).into());

        #[cfg(test)]
        unreachable!("test not covered");
    }

    Err(ResError(super::cache::Error::NotFound).into())
}

/// Raise a new issue, which enters the ladder open at stage 0 with no
/// responses.
pub async fn raise_issue(
    ctx: RequireAuthContext,
    Json(descriptor): Json<RaiseIssueDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let author = ctx.require_student().map_err(ResError)?.to_string();

    if descriptor.title.trim().is_empty() {
        return Err(ResError(super::Error::TitleEmpty).into());
    }
    if descriptor.details.trim().is_empty() {
        return Err(ResError(super::Error::DetailsEmpty).into());
    }
    if descriptor.media.len() > super::MAX_MEDIA {
        return Err(ResError(super::Error::TooManyAttachments).into());
    }

    {
        let cache = super::cache::INSTANCE.caches.read();

        if descriptor
            .media
            .iter()
            .any(|hash| !cache.iter().any(|e| e.hash == *hash))
        {
            return Err(ResError(super::cache::Error::NotFound).into());
        }

        descriptor.media.iter().for_each(|hash| {
            cache
                .iter()
                .find(|e| e.hash == *hash)
                .unwrap()
                .blocked
                .store(true, atomic::Ordering::Release)
        });
    }

    let issue = super::INSTANCE
        .append(super::IssueDraft {
            title: descriptor.title,
            details: descriptor.details,
            media: descriptor.media,
            category: descriptor.category,
            author: Some(author),
        })
        .await
        .map_err(ResError)?;

    Ok(Json(json!({ "issue_id": issue.id })))
}

/// Get ids of the issues matching every filter, newest first.
pub async fn get_issues(
    ctx: RequireAuthContext,
    Json(descriptor): Json<GetIssuesDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let mut issues = Vec::new();

    super::INSTANCE.issues.read().iter().for_each(|e| {
        let ir = e.read();

        if visible_to(&ctx.identity, ir.deref())
            && descriptor
                .filters
                .iter()
                .all(|f| matches_get_issue_filter(f, ir.deref()))
        {
            issues.push(ir.id);
        }
    });

    Ok(Json(json!({ "issues": issues })))
}

/// If the target issue matches this filter.
fn matches_get_issue_filter(filter: &GetIssuesFilter, issue: &Issue) -> bool {
    match filter {
        GetIssuesFilter::Author(author) => issue.author.as_deref() == Some(author.as_str()),
        GetIssuesFilter::Before(date) => issue.time.date_naive() <= *date,
        GetIssuesFilter::After(date) => issue.time.date_naive() >= *date,
        GetIssuesFilter::Category(category) => &issue.category == category,
        GetIssuesFilter::Keyword(keywords) => keywords
            .split_whitespace()
            .all(|k| issue.title.contains(k) || issue.details.contains(k)),
        GetIssuesFilter::Stage(stage) => issue.stage == *stage,
        GetIssuesFilter::Status(status) => issue.status == *status,
    }
}

/// If the requesting account may see the full record: the author, or
/// any mess account.
fn visible_to(identity: &Identity, issue: &Issue) -> bool {
    match identity {
        Identity::Student(email) => issue.author.as_deref() == Some(email.as_str()),
        Identity::Mess(_) => true,
    }
}

/// Get full records of the target issues.
pub async fn get_issues_info(
    ctx: RequireAuthContext,
    Json(descriptor): Json<GetIssuesInfoDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let mut results = Vec::new();
    let issues = super::INSTANCE.issues.read();

    for id in descriptor.issues.iter() {
        let found = issues.iter().find_map(|e| {
            let ir = e.read();
            (ir.id == *id && visible_to(&ctx.identity, ir.deref())).then(|| ir.clone())
        });

        results.push(match found {
            Some(issue) => GetIssueInfoResult::Full(issue),
            None => GetIssueInfoResult::NotFound(*id),
        });
    }

    Ok(Json(json!({ "results": results })))
}

/// Edit an issue as its author.
pub async fn edit_issue(
    ctx: RequireAuthContext,
    Json(descriptor): Json<EditIssueDescriptor>,
) -> axum::response::Result<()> {
    let author = ctx.require_student().map_err(ResError)?.to_string();

    {
        let issues = super::INSTANCE.issues.read();
        let issue = issues
            .iter()
            .find(|e| e.read().id == descriptor.issue)
            .ok_or(ResError(super::Error::NotFound))?;

        if issue.read().author.as_deref() != Some(author.as_str()) {
            return Err(ResError(crate::account::Error::PermissionDenied).into());
        }

        for variant in descriptor.variants.iter() {
            apply_edit_issue_variant(variant, issue.write().deref_mut()).map_err(ResError)?;
        }
    }

    super::INSTANCE.persist().await.map_err(ResError)?;
    Ok(())
}

/// Apply this edition, return an err if error occurs.
fn apply_edit_issue_variant(
    variant: &EditIssueVariant,
    issue: &mut Issue,
) -> Result<(), super::Error> {
    match variant {
        EditIssueVariant::Cancel => {
            if issue.status != IssueStatus::Open {
                return Err(super::Error::Already(issue.status));
            }
            issue.status = IssueStatus::Cancelled;
        }

        EditIssueVariant::Category(value) => issue.category = value.clone(),

        EditIssueVariant::Details(value) => {
            if value.trim().is_empty() {
                return Err(super::Error::DetailsEmpty);
            }
            issue.details = value.clone();
        }

        EditIssueVariant::Media(media) => {
            if media.len() > super::MAX_MEDIA {
                return Err(super::Error::TooManyAttachments);
            }

            let cache = super::cache::INSTANCE.caches.read();
            for hash in media.iter() {
                if !cache.iter().any(|e| e.hash == *hash) {
                    return Err(super::Error::Cache(super::cache::Error::NotFound));
                }
            }

            for hash in issue.media.iter() {
                if let Some(e) = cache.iter().find(|e| e.hash == *hash) {
                    e.blocked.store(false, atomic::Ordering::Release)
                }
            }
            for hash in media.iter() {
                cache
                    .iter()
                    .find(|e| e.hash == *hash)
                    .unwrap()
                    .blocked
                    .store(true, atomic::Ordering::Release)
            }

            issue.media = media.clone();
        }

        EditIssueVariant::Title(value) => {
            if value.trim().is_empty() {
                return Err(super::Error::TitleEmpty);
            }
            issue.title = value.clone();
        }
    }

    Ok(())
}

/// Move an issue along the ladder as the mess role.
pub async fn advance_issue(
    ctx: RequireAuthContext,
    Json(descriptor): Json<AdvanceIssueDescriptor>,
) -> axum::response::Result<()> {
    ctx.require_mess().map_err(ResError)?;

    {
        let issues = super::INSTANCE.issues.read();
        let issue = issues
            .iter()
            .find(|e| e.read().id == descriptor.issue)
            .ok_or(ResError(super::Error::NotFound))?;
        let mut iw = issue.write();

        if iw.status != IssueStatus::Open {
            return Err(ResError(super::Error::Already(iw.status)).into());
        }

        let (AdvanceIssueVariant::Forward(text)
        | AdvanceIssueVariant::Respond(text)
        | AdvanceIssueVariant::Resolve(text)) = &descriptor.variant;
        if text.trim().is_empty() {
            return Err(ResError(super::Error::MsgEmpty).into());
        }

        match &descriptor.variant {
            AdvanceIssueVariant::Forward(_) => {
                // the receiving stage acknowledges with the message
                if iw.stage as usize + 1 >= STAGES.len() {
                    return Err(ResError(super::Error::LadderExhausted).into());
                }
                iw.stage += 1;
                let stage = iw.stage;
                record_response(&mut iw, stage, text);
            }
            AdvanceIssueVariant::Respond(_) => {
                let stage = iw.stage;
                record_response(&mut iw, stage, text);
            }
            AdvanceIssueVariant::Resolve(_) => {
                let stage = iw.stage;
                record_response(&mut iw, stage, text);
                iw.status = IssueStatus::Resolved;
            }
        }
    }

    super::INSTANCE.persist().await.map_err(ResError)?;
    Ok(())
}

/// Record `text` as the response at the target stage, attributed to
/// that stage's authority. Re-responding at a stage overwrites the
/// previous response.
fn record_response(issue: &mut Issue, stage: u32, text: &str) {
    issue.responses.insert(
        stage,
        StageResponse {
            actor: STAGES[stage as usize].to_string(),
            text: text.to_string(),
            time: Utc::now(),
        },
    );
}
