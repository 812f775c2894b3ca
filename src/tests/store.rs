use serial_test::serial;

use messbuddy_shared::account::{Credentials, MessAccount, Role};
use messbuddy_shared::issue::{Issue, IssueStatus};

use super::reset_all;

fn credentials() -> Credentials {
    Credentials {
        name: "Asha Patil".to_string(),
        email: "asha@college.edu".to_string(),
        password: "kept-verbatim-by-the-store".to_string(),
        division: "B".to_string(),
        roll: Some(42),
        prn: "01234567890123".to_string(),
        batch: Some(2026),
    }
}

fn issue_draft(title: &str, category: &str) -> crate::issue::IssueDraft {
    crate::issue::IssueDraft {
        title: title.to_string(),
        details: "details".to_string(),
        media: Vec::new(),
        category: category.to_string(),
        author: Some("asha@college.edu".to_string()),
    }
}

#[serial]
#[tokio::test]
async fn credentials_roundtrip() {
    reset_all();

    let record = credentials();
    crate::account::CREDENTIALS.save(record.clone()).await.unwrap();

    assert_eq!(crate::account::CREDENTIALS.get(), Some(record));
}

#[serial]
#[tokio::test]
async fn update_password_touches_only_password() {
    reset_all();

    let record = credentials();
    crate::account::CREDENTIALS.save(record.clone()).await.unwrap();
    crate::account::CREDENTIALS
        .update_password("rotated".to_string())
        .await
        .unwrap();

    let got = crate::account::CREDENTIALS.get().unwrap();
    assert_eq!(got.password, "rotated");
    assert_eq!(
        got,
        Credentials {
            password: "rotated".to_string(),
            ..record
        }
    );
}

#[serial]
#[tokio::test]
async fn update_password_without_record_starts_empty() {
    reset_all();

    crate::account::CREDENTIALS
        .update_password("onlyfield".to_string())
        .await
        .unwrap();

    let got = crate::account::CREDENTIALS.get().unwrap();
    assert_eq!(got.password, "onlyfield");
    assert_eq!(got.email, "");
    assert_eq!(got.roll, None);
    assert_eq!(got.batch, None);
}

#[serial]
#[tokio::test]
async fn clear_removes_the_record() {
    reset_all();

    crate::account::CREDENTIALS.save(credentials()).await.unwrap();
    crate::account::CREDENTIALS.clear().await.unwrap();

    assert_eq!(crate::account::CREDENTIALS.get(), None);
}

#[serial]
#[tokio::test]
async fn seeding_is_idempotent() {
    reset_all();

    let first = crate::account::INSTANCE.ensure_seeded().await.unwrap();
    assert_eq!(first.len(), 4);
    assert!(first.iter().all(|a| a.role == Role::Mess));
    assert_eq!(
        first.iter().map(|a| a.username.as_str()).collect::<Vec<_>>(),
        vec!["Mess_A", "Mess_B", "Mess_C", "Mess_D"]
    );

    let second = crate::account::INSTANCE.ensure_seeded().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(crate::account::INSTANCE.get(), first);
}

#[serial]
#[tokio::test]
async fn seeding_keeps_existing_accounts() {
    reset_all();

    let custom = MessAccount {
        username: "Warden".to_string(),
        password: sha256::digest("wardenpw"),
        role: Role::Mess,
    };
    crate::account::INSTANCE.save(vec![custom.clone()]).await.unwrap();

    let got = crate::account::INSTANCE.ensure_seeded().await.unwrap();
    assert_eq!(got, vec![custom]);
}

#[serial]
#[tokio::test]
async fn issue_append_defaults_and_order() {
    reset_all();

    let leak = crate::issue::INSTANCE
        .append(issue_draft("Leak", "Quality issue"))
        .await
        .unwrap();
    assert_eq!(leak.status, IssueStatus::Open);
    assert_eq!(leak.stage, 0);
    assert!(leak.responses.is_empty());

    let spill = crate::issue::INSTANCE
        .append(issue_draft("Spill", ""))
        .await
        .unwrap();

    let all = crate::issue::INSTANCE.all();
    assert_eq!(
        all.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
        vec!["Spill", "Leak"]
    );
    assert_eq!(all[0].id, spill.id);
    assert_eq!(all[1].id, leak.id);
}

#[serial]
#[tokio::test]
async fn issue_ids_unique_under_rapid_appends() {
    reset_all();

    let mut ids = Vec::new();
    for i in 0..32 {
        ids.push(
            crate::issue::INSTANCE
                .append(issue_draft(&format!("issue {i}"), ""))
                .await
                .unwrap()
                .id,
        );
    }

    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[serial]
#[tokio::test]
async fn issue_save_replaces_and_clear_empties() {
    reset_all();

    let stored = crate::issue::INSTANCE
        .append(issue_draft("Leak", "Quality issue"))
        .await
        .unwrap();

    crate::issue::INSTANCE
        .save(vec![Issue {
            title: "Rewritten".to_string(),
            ..stored
        }])
        .await
        .unwrap();
    assert_eq!(crate::issue::INSTANCE.all()[0].title, "Rewritten");

    crate::issue::INSTANCE.clear().await.unwrap();
    assert!(crate::issue::INSTANCE.all().is_empty());
}

#[test]
fn corrupt_entries_decode_as_errors() {
    assert!(matches!(
        crate::store::decode::<Vec<MessAccount>>("{ not json"),
        Err(crate::store::Error::Corrupt(_))
    ));

    // a shape mismatch is corruption too
    assert!(matches!(
        crate::store::decode::<Credentials>("[1, 2, 3]"),
        Err(crate::store::Error::Corrupt(_))
    ));
}

#[serial]
#[tokio::test]
async fn entities_roundtrip_through_serialization() {
    reset_all();

    let record = credentials();
    let raw = serde_json::to_string(&record).unwrap();
    assert_eq!(crate::store::decode::<Credentials>(&raw).unwrap(), record);

    let accounts = crate::account::INSTANCE.ensure_seeded().await.unwrap();
    let raw = serde_json::to_string(&accounts).unwrap();
    assert_eq!(
        crate::store::decode::<Vec<MessAccount>>(&raw).unwrap(),
        accounts
    );

    let issue = crate::issue::INSTANCE
        .append(issue_draft("Leak", "Quality issue"))
        .await
        .unwrap();
    let raw = serde_json::to_string(&vec![issue.clone()]).unwrap();
    assert_eq!(crate::store::decode::<Vec<Issue>>(&raw).unwrap(), vec![issue]);
}
