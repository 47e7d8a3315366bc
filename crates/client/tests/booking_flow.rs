use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

use movemate_client::transport::{HttpMethod, ScriptedTransport};
use movemate_client::BookingController;
use movemate_core::coordinates::Coordinates;
use movemate_core::domain::draft::DraftSource;
use movemate_core::domain::item::MovingItem;
use movemate_core::domain::request::{RequestId, RequestType};
use movemate_core::flows::BookingStep;
use movemate_core::payload::format_payload;
use movemate_core::session::{ApplyStatus, BookingSession};
use movemate_db::repositories::{
    DraftRepository, InMemoryKeyValueStore, LocalDraftRepository, SqlKeyValueStore,
};
use movemate_db::{connect, migrations};

fn fill_instant_contact(session: &mut BookingSession) {
    session.set_request_type(RequestType::Instant);
    let values = session.values_mut();
    values.contact.contact_name = "Grace Hopper".to_string();
    values.contact.contact_phone = "+1 555 0101".to_string();
    values.contact.contact_email = "grace@example.com".to_string();
    values.pickup.address = "12 Harbour St".to_string();
    values.dropoff.address = "98 Hill Rd".to_string();
}

#[tokio::test]
async fn instant_request_first_step_creates_request_and_local_draft() {
    let transport = Arc::new(ScriptedTransport::new());
    let repository = Arc::new(LocalDraftRepository::new(InMemoryKeyValueStore::default()));
    let mut controller =
        BookingController::open(BookingSession::default(), Arc::clone(&transport), Arc::clone(&repository))
            .await
            .expect("controller opens");

    fill_instant_contact(controller.session_mut());
    let preview = format_payload(BookingStep::Contact, controller.session().values());
    assert!(!preview.contains_key("journey_stops"));
    assert!(!preview.contains_key("moving_items"));

    transport.respond(201, json!({"request_id": "R1"}));
    let status = controller.submit_current_step().await.expect("step 1 accepted");

    assert_eq!(status, ApplyStatus::Applied);
    assert_eq!(controller.session().request_id(), Some(&RequestId("R1".to_string())));
    let request = &transport.requests()[0];
    assert_eq!((request.method, request.path.as_str()), (HttpMethod::Post, "/requests/"));

    let stored = repository.load_local().await.expect("local drafts load");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, RequestId("R1".to_string()));
    assert_eq!(stored[0].source, DraftSource::Local);
    assert!(controller.drafts().book().get(&RequestId("R1".to_string()), DraftSource::Local).is_some());

    assert_eq!(controller.advance().expect("advance"), BookingStep::Locations);
    assert_eq!(controller.session().step(), BookingStep::Locations);
}

#[tokio::test]
async fn four_steps_complete_against_sqlite_backed_drafts() {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("movemate.db");
    let pool = connect(&format!("sqlite://{}", db_path.display())).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    let repository = Arc::new(LocalDraftRepository::new(SqlKeyValueStore::new(pool.clone())));

    let transport = Arc::new(ScriptedTransport::new());
    transport
        .respond(201, json!({"request_id": 41}))
        .respond(200, json!({"base_price": "180.00", "staff_count": 2}))
        .respond(200, json!({}))
        .respond(200, json!({"final_price": "199.99"}))
        .respond(200, json!({"status": "submitted"}));

    let mut controller =
        BookingController::open(BookingSession::default(), Arc::clone(&transport), Arc::clone(&repository))
            .await
            .expect("controller opens");

    fill_instant_contact(controller.session_mut());
    assert_eq!(controller.submit_and_advance().await.expect("step 1"), BookingStep::Locations);

    {
        let values = controller.session_mut().values_mut();
        values.pickup.coordinates = Coordinates::new(51.5, -0.12);
        values.dropoff.coordinates = Coordinates::new(51.52, -0.08);
    }
    assert_eq!(controller.submit_and_advance().await.expect("step 2"), BookingStep::Items);

    controller.session_mut().values_mut().moving_items.push(MovingItem {
        name: "Sofa".to_string(),
        quantity: 1,
        photo_preview_url: Some("blob:local-preview".to_string()),
        ..MovingItem::default()
    });
    assert_eq!(controller.submit_and_advance().await.expect("step 3"), BookingStep::Schedule);

    controller.session_mut().values_mut().schedule.preferred_date = NaiveDate::from_ymd_opt(2026, 11, 2);
    assert_eq!(controller.submit_current_step().await.expect("step 4"), ApplyStatus::Applied);
    assert_eq!(
        controller.session().values().commercial.final_price.map(|price| price.to_string()),
        Some("199.99".to_string())
    );
    assert_eq!(controller.session().values().commercial.staff_count, Some(2));

    let requests = transport.requests();
    let paths: Vec<_> = requests.iter().map(|request| request.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/requests/", "/requests/41/step2/", "/requests/41/step3/", "/requests/41/step4/"]
    );
    let items_body = requests[2].body.as_ref().expect("step 3 body");
    assert!(items_body["moving_items"][0].get("photo_preview_url").is_none());

    assert_eq!(repository.load_local().await.expect("drafts").len(), 1);

    controller.complete_booking().await.expect("booking completes");
    assert_eq!(controller.session().step(), BookingStep::Contact);
    assert_eq!(controller.session().request_id(), None);
    assert!(repository.load_local().await.expect("drafts").is_empty());
    assert_eq!(transport.requests()[4].path, "/requests/41/submit/");

    pool.close().await;
}

#[tokio::test]
async fn resumed_draft_resubmits_in_edit_mode() {
    let transport = Arc::new(ScriptedTransport::new());
    let repository = Arc::new(LocalDraftRepository::new(InMemoryKeyValueStore::default()));
    let mut controller =
        BookingController::open(BookingSession::default(), Arc::clone(&transport), Arc::clone(&repository))
            .await
            .expect("controller opens");

    fill_instant_contact(controller.session_mut());
    transport.respond(201, json!({"request_id": "R7"})).respond(200, json!({"request_id": "R7"}));
    controller.submit_current_step().await.expect("created");
    controller.session_mut().reset();

    controller.resume_draft(&RequestId("R7".to_string()), DraftSource::Local).expect("resumed");
    controller.session_mut().values_mut().contact.contact_phone = "+1 555 0199".to_string();
    controller.submit_current_step().await.expect("updated");

    let request = &transport.requests()[1];
    assert_eq!((request.method, request.path.as_str()), (HttpMethod::Put, "/requests/R7/"));
    let stored = repository.load_local().await.expect("drafts");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data.contact.contact_phone, "+1 555 0199");
}
