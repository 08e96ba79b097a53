use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use futures::future::join_all;
use mockall::mock;

use appointment_cell::models::{AppointmentError, BookAppointmentRequest, Decision};
use appointment_cell::services::AppointmentScheduler;
use notification_cell::{ApprovalNotice, BookingNotice, Notifier, RejectionNotice};
use shared_database::{ClinicStore, InMemoryStore};
use shared_models::clinic::{AppointmentStatus, Condition, NewDoctor, NewPrediction, NewUser, Outcome};

mock! {
    pub TestNotifier {}

    #[async_trait]
    impl Notifier for TestNotifier {
        async fn notify_booked(&self, notice: &BookingNotice) -> bool;
        async fn notify_approved(&self, notice: &ApprovalNotice) -> bool;
        async fn notify_rejected(&self, notice: &RejectionNotice) -> bool;
    }
}

struct SlowNotifier;

#[async_trait]
impl Notifier for SlowNotifier {
    async fn notify_booked(&self, _notice: &BookingNotice) -> bool {
        tokio::time::sleep(Duration::from_secs(5)).await;
        true
    }

    async fn notify_approved(&self, _notice: &ApprovalNotice) -> bool {
        true
    }

    async fn notify_rejected(&self, _notice: &RejectionNotice) -> bool {
        true
    }
}

fn quiet_notifier() -> MockTestNotifier {
    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().returning(|_| true);
    notifier
}

async fn seeded_store() -> (Arc<InMemoryStore>, i64, i64) {
    let store = Arc::new(InMemoryStore::new());
    let patient = store
        .insert_user(NewUser {
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Jane Doe".to_string(),
            phone: None,
            gender: Some("female".to_string()),
        })
        .await
        .unwrap();
    let doctor = store
        .insert_doctor(NewDoctor {
            username: "dr.x".to_string(),
            email: "dr.x@hospital.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Dr. X".to_string(),
            phone: None,
            specialization: "Cardiologist".to_string(),
            qualification: None,
            experience_years: Some(5),
        })
        .await
        .unwrap();
    (store, patient.id, doctor.id)
}

fn scheduler(store: Arc<InMemoryStore>, notifier: impl Notifier + 'static) -> AppointmentScheduler {
    AppointmentScheduler::new(store, Arc::new(notifier), Duration::from_millis(200))
}

fn request(time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        provider_name: "Dr. X".to_string(),
        specialization: "Cardiologist".to_string(),
        appointment_date: "2024-05-01".to_string(),
        appointment_time: time.to_string(),
        prediction_id: None,
        notes: Some("  chest pain  ".to_string()),
    }
}

#[tokio::test]
async fn test_second_booking_for_same_slot_conflicts() {
    let (store, patient_id, doctor_id) = seeded_store().await;
    let scheduler = scheduler(store, quiet_notifier());

    let first = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("10:00")).unwrap())
        .await
        .unwrap();
    assert_eq!(first.appointment.status, AppointmentStatus::Pending);
    assert_eq!(first.appointment.provider_id, Some(doctor_id));
    assert_eq!(first.appointment.notes.as_deref(), Some("chest pain"));

    let second = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("10:00:00")).unwrap())
        .await;
    assert_matches!(second, Err(AppointmentError::SlotConflict(_)));
}

#[tokio::test]
async fn test_concurrent_bookings_yield_exactly_one_success() {
    let (store, patient_id, _) = seeded_store().await;
    let scheduler = Arc::new(scheduler(store.clone(), quiet_notifier()));

    let attempts = (0..8).map(|_| {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            let command = scheduler
                .validate_booking_request(patient_id, request("10:00"))
                .unwrap();
            scheduler.book(command).await.map(|booked| booked.appointment.id)
        })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppointmentError::SlotConflict(_))));

    let slot = scheduler
        .validate_booking_request(patient_id, request("10:00"))
        .unwrap()
        .slot();
    assert_eq!(store.query_appointments_by_slot(&slot).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_approval_sends_exactly_one_confirmation() {
    let (store, patient_id, doctor_id) = seeded_store().await;

    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().times(1).returning(|_| true);
    notifier
        .expect_notify_approved()
        .withf(|notice| notice.patient_email == "jane@example.com" && notice.doctor_name == "Dr. X")
        .times(1)
        .returning(|_| true);
    notifier.expect_notify_rejected().never();

    let scheduler = scheduler(store, notifier);
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("10:00")).unwrap())
        .await
        .unwrap();
    assert!(booked.notification.outcome().await);

    let decided = scheduler
        .decide(booked.appointment.id, Decision::Approved, doctor_id, None)
        .await
        .unwrap();

    assert_eq!(decided.appointment.status, AppointmentStatus::Approved);
    assert!(decided.appointment.decided_at.is_some());
    assert_eq!(decided.appointment.decided_by, Some(doctor_id));
    assert!(decided.notification.outcome().await);
}

#[tokio::test]
async fn test_redeciding_is_rejected_without_notification() {
    let (store, patient_id, doctor_id) = seeded_store().await;

    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().returning(|_| true);
    notifier.expect_notify_approved().times(1).returning(|_| true);
    notifier.expect_notify_rejected().never();

    let scheduler = scheduler(store.clone(), notifier);
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("11:00")).unwrap())
        .await
        .unwrap();

    let approved = scheduler
        .decide(booked.appointment.id, Decision::Approved, doctor_id, None)
        .await
        .unwrap();
    approved.notification.outcome().await;

    let again = scheduler
        .decide(
            booked.appointment.id,
            Decision::Rejected,
            doctor_id,
            Some("changed my mind".to_string()),
        )
        .await;
    assert_matches!(
        again,
        Err(AppointmentError::InvalidStatusTransition { current: AppointmentStatus::Approved })
    );

    let stored = store
        .query_appointment_by_id(booked.appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Approved);
    assert_eq!(stored.reason, None);
}

#[tokio::test]
async fn test_rejection_carries_reason_and_frees_slot() {
    let (store, patient_id, doctor_id) = seeded_store().await;

    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().returning(|_| true);
    notifier
        .expect_notify_rejected()
        .withf(|notice| notice.reason.as_deref() == Some("Doctor on leave"))
        .times(1)
        .returning(|_| true);

    let scheduler = scheduler(store, notifier);
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("12:00")).unwrap())
        .await
        .unwrap();

    let rejected = scheduler
        .decide(
            booked.appointment.id,
            Decision::Rejected,
            doctor_id,
            Some("Doctor on leave".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.appointment.reason.as_deref(), Some("Doctor on leave"));
    assert!(rejected.notification.outcome().await);

    let rebooked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("12:00")).unwrap())
        .await;
    assert!(rebooked.is_ok());
}

#[tokio::test]
async fn test_deciding_unknown_appointment_is_not_found() {
    let (store, _, doctor_id) = seeded_store().await;
    let scheduler = scheduler(store, MockTestNotifier::new());

    assert_matches!(
        scheduler.decide(9_999, Decision::Approved, doctor_id, None).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn test_failed_notification_does_not_fail_booking() {
    let (store, patient_id, _) = seeded_store().await;

    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().times(1).returning(|_| false);

    let scheduler = scheduler(store.clone(), notifier);
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("13:00")).unwrap())
        .await
        .unwrap();

    assert!(!booked.notification.outcome().await);
    assert!(store
        .query_appointment_by_id(booked.appointment.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_slow_notification_is_bounded() {
    let (store, patient_id, _) = seeded_store().await;
    let scheduler = scheduler(store, SlowNotifier);

    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("14:00")).unwrap())
        .await
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(2), booked.notification.outcome())
        .await
        .unwrap();
    assert!(!outcome);
}

#[tokio::test]
async fn test_unknown_provider_still_books_without_id() {
    let (store, patient_id, _) = seeded_store().await;
    let scheduler = scheduler(store, quiet_notifier());

    let mut unknown = request("15:00");
    unknown.provider_name = "Dr. Nobody".to_string();

    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, unknown).unwrap())
        .await
        .unwrap();
    assert_eq!(booked.appointment.provider_id, None);
}

#[tokio::test]
async fn test_malformed_requests_fail_validation() {
    let (store, patient_id, _) = seeded_store().await;
    let scheduler = scheduler(store, MockTestNotifier::new());

    let mut bad_date = request("10:00");
    bad_date.appointment_date = "01/05/2024".to_string();
    assert_matches!(
        scheduler.validate_booking_request(patient_id, bad_date),
        Err(AppointmentError::ValidationError(_))
    );

    assert_matches!(
        scheduler.validate_booking_request(patient_id, request("25:61")),
        Err(AppointmentError::ValidationError(_))
    );

    let mut blank = request("10:00");
    blank.provider_name = "   ".to_string();
    assert_matches!(
        scheduler.validate_booking_request(patient_id, blank),
        Err(AppointmentError::ValidationError(msg)) if msg.contains("doctor_name")
    );
}

#[tokio::test]
async fn test_concurrent_decisions_yield_exactly_one_success() {
    let (store, patient_id, doctor_id) = seeded_store().await;

    let sent = Arc::new(AtomicUsize::new(0));
    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().returning(|_| true);
    let approved_count = sent.clone();
    notifier.expect_notify_approved().returning(move |_| {
        approved_count.fetch_add(1, Ordering::SeqCst);
        true
    });
    let rejected_count = sent.clone();
    notifier.expect_notify_rejected().returning(move |_| {
        rejected_count.fetch_add(1, Ordering::SeqCst);
        true
    });

    let scheduler = Arc::new(scheduler(store.clone(), notifier));
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("16:00")).unwrap())
        .await
        .unwrap();
    booked.notification.outcome().await;
    let appointment_id = booked.appointment.id;

    let attempts = (0..8).map(|i| {
        let scheduler = scheduler.clone();
        let decision = if i % 2 == 0 { Decision::Approved } else { Decision::Rejected };
        tokio::spawn(async move {
            scheduler
                .decide(appointment_id, decision, doctor_id, Some(format!("attempt {}", i)))
                .await
        })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut winners = Vec::new();
    for result in results {
        match result {
            Ok(decided) => winners.push(decided),
            Err(e) => assert_matches!(e, AppointmentError::InvalidStatusTransition { .. }),
        }
    }
    assert_eq!(winners.len(), 1);

    let winner = winners.remove(0);
    let final_status = winner.appointment.status;
    assert!(winner.notification.outcome().await);
    assert_eq!(sent.load(Ordering::SeqCst), 1);

    let stored = store.query_appointment_by_id(appointment_id).await.unwrap().unwrap();
    assert_eq!(stored.status, final_status);
}

#[tokio::test]
async fn test_unknown_prediction_reference_fails_validation() {
    let (store, patient_id, _) = seeded_store().await;
    let scheduler = scheduler(store.clone(), quiet_notifier());

    let mut dangling = request("17:00");
    dangling.prediction_id = Some(999_999);
    let result = scheduler
        .book(scheduler.validate_booking_request(patient_id, dangling).unwrap())
        .await;
    assert_matches!(result, Err(AppointmentError::ValidationError(msg)) if msg.contains("prediction_id"));

    let prediction = store
        .insert_prediction(NewPrediction {
            subject_id: patient_id,
            condition: Condition::Heart,
            outcome: Outcome::Positive,
            confidence: 0.8,
            raw_input: "{}".to_string(),
        })
        .await
        .unwrap();
    let mut linked = request("17:00");
    linked.prediction_id = Some(prediction.id);
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, linked).unwrap())
        .await
        .unwrap();
    assert_eq!(booked.appointment.prediction_id, Some(prediction.id));
}

#[tokio::test]
async fn test_other_doctor_cannot_decide() {
    let (store, patient_id, doctor_id) = seeded_store().await;

    let mut notifier = MockTestNotifier::new();
    notifier.expect_notify_booked().returning(|_| true);
    notifier.expect_notify_approved().never();

    let scheduler = scheduler(store.clone(), notifier);
    let booked = scheduler
        .book(scheduler.validate_booking_request(patient_id, request("18:00")).unwrap())
        .await
        .unwrap();

    assert_matches!(
        scheduler
            .decide(booked.appointment.id, Decision::Approved, doctor_id + 100, None)
            .await,
        Err(AppointmentError::Unauthorized)
    );
    let stored = store
        .query_appointment_by_id(booked.appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Pending);
}
