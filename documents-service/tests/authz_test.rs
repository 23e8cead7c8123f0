//! Authorization tests: role capabilities per action and cross-tenant
//! isolation.

mod common;

use uuid::Uuid;

use common::{admin, client, quote, staff, TEST_BUSINESS_ID, TEST_CLIENT_ID};
use documents_service::engine::{authorize, ensure_staff_for_business, DocumentAction};
use documents_service::models::DocumentStatus;

const STAFF_ACTIONS: [DocumentAction; 5] = [
    DocumentAction::Send,
    DocumentAction::CreateRevision,
    DocumentAction::RecordPayment,
    DocumentAction::Cancel,
    DocumentAction::Edit,
];

#[test]
fn admin_may_perform_staff_actions_on_any_business() {
    let doc = quote(DocumentStatus::Draft);
    for action in STAFF_ACTIONS {
        authorize(&admin(), action, &doc).expect("Admin should be authorized");
    }
}

#[test]
fn staff_may_act_on_their_own_business_only() {
    let doc = quote(DocumentStatus::Draft);

    for action in STAFF_ACTIONS {
        authorize(&staff(TEST_BUSINESS_ID), action, &doc)
            .expect("Own-business staff should be authorized");

        let err = authorize(&staff(Uuid::new_v4()), action, &doc)
            .expect_err("Cross-business staff should be forbidden");
        assert_eq!(err.code(), "FORBIDDEN");
    }
}

#[test]
fn clients_cannot_perform_staff_actions() {
    let doc = quote(DocumentStatus::Draft);

    for action in STAFF_ACTIONS {
        let err = authorize(&client(TEST_CLIENT_ID), action, &doc)
            .expect_err("Client should be forbidden");
        assert_eq!(err.code(), "FORBIDDEN");
    }
}

#[test]
fn only_the_documents_client_may_accept_or_reject() {
    let doc = quote(DocumentStatus::Sent);

    for action in [DocumentAction::Accept, DocumentAction::Reject] {
        authorize(&client(TEST_CLIENT_ID), action, &doc)
            .expect("Owning client should be authorized");

        let err = authorize(&client(Uuid::new_v4()), action, &doc)
            .expect_err("Other clients should be forbidden");
        assert_eq!(err.code(), "FORBIDDEN");
    }
}

#[test]
fn staff_and_admin_cannot_accept_on_the_clients_behalf() {
    let doc = quote(DocumentStatus::Sent);

    for actor in [admin(), staff(TEST_BUSINESS_ID)] {
        let err = authorize(&actor, DocumentAction::Accept, &doc)
            .expect_err("Acceptance is client-only");
        assert_eq!(err.code(), "FORBIDDEN");
    }
}

#[test]
fn business_scope_check_matches_business_id() {
    ensure_staff_for_business(&admin(), TEST_BUSINESS_ID, "list")
        .expect("Admin passes any scope");
    ensure_staff_for_business(&staff(TEST_BUSINESS_ID), TEST_BUSINESS_ID, "list")
        .expect("Matching staff passes");

    let err = ensure_staff_for_business(&staff(TEST_BUSINESS_ID), Uuid::new_v4(), "list")
        .expect_err("Mismatched staff is forbidden");
    assert_eq!(err.code(), "FORBIDDEN");

    let err = ensure_staff_for_business(&client(TEST_CLIENT_ID), TEST_BUSINESS_ID, "list")
        .expect_err("Clients are forbidden");
    assert_eq!(err.code(), "FORBIDDEN");
}
