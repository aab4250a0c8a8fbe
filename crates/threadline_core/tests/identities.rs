use threadline_core::db::open_db_in_memory;
use threadline_core::model::identity::{DEFAULT_AVATAR, DEFAULT_HEADLINE};
use threadline_core::{
    require_identity, AuthorizationResolver, ErrorKind, IdentityService, RegistrationRequest,
    SqliteIdentityRepository, VerifiedIdentity,
};

fn request(name: &str, email: &str) -> RegistrationRequest {
    RegistrationRequest {
        display_name: name.to_string(),
        credential_hash: "salted-hash".to_string(),
        email: email.to_string(),
        phone: "1234567890".to_string(),
        zipcode: "77005".to_string(),
        date_of_birth: "2000-01-01".to_string(),
    }
}

#[test]
fn registration_creates_identity_and_default_profile() {
    let conn = open_db_in_memory().unwrap();
    let service = IdentityService::new(SqliteIdentityRepository::try_new(&conn).unwrap());

    let identity = service
        .register(&request("  alice ", "alice@example.com"))
        .unwrap();
    assert_eq!(identity.display_name, "alice");
    assert!(identity.following.is_empty());
    assert!(identity.created_at > 0);

    let profile = service.get_profile(identity.key).unwrap().unwrap();
    assert_eq!(profile.identity_key, identity.key);
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.headline, DEFAULT_HEADLINE);
    assert_eq!(profile.avatar, DEFAULT_AVATAR);

    let loaded = service.get_identity(identity.key).unwrap().unwrap();
    assert_eq!(loaded, identity);
}

#[test]
fn credential_hash_is_not_serialized() {
    let conn = open_db_in_memory().unwrap();
    let service = IdentityService::new(SqliteIdentityRepository::try_new(&conn).unwrap());
    let identity = service
        .register(&request("alice", "alice@example.com"))
        .unwrap();

    let json = serde_json::to_value(&identity).unwrap();
    assert_eq!(json["display_name"], "alice");
    assert!(json.get("credential_hash").is_none());
}

#[test]
fn duplicate_display_name_and_email_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = IdentityService::new(SqliteIdentityRepository::try_new(&conn).unwrap());
    service
        .register(&request("alice", "alice@example.com"))
        .unwrap();

    let err = service
        .register(&request("alice", "other@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("username already exists"));

    let err = service
        .register(&request("alicia", "alice@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn malformed_registration_fields_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = IdentityService::new(SqliteIdentityRepository::try_new(&conn).unwrap());

    let mut bad_email = request("alice", "not-an-email");
    assert_eq!(
        service.register(&bad_email).unwrap_err().kind(),
        ErrorKind::Validation
    );

    bad_email.email = "alice@example.com".to_string();
    bad_email.phone = "12-34".to_string();
    assert_eq!(
        service.register(&bad_email).unwrap_err().kind(),
        ErrorKind::Validation
    );

    let blank_name = request("   ", "blank@example.com");
    assert_eq!(
        service.register(&blank_name).unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn resolver_maps_names_and_keys_both_ways() {
    let conn = open_db_in_memory().unwrap();
    let service = IdentityService::new(SqliteIdentityRepository::try_new(&conn).unwrap());
    let alice = service
        .register(&request("alice", "alice@example.com"))
        .unwrap();

    let resolver = AuthorizationResolver::new(SqliteIdentityRepository::try_new(&conn).unwrap());
    assert_eq!(resolver.resolve("alice").unwrap(), Some(alice.key));
    assert_eq!(resolver.resolve(" alice ").unwrap(), Some(alice.key));
    assert_eq!(resolver.resolve("bob").unwrap(), None);
    assert_eq!(resolver.resolve("").unwrap(), None);
    assert_eq!(
        resolver.display_name(alice.key).unwrap().as_deref(),
        Some("alice")
    );
}

#[test]
fn missing_identity_is_unauthenticated() {
    let err = require_identity(None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert_eq!(err.http_status(), 401);

    let verified = VerifiedIdentity {
        key: uuid::Uuid::new_v4(),
        display_name: "alice".to_string(),
    };
    assert_eq!(require_identity(Some(&verified)).unwrap(), &verified);
}
