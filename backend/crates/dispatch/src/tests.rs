//! Cross-module tests for the dispatch crate
//! Dispatcher behavior against fake providers, and the HTTP surface end to end.

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use platform::rate_limit::SlidingWindowRateLimiter;
    use serde_json::{Value, json};

    use crate::application::config::DispatchConfig;
    use crate::application::dispatcher::CommandDispatcher;
    use crate::domain::geo::Coordinates;
    use crate::domain::principal::Principal;
    use crate::domain::provider::{
        DirectionsProvider, DirectionsRequest, EmailProvider, GeocodeRequest, GeocodedPlace,
        GeocodingProvider, OutgoingEmail, Place, PlaceSearchRequest, PlacesProvider, Route,
    };
    use crate::error::{DispatchError, DispatchResult};
    use crate::infra::memory::InMemoryDispatchRepository;

    /// How the fake providers should fail
    #[derive(Debug, Clone)]
    pub enum FakeFailure {
        Unavailable,
        Rejected(Option<String>),
    }

    impl FakeFailure {
        fn to_error(&self) -> DispatchError {
            match self {
                FakeFailure::Unavailable => DispatchError::ProviderUnavailable { message: None },
                FakeFailure::Rejected(m) => DispatchError::ProviderRejected {
                    provider_message: m.clone(),
                },
            }
        }
    }

    /// Records every request and answers from canned data
    #[derive(Default)]
    pub struct FakeProviders {
        pub failure: Mutex<Option<FakeFailure>>,
        pub sent: Mutex<Vec<OutgoingEmail>>,
        pub geocode_requests: Mutex<Vec<GeocodeRequest>>,
        pub geocode_results: Mutex<Vec<GeocodedPlace>>,
        pub place_requests: Mutex<Vec<PlaceSearchRequest>>,
        pub place_results: Mutex<Vec<Place>>,
        pub direction_requests: Mutex<Vec<DirectionsRequest>>,
        pub routes: Mutex<Vec<Route>>,
    }

    impl FakeProviders {
        pub fn fail_with(&self, failure: FakeFailure) {
            *self.failure.lock().unwrap() = Some(failure);
        }

        fn check(&self) -> DispatchResult<()> {
            match self.failure.lock().unwrap().as_ref() {
                Some(f) => Err(f.to_error()),
                None => Ok(()),
            }
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl EmailProvider for FakeProviders {
        async fn send(&self, email: &OutgoingEmail) -> DispatchResult<()> {
            self.check()?;
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    impl GeocodingProvider for FakeProviders {
        async fn search(&self, request: &GeocodeRequest) -> DispatchResult<Vec<GeocodedPlace>> {
            self.geocode_requests.lock().unwrap().push(request.clone());
            self.check()?;
            Ok(self.geocode_results.lock().unwrap().clone())
        }
    }

    impl PlacesProvider for FakeProviders {
        async fn search_text(&self, request: &PlaceSearchRequest) -> DispatchResult<Vec<Place>> {
            self.place_requests.lock().unwrap().push(request.clone());
            self.check()?;
            Ok(self.place_results.lock().unwrap().clone())
        }
    }

    impl DirectionsProvider for FakeProviders {
        async fn route(&self, request: &DirectionsRequest) -> DispatchResult<Vec<Route>> {
            self.direction_requests.lock().unwrap().push(request.clone());
            self.check()?;
            Ok(self.routes.lock().unwrap().clone())
        }
    }

    pub type TestDispatcher =
        CommandDispatcher<InMemoryDispatchRepository, FakeProviders, SlidingWindowRateLimiter>;

    pub struct Harness {
        pub store: Arc<InMemoryDispatchRepository>,
        pub providers: Arc<FakeProviders>,
        pub dispatcher: TestDispatcher,
    }

    pub fn harness() -> Harness {
        let store = Arc::new(InMemoryDispatchRepository::new());
        let providers = Arc::new(FakeProviders::default());
        let dispatcher = CommandDispatcher::new(
            store.clone(),
            providers.clone(),
            Arc::new(SlidingWindowRateLimiter::new()),
            Arc::new(DispatchConfig::default()),
        );
        Harness {
            store,
            providers,
            dispatcher,
        }
    }

    pub fn principal() -> Principal {
        Principal::new("user-1")
            .with_display_name("Token Name")
            .with_email("token@fit.example")
    }

    pub fn email_payload() -> Value {
        json!({
            "to": "coach@fit.example",
            "subject": "Class on Saturday",
            "message": "See you there"
        })
    }

    /// Point `km` kilometers due north of `origin`
    pub fn north_of(origin: Coordinates, km: f64) -> Coordinates {
        let km_per_degree = crate::domain::geo::EARTH_RADIUS_KM.to_radians();
        Coordinates::new(origin.lat + km / km_per_degree, origin.lng)
    }

    pub fn place(id: &str, location: Coordinates) -> Place {
        Place {
            id: id.to_string(),
            name: format!("Place {id}"),
            address: "Somewhere, VIC".to_string(),
            location,
            rating: None,
            types: vec!["gym".to_string()],
        }
    }
}

#[cfg(test)]
mod dispatcher_tests {
    use serde_json::json;

    use super::support::*;
    use crate::application::config::{DEFAULT_ORIGIN, VICTORIA};
    use crate::application::dispatcher::CommandOutput;
    use crate::domain::entity::audit_record::AuditStatus;
    use crate::domain::geo::BoundingBox;
    use crate::domain::provider::{GeocodedPlace, Route};
    use crate::domain::value_object::{CommandType, TravelMode};
    use crate::error::DispatchError;

    // ------------------------------------------------------------------------
    // Email
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_email_success_is_audited() {
        let h = harness();
        let output = h
            .dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, email_payload())
            .await
            .unwrap();

        assert_eq!(
            output,
            CommandOutput::EmailSent {
                message: "Email sent successfully".into()
            }
        );
        assert_eq!(h.providers.sent_count(), 1);

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AuditStatus::Success);
        assert_eq!(records[0].principal_id, "user-1");
        assert_eq!(records[0].detail["to"], "coach@fit.example");
        assert_eq!(records[0].detail["messageLength"], 13);
        assert_eq!(records[0].detail["fromName"], "Token Name");
    }

    #[tokio::test]
    async fn test_fourth_email_in_window_is_rate_limited() {
        let h = harness();
        let p = principal();

        for _ in 0..3 {
            h.dispatcher
                .dispatch(Some(&p), CommandType::SendEmail, email_payload())
                .await
                .unwrap();
        }

        let err = h
            .dispatcher
            .dispatch(Some(&p), CommandType::SendEmail, email_payload())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::RateLimited { .. }));
        assert_eq!(err.to_string(), "Rate limit exceeded. Maximum 3 emails per minute");
        // the provider was never called for the fourth attempt
        assert_eq!(h.providers.sent_count(), 3);

        let records = h.store.records();
        assert_eq!(records.len(), 4);
        let last = &records[3];
        assert_eq!(last.status, AuditStatus::Failed);
        assert_eq!(last.detail["stage"], "validated");
        assert_eq!(last.detail["to"], "coach@fit.example");
        assert_eq!(last.detail["subject"], "Class on Saturday");
        assert_eq!(
            last.detail["error"],
            "Rate limit exceeded. Maximum 3 emails per minute"
        );
    }

    #[tokio::test]
    async fn test_quota_is_per_principal() {
        let h = harness();
        let alice = principal();
        let bob = crate::domain::principal::Principal::new("user-2");

        for _ in 0..3 {
            h.dispatcher
                .dispatch(Some(&alice), CommandType::SendEmail, email_payload())
                .await
                .unwrap();
        }
        assert!(
            h.dispatcher
                .dispatch(Some(&bob), CommandType::SendEmail, email_payload())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_identical_sends_are_not_deduplicated() {
        let h = harness();
        let p = principal();
        for _ in 0..2 {
            h.dispatcher
                .dispatch(Some(&p), CommandType::SendEmail, email_payload())
                .await
                .unwrap();
        }
        assert_eq!(h.providers.sent_count(), 2);
        assert_eq!(h.store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_quota_and_provider() {
        let h = harness();
        let p = principal();

        let err = h
            .dispatcher
            .dispatch(
                Some(&p),
                CommandType::SendEmail,
                json!({"to": "not-an-email", "subject": "Hi", "message": "x"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid recipient email address");
        assert_eq!(h.providers.sent_count(), 0);

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AuditStatus::Failed);
        assert_eq!(records[0].detail["stage"], "authenticated");
        assert_eq!(records[0].detail["to"], "not-an-email");

        // invalid attempts do not use up the quota
        for _ in 0..3 {
            h.dispatcher
                .dispatch(Some(&p), CommandType::SendEmail, email_payload())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_missing_fields_recorded_as_unknown() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: to, subject, message");

        let record = &h.store.records()[0];
        assert_eq!(record.detail["to"], "unknown");
        assert_eq!(record.detail["subject"], "unknown");
    }

    #[tokio::test]
    async fn test_unauthenticated_is_rejected_without_audit() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch(None, CommandType::SendEmail, email_payload())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Unauthenticated));
        assert_eq!(h.providers.sent_count(), 0);
        assert!(h.store.records().is_empty());
    }

    #[tokio::test]
    async fn test_provider_message_is_surfaced() {
        let h = harness();
        h.providers.fail_with(FakeFailure::Rejected(Some(
            "The from address does not match a verified Sender Identity".into(),
        )));

        let err = h
            .dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, email_payload())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The from address does not match a verified Sender Identity"
        );
        let record = &h.store.records()[0];
        assert_eq!(record.status, AuditStatus::Failed);
        assert_eq!(record.detail["stage"], "rateChecked");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_per_command() {
        let cases = [
            (CommandType::SendEmail, email_payload(), "Failed to send email"),
            (
                CommandType::SearchLocations,
                json!({"query": "gym"}),
                "Failed to search locations",
            ),
            (
                CommandType::SearchPlaces,
                json!({"query": "gym"}),
                "Failed to search places",
            ),
            (
                CommandType::GetDirections,
                json!({"originLat": -37.81, "originLng": 144.96, "destLat": -37.82, "destLng": 144.97}),
                "Failed to get directions",
            ),
        ];

        for (command, payload, expected) in cases {
            let h = harness();
            h.providers.fail_with(FakeFailure::Unavailable);
            let err = h
                .dispatcher
                .dispatch(Some(&principal()), command, payload)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), expected, "{command}");
            assert!(matches!(err, DispatchError::ProviderUnavailable { .. }));
        }
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_change_result() {
        let h = harness();
        h.store.set_fail_writes(true);

        assert!(
            h.dispatcher
                .dispatch(Some(&principal()), CommandType::SendEmail, email_payload())
                .await
                .is_ok()
        );

        h.providers.fail_with(FakeFailure::Rejected(Some("bounced".into())));
        let err = h
            .dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, email_payload())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bounced");
    }

    #[tokio::test]
    async fn test_sender_name_precedence() {
        // stored profile name wins
        let h = harness();
        h.store.set_profile_name("user-1", "Profile Name");
        h.dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, email_payload())
            .await
            .unwrap();
        assert_eq!(h.store.records()[0].detail["fromName"], "Profile Name");

        // then the token name, then "User"
        let h = harness();
        let anonymous = crate::domain::principal::Principal::new("user-9");
        h.dispatcher
            .dispatch(Some(&anonymous), CommandType::SendEmail, email_payload())
            .await
            .unwrap();
        let record = &h.store.records()[0];
        assert_eq!(record.detail["fromName"], "User");
        assert_eq!(record.detail["fromEmail"], "");
    }

    #[tokio::test]
    async fn test_reply_to_precedence_and_header() {
        let h = harness();
        let mut payload = email_payload();
        payload["replyTo"] = json!("reply@fit.example");

        // token email wins for display; provider reply_to is the supplied address
        h.dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, payload.clone())
            .await
            .unwrap();
        let sent = h.providers.sent.lock().unwrap()[0].clone();
        assert_eq!(sent.reply_to.as_ref().map(|r| r.as_str()), Some("reply@fit.example"));
        assert!(sent.text_body.contains("From: Token Name (token@fit.example)"));

        // without a token email the supplied replyTo is shown
        let h = harness();
        let p = crate::domain::principal::Principal::new("user-3").with_display_name("Kim");
        h.dispatcher
            .dispatch(Some(&p), CommandType::SendEmail, payload)
            .await
            .unwrap();
        let sent = h.providers.sent.lock().unwrap()[0].clone();
        assert!(sent.text_body.contains("From: Kim (reply@fit.example)"));

        // no replyTo supplied means no reply_to header
        let h = harness();
        h.dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, email_payload())
            .await
            .unwrap();
        assert!(h.providers.sent.lock().unwrap()[0].reply_to.is_none());
    }

    #[tokio::test]
    async fn test_message_html_is_escaped() {
        let h = harness();
        let mut payload = email_payload();
        payload["message"] = json!("<script>alert(1)</script>\nbye");

        h.dispatcher
            .dispatch(Some(&principal()), CommandType::SendEmail, payload)
            .await
            .unwrap();
        let sent = h.providers.sent.lock().unwrap()[0].clone();
        assert!(!sent.html_body.contains("<script>"));
        assert!(sent.html_body.contains("&lt;script&gt;alert(1)&lt;/script&gt;<br>bye"));
        assert!(sent.text_body.contains("<script>alert(1)</script>\nbye"));
    }

    // ------------------------------------------------------------------------
    // Searches
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_search_locations_bounding_box() {
        let h = harness();
        h.dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::SearchLocations,
                json!({"locationType": "gym", "searchScope": "5"}),
            )
            .await
            .unwrap();
        h.dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::SearchLocations,
                json!({"query": "pool", "searchScope": "all"}),
            )
            .await
            .unwrap();

        let requests = h.providers.geocode_requests.lock().unwrap().clone();
        assert_eq!(requests[0].text, "gym");
        assert_eq!(requests[0].bbox, BoundingBox::around(DEFAULT_ORIGIN, 5.0));
        assert_eq!(requests[0].limit, 50);
        assert_eq!(requests[1].bbox, VICTORIA);
    }

    #[tokio::test]
    async fn test_all_scope_ignores_caller_position() {
        let h = harness();
        // Sydney, far outside Victoria
        h.dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::SearchLocations,
                json!({"query": "pool", "searchScope": "all", "userLat": -33.87, "userLng": 151.21}),
            )
            .await
            .unwrap();

        let requests = h.providers.geocode_requests.lock().unwrap().clone();
        assert_eq!(requests[0].bbox, VICTORIA);
    }

    #[tokio::test]
    async fn test_searches_do_not_consume_email_quota() {
        let h = harness();
        let p = principal();

        for _ in 0..5 {
            h.dispatcher
                .dispatch(Some(&p), CommandType::SearchPlaces, json!({"query": "gym"}))
                .await
                .unwrap();
        }
        for _ in 0..3 {
            h.dispatcher
                .dispatch(Some(&p), CommandType::SendEmail, email_payload())
                .await
                .unwrap();
        }
        assert!(h.store.records().iter().all(|r| r.is_success()));
    }

    #[tokio::test]
    async fn test_search_locations_keeps_provider_order() {
        let h = harness();
        *h.providers.geocode_results.lock().unwrap() = vec![
            GeocodedPlace {
                id: "far".into(),
                name: "Far".into(),
                address: "".into(),
                category: None,
                location: north_of(DEFAULT_ORIGIN, 3.0),
            },
            GeocodedPlace {
                id: "near".into(),
                name: "Near".into(),
                address: "".into(),
                category: Some("park".into()),
                location: north_of(DEFAULT_ORIGIN, 0.5),
            },
        ];

        let output = h
            .dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::SearchLocations,
                json!({"query": "park"}),
            )
            .await
            .unwrap();

        let CommandOutput::Locations { locations, count } = output else {
            panic!("expected locations");
        };
        assert_eq!(count, 2);
        assert_eq!(locations[0].id, "far");
        assert_eq!(locations[0].distance, "3.0km");
        assert_eq!(locations[1].distance, "500m");

        let record = &h.store.records()[0];
        assert_eq!(record.detail["resultCount"], 2);
    }

    #[tokio::test]
    async fn test_search_places_sorted_by_distance() {
        let h = harness();
        *h.providers.place_results.lock().unwrap() = vec![
            place("a", north_of(DEFAULT_ORIGIN, 1.2)),
            place("b", north_of(DEFAULT_ORIGIN, 0.8)),
            place("c", north_of(DEFAULT_ORIGIN, 3.2)),
        ];

        let output = h
            .dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::SearchPlaces,
                json!({"query": "yoga"}),
            )
            .await
            .unwrap();

        let CommandOutput::Places { places, .. } = output else {
            panic!("expected places");
        };
        let order: Vec<&str> = places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, ["b", "a", "c"]);
        let distances: Vec<&str> = places.iter().map(|p| p.distance.as_str()).collect();
        assert_eq!(distances, ["800m", "1.2km", "3.2km"]);
    }

    #[tokio::test]
    async fn test_search_places_radius() {
        let h = harness();
        for scope in [json!("10"), json!("80"), json!("all")] {
            h.dispatcher
                .dispatch(
                    Some(&principal()),
                    CommandType::SearchPlaces,
                    json!({"query": "gym", "searchScope": scope, "userLat": -37.9, "userLng": 145.0}),
                )
                .await
                .unwrap();
        }

        let requests = h.providers.place_requests.lock().unwrap().clone();
        let radii: Vec<f64> = requests.iter().map(|r| r.radius_meters).collect();
        assert_eq!(radii, [10_000.0, 50_000.0, 50_000.0]);
        assert_eq!(requests[0].max_results, 20);
        assert_eq!(requests[0].center.lat, -37.9);
    }

    #[tokio::test]
    async fn test_search_requires_term() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch(Some(&principal()), CommandType::SearchPlaces, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ValidationFailed { field: "query", .. }));
        assert!(h.providers.place_requests.lock().unwrap().is_empty());
    }

    // ------------------------------------------------------------------------
    // Directions
    // ------------------------------------------------------------------------

    fn directions_payload(mode: &str) -> serde_json::Value {
        json!({
            "originLat": -37.81, "originLng": 144.96,
            "destLat": -37.82, "destLng": 144.97,
            "mode": mode
        })
    }

    #[tokio::test]
    async fn test_directions_formatting_and_mode_coercion() {
        let h = harness();
        *h.providers.routes.lock().unwrap() = vec![Route {
            distance_meters: 1500.0,
            duration_seconds: 600.0,
            geometry: json!({"type": "LineString", "coordinates": []}),
        }];

        let output = h
            .dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::GetDirections,
                directions_payload("flying"),
            )
            .await
            .unwrap();

        let CommandOutput::Directions(directions) = output else {
            panic!("expected directions");
        };
        assert_eq!(directions.distance, "1.50 km");
        assert_eq!(directions.duration, "10 min");
        assert_eq!(directions.mode, TravelMode::Walking);
        assert_eq!(
            h.providers.direction_requests.lock().unwrap()[0].mode,
            TravelMode::Walking
        );

        let record = &h.store.records()[0];
        assert_eq!(record.detail["distance"], "1.50 km");
        assert_eq!(record.detail["duration"], "10 min");
    }

    #[tokio::test]
    async fn test_directions_no_route() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch(
                Some(&principal()),
                CommandType::GetDirections,
                directions_payload("driving"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NotFound { .. }));
        assert_eq!(err.kind(), kernel::error::kind::ErrorKind::NotFound);
        let record = &h.store.records()[0];
        assert_eq!(record.status, AuditStatus::Failed);
        assert_eq!(record.detail["stage"], "rateChecked");
    }

    // ------------------------------------------------------------------------
    // Email history
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_email_history() {
        let h = harness();
        let p = principal();

        h.dispatcher
            .dispatch(Some(&p), CommandType::SendEmail, email_payload())
            .await
            .unwrap();
        let _ = h
            .dispatcher
            .dispatch(Some(&p), CommandType::SendEmail, json!({"to": "bad", "subject": "Oops", "message": "x"}))
            .await;
        // someone else's email must not show up
        h.dispatcher
            .dispatch(
                Some(&crate::domain::principal::Principal::new("user-2")),
                CommandType::SendEmail,
                email_payload(),
            )
            .await
            .unwrap();

        let output = h
            .dispatcher
            .dispatch(Some(&p), CommandType::EmailHistory, serde_json::Value::Null)
            .await
            .unwrap();
        let CommandOutput::EmailHistory { emails } = output else {
            panic!("expected history");
        };

        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].subject, "Oops");
        assert_eq!(emails[0].status, "failed");
        assert_eq!(emails[0].error.as_deref(), Some("Invalid recipient email address"));
        assert_eq!(emails[1].subject, "Class on Saturday");
        assert_eq!(emails[1].status, "success");

        // reading history is not itself audited
        assert_eq!(h.store.records().len(), 3);
    }

    #[tokio::test]
    async fn test_email_history_is_capped() {
        let h = harness();
        // bypass the quota by writing records directly
        for i in 0..15 {
            use crate::domain::repository::AuditLog;
            h.store
                .record(&crate::domain::entity::audit_record::AuditRecord::success(
                    "user-1",
                    CommandType::SendEmail,
                    json!({"to": "a@b.co", "subject": format!("s{i}")}),
                ))
                .await
                .unwrap();
        }

        let output = h
            .dispatcher
            .dispatch(Some(&principal()), CommandType::EmailHistory, json!({}))
            .await
            .unwrap();
        let CommandOutput::EmailHistory { emails } = output else {
            panic!("expected history");
        };
        assert_eq!(emails.len(), 10);
        assert_eq!(emails[0].subject, "s14");
    }

    #[tokio::test]
    async fn test_email_history_requires_principal() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch(None, CommandType::EmailHistory, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unauthenticated));
    }

    // ------------------------------------------------------------------------
    // Raw bodies
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_malformed_body_is_audited_validation_failure() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch_body(Some(&principal()), CommandType::SendEmail, b"{not json")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid request payload");
        assert_eq!(h.store.records()[0].status, AuditStatus::Failed);
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_payload() {
        let h = harness();
        let err = h
            .dispatcher
            .dispatch_body(Some(&principal()), CommandType::SendEmail, b"")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: to, subject, message");
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::Utc;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::support::*;
    use crate::infra::identity::{HmacTokenVerifier, IdentityClaims};
    use crate::presentation::router::dispatch_router;

    const SECRET: &[u8] = b"router-test-secret";

    fn router() -> (axum::Router, Harness) {
        let h = harness();
        let verifier = Arc::new(HmacTokenVerifier::new(SECRET.to_vec()));
        (dispatch_router(h.dispatcher.clone(), verifier), h)
    }

    fn token(uid: &str) -> String {
        HmacTokenVerifier::new(SECRET.to_vec())
            .issue(&IdentityClaims {
                uid: uid.into(),
                email: Some("sam@fit.example".into()),
                name: Some("Sam".into()),
                email_verified: true,
                exp: Utc::now().timestamp_millis() + 3_600_000,
            })
            .unwrap()
    }

    fn post(command: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/commands/{command}"))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = router();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_unauthenticated_is_401() {
        let (app, h) = router();
        let response = app
            .oneshot(post("sendEmail", None, email_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Authentication required");
        assert_eq!(body["status"], 401);
        assert!(h.store.records().is_empty());
    }

    #[tokio::test]
    async fn test_forged_token_is_401() {
        let (app, _) = router();
        let forged = HmacTokenVerifier::new(b"wrong-secret".to_vec())
            .issue(&IdentityClaims {
                uid: "intruder".into(),
                email: None,
                name: None,
                email_verified: false,
                exp: Utc::now().timestamp_millis() + 60_000,
            })
            .unwrap();
        let response = app
            .oneshot(post("sendEmail", Some(&forged), email_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_validation_error_is_400_with_reason() {
        let (app, _) = router();
        let response = app
            .oneshot(post(
                "sendEmail",
                Some(&token("user-1")),
                json!({"to": "a@b.co", "subject": "s".repeat(201), "message": "m"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Subject exceeds maximum length of 200 characters");
    }

    #[tokio::test]
    async fn test_success_response_shape() {
        let (app, h) = router();
        let response = app
            .oneshot(post("sendEmail", Some(&token("user-1")), email_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"success": true, "message": "Email sent successfully"})
        );
        assert_eq!(h.store.records()[0].detail["fromName"], "Sam");
    }

    #[tokio::test]
    async fn test_fourth_email_is_429() {
        let (app, _) = router();
        let bearer = token("user-1");

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(post("sendEmail", Some(&bearer), email_payload()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(post("sendEmail", Some(&bearer), email_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Rate limit exceeded. Maximum 3 emails per minute");
        assert_eq!(body["action"], "Too many emails sent. Please wait a minute.");
    }

    #[tokio::test]
    async fn test_unknown_command_is_404() {
        let (app, _) = router();
        let response = app
            .oneshot(post("launchRocket", Some(&token("user-1")), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_provider_unavailable_is_503() {
        let (app, h) = router();
        h.providers.fail_with(FakeFailure::Unavailable);
        let response = app
            .oneshot(post(
                "searchPlaces",
                Some(&token("user-1")),
                json!({"query": "gym"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["detail"], "Failed to search places");
    }
}
