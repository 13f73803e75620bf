use crate::{
    api::{interactions, leave_request, user},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish();
    match cfg {
        Some(cfg) => Governor::new(&cfg),
        // Only reachable with a zero period or burst, both excluded above.
        None => Governor::new(&GovernorConfig::default()),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let submit_limiter = Arc::new(build_limiter(config.rate_submit_per_min));
    let events_limiter = Arc::new(build_limiter(config.rate_events_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .wrap(submit_limiter.clone())
                            .route(web::post().to(user::register_user)),
                    )
                    // /users/me/balance
                    .service(web::resource("/me/balance").route(web::get().to(user::my_balance))),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(
                                web::post()
                                    .to(leave_request::submit_leave)
                                    .wrap(submit_limiter),
                            ),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            // /events
            .service(
                web::resource("/events")
                    .wrap(events_limiter)
                    .route(web::post().to(interactions::handle_event)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{authed, test_app_with, test_config};
    use crate::model::role::Role;
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    #[actix_web::test]
    async fn submit_limit_does_not_throttle_listing() {
        let config = crate::config::Config {
            rate_submit_per_min: 1,
            ..test_config()
        };
        let app = test::init_service(test_app_with(config)).await;

        for _ in 0..3 {
            let req = authed(test::TestRequest::get().uri("/api/leave"), "A1", Role::Admin)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let application = json!({
            "leave_type": "Sick_Leave",
            "from_date": "2099-06-01",
            "to_date": "2099-06-01"
        });
        let first = authed(test::TestRequest::post().uri("/api/leave"), "U1", Role::Employee)
            .set_json(&application)
            .to_request();
        assert_ne!(
            test::call_service(&app, first).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        let second = authed(test::TestRequest::post().uri("/api/leave"), "U1", Role::Employee)
            .set_json(&application)
            .to_request();
        assert_eq!(
            test::call_service(&app, second).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
