pub mod interactions;
pub mod leave_request;
pub mod user;

use chrono::NaiveDate;

use crate::lifecycle::LeaveService;
use crate::notify::LogNotifier;
use crate::store::Store;

pub type AppService = LeaveService<Store, LogNotifier>;

/// Calendar date in the server's local time zone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppService;
    use crate::auth::jwt::generate_access_token;
    use crate::config::Config;
    use crate::lifecycle::LeaveService;
    use crate::model::holiday::Holidays;
    use crate::model::role::Role;
    use crate::notify::LogNotifier;
    use crate::policy::PolicyEngine;
    use crate::policy::calendar::Calendar;
    use crate::routes;
    use crate::store::{MemoryStore, Store};
    use crate::utils::UserRegistry;
    use actix_web::{
        App, Error,
        body::MessageBody,
        dev::{ServiceFactory, ServiceRequest, ServiceResponse},
        test::TestRequest,
        web::Data,
    };

    const SECRET: &str = "test-secret";

    pub fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".to_string(),
            jwt_secret: SECRET.to_string(),
            database_url: None,
            api_prefix: "/api".to_string(),
            approver_channel: "#leave-approvals".to_string(),
            holidays_file: None,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            rate_submit_per_min: 1000,
            rate_events_per_min: 1000,
            rate_protected_per_min: 1000,
        }
    }

    pub fn test_service() -> AppService {
        LeaveService::new(
            Store::Memory(MemoryStore::new()),
            LogNotifier,
            PolicyEngine::new(Calendar::new(&Holidays::default())),
            "#leave-approvals",
            UserRegistry::empty(),
        )
    }

    pub fn test_app() -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        test_app_with(test_config())
    }

    pub fn test_app_with(config: Config) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(test_service()))
            .configure(move |cfg| routes::configure(cfg, config))
    }

    /// The rate limiter keys on the peer address, so every request needs one.
    pub fn with_peer(req: TestRequest) -> TestRequest {
        req.peer_addr("127.0.0.1:40000".parse().unwrap())
    }

    pub fn authed(req: TestRequest, user_id: &str, role: Role) -> TestRequest {
        let token = generate_access_token(user_id, role, SECRET, 600).unwrap();
        with_peer(req).insert_header(("Authorization", format!("Bearer {token}")))
    }
}
