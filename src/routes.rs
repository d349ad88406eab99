use crate::{
    api::{announcements, attendance, leave, profile, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(
        requests_per_min: u32,
    ) -> actix_governor::GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        cfg
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Auth routes. /me authenticates through the AuthUser extractor, the
    // rest are public but rate limited.
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            )
            .service(web::resource("/me").route(web::get().to(handlers::me))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/users")
                    // /users
                    .service(web::resource("").route(web::get().to(users::list_users)))
                    // /users/{id}/role
                    .service(
                        web::resource("/{id}/role").route(web::put().to(users::update_role)),
                    )
                    // /users/{id}/leave-balance
                    .service(
                        web::resource("/{id}/leave-balance")
                            .route(web::put().to(users::update_balance)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    .service(web::resource("/apply").route(web::post().to(leave::apply)))
                    .service(
                        web::resource("/my-requests").route(web::get().to(leave::my_requests)),
                    )
                    .service(web::resource("/pending").route(web::get().to(leave::pending)))
                    .service(web::resource("/balance").route(web::get().to(leave::balance)))
                    .service(web::resource("/report").route(web::get().to(leave::report)))
                    .service(web::resource("/calendar").route(web::get().to(leave::calendar)))
                    // /leaves/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve)),
                    )
                    // /leaves/{id}/reject
                    .service(web::resource("/{id}/reject").route(web::put().to(leave::reject))),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(
                        web::resource("/my-records")
                            .route(web::get().to(attendance::my_records)),
                    )
                    .service(web::resource("/report").route(web::get().to(attendance::report))),
            )
            .service(
                web::scope("/announcements")
                    // /announcements
                    .service(
                        web::resource("")
                            .route(web::get().to(announcements::list))
                            .route(web::post().to(announcements::create)),
                    )
                    // /announcements/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(announcements::delete)),
                    ),
            )
            .service(
                web::scope("/profile")
                    // /profile
                    .service(
                        web::resource("")
                            .route(web::get().to(profile::my_profile))
                            .route(web::put().to(profile::update_my_profile)),
                    )
                    // /profile/{user_id}
                    .service(
                        web::resource("/{user_id}").route(web::get().to(profile::user_profile)),
                    ),
            ),
    );
}
