use crate::{
    api::{income, schedule, settlement, work_log},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn rate_limiter(
    requests_per_min: u32,
) -> anyhow::Result<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = (60_000 / u64::from(requests_per_min.max(1))).max(1);
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} per minute"))
}

pub fn configure(
    cfg: &mut web::ServiceConfig,
    config: &Config,
    limiter: &GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>,
) {
    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(limiter)) // rate limiting
            .service(
                web::scope("/work-logs")
                    // /work-logs/today
                    .service(web::resource("/today").route(web::get().to(work_log::today)))
                    // /work-logs/{id}/check-in
                    .service(
                        web::resource("/{id}/check-in").route(web::post().to(work_log::check_in)),
                    )
                    // /work-logs/{id}/check-out
                    .service(
                        web::resource("/{id}/check-out")
                            .route(web::patch().to(work_log::check_out)),
                    ),
            )
            .service(
                web::resource("/income/dashboard").route(web::get().to(income::dashboard)),
            )
            .service(
                web::resource("/users/income-goal")
                    .route(web::patch().to(income::update_income_goal)),
            )
            .service(
                web::scope("/schedules")
                    // /schedules
                    .service(web::resource("").route(web::post().to(schedule::create_schedule)))
                    // /schedules/from-work-log
                    .service(
                        web::resource("/from-work-log")
                            .route(web::post().to(schedule::create_from_work_log)),
                    )
                    // /schedules/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::patch().to(schedule::update_schedule))
                            .route(web::delete().to(schedule::delete_schedule)),
                    ),
            )
            .service(
                web::scope("/settlements")
                    // /settlements
                    .service(web::resource("").route(web::get().to(settlement::list_settlements)))
                    // /settlements/{postingId}
                    .service(
                        web::resource("/{posting_id}")
                            .route(web::patch().to(settlement::update_settlement_status)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_accepts_edge_rates() {
        assert!(rate_limiter(1).is_ok());
        assert!(rate_limiter(1000).is_ok());
        // faster than one token per millisecond
        assert!(rate_limiter(120_000).is_ok());
    }
}
