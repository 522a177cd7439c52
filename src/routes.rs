use crate::{
    api::{attendance, audit, dashboard, documents, holiday, leave_request, task, team, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    refresh: Limiter,
    protected: Limiter,
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / u64::from(requests_per_min);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .with_context(|| format!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            refresh: build_limiter(config.rate_refresh_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(web::resource("/me").route(web::get().to(users::me)))
            .service(
                web::scope("/leave")
                    .service(web::resource("").route(web::post().to(leave_request::apply_leave)))
                    .service(web::resource("/mine").route(web::get().to(leave_request::my_leaves)))
                    .service(
                        web::resource("/balances").route(web::get().to(leave_request::leave_balances)),
                    )
                    .service(
                        web::resource("/balance/{leave_type}")
                            .route(web::get().to(leave_request::leave_balance)),
                    )
                    .service(
                        web::resource("/{id}/decision")
                            .route(web::put().to(leave_request::decide_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::my_attendance)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::put().to(attendance::check_out))),
            )
            .service(
                web::scope("/team")
                    .service(web::resource("").route(web::get().to(team::team_list)))
                    .service(
                        web::resource("/{emp_id}")
                            .route(web::get().to(team::team_member))
                            .route(web::put().to(team::update_team_member)),
                    )
                    .service(
                        web::resource("/{emp_id}/leaves")
                            .route(web::get().to(leave_request::team_member_leaves)),
                    )
                    .service(
                        web::resource("/{emp_id}/attendance")
                            .route(web::get().to(attendance::team_member_attendance))
                            .route(web::post().to(attendance::add_team_attendance)),
                    )
                    .service(
                        web::resource("/{emp_id}/attendance/{att_id}")
                            .route(web::put().to(attendance::update_team_attendance)),
                    )
                    .service(
                        web::resource("/{emp_id}/tasks")
                            .route(web::get().to(task::team_member_tasks))
                            .route(web::post().to(task::assign_task)),
                    ),
            )
            .service(
                web::scope("/tasks")
                    .service(web::resource("/mine").route(web::get().to(task::my_tasks)))
                    .service(web::resource("/{id}").route(web::put().to(task::update_task))),
            )
            .service(
                web::scope("/documents")
                    .service(web::resource("").route(web::get().to(documents::my_documents)))
                    .service(web::resource("/{id}").route(web::get().to(documents::get_document))),
            )
            .service(
                web::scope("/salary-slips")
                    .service(web::resource("").route(web::get().to(documents::my_salary_slips)))
                    .service(web::resource("/{id}").route(web::get().to(documents::get_salary_slip))),
            )
            .service(web::resource("/holidays").route(web::get().to(holiday::list_holidays)))
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/employee").route(web::get().to(dashboard::employee_dashboard)))
                    .service(
                        web::resource("/supervisor").route(web::get().to(dashboard::supervisor_dashboard)),
                    )
                    .service(web::resource("/admin").route(web::get().to(dashboard::admin_dashboard)))
                    .service(
                        web::resource("/attendance").route(web::get().to(dashboard::attendance_dashboard)),
                    ),
            )
            .service(
                web::scope("/admin")
                    // /admin/users
                    .service(
                        web::resource("/users")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    // /admin/users/{id}
                    .service(
                        web::resource("/users/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    )
                    .service(
                        web::resource("/users/{id}/documents")
                            .route(web::post().to(documents::register_document)),
                    )
                    .service(
                        web::resource("/users/{id}/salary-slips")
                            .route(web::post().to(documents::register_salary_slip)),
                    )
                    .service(web::resource("/holidays").route(web::post().to(holiday::add_holiday)))
                    .service(web::resource("/logs").route(web::get().to(audit::list_logs))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days, rotated on every /auth/refresh)

// API REQUEST
//  └─ Authorization: Bearer access_token

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_clamped_instead_of_failing() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(60_000).is_ok());
        assert!(build_limiter(1_000_000).is_ok());
    }
}
