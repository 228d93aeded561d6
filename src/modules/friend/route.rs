use crate::modules::friend::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/requests")
            .service(list_requests)
            .service(count_requests)
            .service(create_request)
            .service(create_request_by_username)
            .service(accept_request)
            .service(deny_request),
    )
    .service(scope("/friends").service(list_friends).service(remove_friend));
}
