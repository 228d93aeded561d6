use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/users").service(get_me).service(sync_me));
}
