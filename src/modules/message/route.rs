use crate::modules::message::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/messages").service(get_messages).service(send_message));
}
