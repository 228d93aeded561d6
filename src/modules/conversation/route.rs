use crate::modules::conversation::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/conversations")
            .service(get_conversations)
            .service(create_group)
            .service(get_conversation)
            .service(is_group_creator)
            .service(update_group_name)
            .service(update_group_image)
            .service(add_group_members)
            .service(remove_group_member)
            .service(leave_group)
            .service(delete_group)
            .service(mark_read),
    );
}
