use super::controller::{add_comment, delete_comment, get_blog_comments, get_replies};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/interactions")
            .route("/get-blog-comments", web::post().to(get_blog_comments))
            .route("/get-replies", web::post().to(get_replies))
            .service(
                web::scope("")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route("/add-comment", web::post().to(add_comment))
                    .route("/delete-comment", web::post().to(delete_comment)),
            ),
    );
}
