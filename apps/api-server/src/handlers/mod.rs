//! HTTP handlers and route configuration.

mod articles;
mod comments;
mod health;
mod relations;
mod users;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use quill_core::domain::{ArticleSummary, Page, PageRequest, User};
use quill_shared::PaginatedResponse;
use quill_shared::dto::{ArticleListItem, PageQuery, UserSummary, short_timestamp};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(web::scope("/api").route("/health", web::get().to(health::health_check)))
        .service(
            web::scope("/articles")
                .route("/", web::get().to(articles::list))
                .route("/", web::post().to(articles::create))
                // Fixed segments before `{id}`
                .route("/feed/", web::get().to(articles::feed))
                .route("/bookmark_list/", web::get().to(articles::bookmark_list))
                .route("/{id}/", web::get().to(articles::detail))
                .route("/{id}/", web::put().to(articles::update))
                .route("/{id}/", web::delete().to(articles::delete))
                .route("/{id}/like/", web::get().to(relations::likers))
                .route("/{id}/like/", web::post().to(relations::toggle_like))
                .route("/{id}/bookmark/", web::get().to(relations::bookmarkers))
                .route("/{id}/bookmark/", web::post().to(relations::toggle_bookmark))
                .route("/{id}/comment/", web::get().to(comments::list))
                .route("/{id}/comment/", web::post().to(comments::create))
                .route("/{id}/comment/{cid}/", web::put().to(comments::update))
                .route("/{id}/comment/{cid}/", web::delete().to(comments::delete)),
        )
        .service(
            web::scope("/users")
                .route("/sign/", web::post().to(users::sign_up))
                .route("/sign/", web::get().to(users::account))
                .route("/sign/", web::put().to(users::sign_out))
                .route("/sign/", web::patch().to(users::edit_account))
                .route("/token/", web::post().to(users::token))
                .route("/refresh/", web::post().to(users::refresh))
                .route("/verify/", web::post().to(users::verify))
                .route("/{id}/", web::get().to(users::profile))
                .route("/{id}/", web::put().to(users::edit_profile))
                .route("/{id}/follow/", web::get().to(relations::followers))
                .route("/{id}/follow/", web::post().to(relations::toggle_follow)),
        );
}

/// Malformed or mistyped JSON bodies are a 400, not actix's default text reply.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn page_request(query: &PageQuery) -> PageRequest {
    PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
    )
}

fn article_page(page: Page<ArticleSummary>) -> PaginatedResponse<ArticleListItem> {
    let results = page
        .items
        .into_iter()
        .map(|a| ArticleListItem {
            id: a.id,
            title: a.title,
            author: a.author,
            likes_count: a.likes_count,
            comment_count: a.comment_count,
            created_at: short_timestamp(&a.created_at),
        })
        .collect();

    PaginatedResponse::new(results, page.total, page.page, page.per_page)
}

fn user_summaries(users: Vec<User>) -> Vec<UserSummary> {
    users
        .into_iter()
        .map(|u| UserSummary {
            id: u.id,
            username: u.username,
        })
        .collect()
}
