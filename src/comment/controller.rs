use crate::comment::model::{
    AddCommentRequest, DeleteCommentRequest, GetBlogCommentsRequest, GetRepliesRequest,
};
use crate::comment::service::CommentService;
use crate::comment::session::{REPLY_PAGE_SIZE, ROOT_PAGE_SIZE};
use crate::comment::store::CommentStore;
use crate::middleware::auth::get_user_id_from_request;
use crate::utils::error::CustomError;
use actix_web::{HttpRequest, HttpResponse, web};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

/// Create a comment or a reply on a blog
/// POST /interactions/add-comment
pub async fn add_comment(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    body: web::Json<AddCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    // Get user ID from auth middleware
    let user_id_str = get_user_id_from_request(&req)
        .ok_or_else(|| CustomError::UnauthorizedError("Not authenticated".to_string()))?;

    let author = ObjectId::parse_str(&user_id_str)
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let comment = match &body.replying_to {
        Some(parent_id) => {
            let parent_id = ObjectId::parse_str(parent_id)
                .map_err(|_| CustomError::BadRequestError("Invalid comment ID".to_string()))?;

            comment_service
                .create_reply(parent_id, author, &body.comment)
                .await?
        }
        None => {
            let blog_id = ObjectId::parse_str(&body.blog_id)
                .map_err(|_| CustomError::BadRequestError("Invalid blog ID".to_string()))?;
            let blog_author = ObjectId::parse_str(&body.blog_author)
                .map_err(|_| CustomError::BadRequestError("Invalid blog author ID".to_string()))?;

            comment_service
                .create_root(blog_id, blog_author, author, &body.comment)
                .await?
        }
    };

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment created successfully",
        "httpStatusCode": 201,
        "data": comment
    })))
}

/// Get a page of root comments for a blog, newest first
/// POST /interactions/get-blog-comments
pub async fn get_blog_comments(
    comment_service: web::Data<CommentService>,
    body: web::Json<GetBlogCommentsRequest>,
) -> Result<HttpResponse, CustomError> {
    let blog_id = ObjectId::parse_str(&body.blog_id)
        .map_err(|_| CustomError::BadRequestError("Invalid blog ID".to_string()))?;

    let comments = comment_service
        .fetch_root_page(blog_id, body.skip, ROOT_PAGE_SIZE)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comments retrieved successfully",
        "httpStatusCode": 200,
        "count": comments.len(),
        "comment": comments
    })))
}

/// Get a page of direct replies of a comment, newest first
/// POST /interactions/get-replies
pub async fn get_replies(
    comment_service: web::Data<CommentService>,
    body: web::Json<GetRepliesRequest>,
) -> Result<HttpResponse, CustomError> {
    let parent_id = ObjectId::parse_str(&body.id)
        .map_err(|_| CustomError::BadRequestError("Invalid comment ID".to_string()))?;

    let replies = comment_service
        .fetch_children_page(parent_id, body.skip, REPLY_PAGE_SIZE)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Replies retrieved successfully",
        "httpStatusCode": 200,
        "count": replies.len(),
        "replies": replies
    })))
}

/// Delete a comment and its whole reply subtree
/// POST /interactions/delete-comment
pub async fn delete_comment(
    req: HttpRequest,
    comment_service: web::Data<CommentService>,
    body: web::Json<DeleteCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let user_id_str = get_user_id_from_request(&req)
        .ok_or_else(|| CustomError::UnauthorizedError("Not authenticated".to_string()))?;

    let actor = ObjectId::parse_str(&user_id_str)
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let comment_id = ObjectId::parse_str(&body.id)
        .map_err(|_| CustomError::BadRequestError("Invalid comment ID".to_string()))?;

    let comment = comment_service
        .get(comment_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

    // Only the comment's author or the blog's author may delete.
    if actor != comment.commented_by && actor != comment.blog_author {
        return Err(CustomError::ForbiddenError(
            "Only the comment author or the blog author can delete this comment".to_string(),
        ));
    }

    let removal = comment_service.delete_subtree(comment_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comment deleted successfully",
        "httpStatusCode": 200,
        "removed_count": removal.removed_count,
        "removed_parent_count": removal.removed_parent_count
    })))
}
