use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::OptionalAuthUser;
use crate::comment::{CommentService, CommentSort, NewComment, PageRequest};
use crate::error::AppError;
use crate::response::ResponseDto;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/query").route(web::post().to(query)))
        .service(web::resource("/add").route(web::post().to(add)))
        .service(web::resource("/like").route(web::post().to(like)))
        .service(web::resource("/singleApprove").route(web::post().to(single_approve)))
        .service(web::resource("/postApprove").route(web::post().to(post_approve)))
        .service(web::resource("/pending").route(web::post().to(pending)))
        .service(web::resource("/remove").route(web::post().to(remove)));
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryCommentListRequest {
    post_name: String,
    #[serde(flatten)]
    page: PageRequest,
    #[serde(default)]
    sort: CommentSort,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRequest {
    post_name: String,
    #[serde(flatten)]
    page: PageRequest,
}

#[derive(Deserialize)]
struct IdQuery {
    id: i32,
}

async fn query(
    service: web::Data<CommentService>,
    payload: web::Json<QueryCommentListRequest>,
) -> Result<HttpResponse, AppError> {
    let list = service
        .list_comments(&payload.post_name, payload.page, payload.sort)
        .await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(list))))
}

async fn add(
    service: web::Data<CommentService>,
    auth: OptionalAuthUser,
    payload: web::Json<NewComment>,
) -> Result<HttpResponse, AppError> {
    let created = service.create_comment(payload.into_inner(), auth.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(created))))
}

async fn like(
    service: web::Data<CommentService>,
    auth: OptionalAuthUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse, AppError> {
    let updated = service.toggle_like(query.id, auth.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(updated))))
}

async fn single_approve(
    service: web::Data<CommentService>,
    auth: OptionalAuthUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse, AppError> {
    let approved = service.approve_comment(query.id, auth.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(approved))))
}

async fn post_approve(
    service: web::Data<CommentService>,
    auth: OptionalAuthUser,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, AppError> {
    let count = service
        .approve_post_comments(&payload.post_name, auth.0.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(count))))
}

async fn pending(
    service: web::Data<CommentService>,
    auth: OptionalAuthUser,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, AppError> {
    let list = service
        .list_pending(&payload.post_name, payload.page, auth.0.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(list))))
}

async fn remove(
    service: web::Data<CommentService>,
    auth: OptionalAuthUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse, AppError> {
    let deleted = service.delete_comment(query.id, auth.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ResponseDto::success(Some(deleted))))
}
