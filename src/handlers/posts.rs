// Post handlers
// HTTP handlers for the bulletin board: browsing, searching, creating,
// editing and deleting posts. Pages are rendered server-side from the
// static templates; create/update consume multipart form submissions.

use axum::{
    extract::{Multipart, Query, State},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, ImageReplacement, ImageSlot, UpdatePostRequest},
    render, AppState,
};

/// Query parameters for the routes addressing a single post
#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub id: i32,
}

/// Query parameters for the title search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Form body of the delete confirmation
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub id: i32,
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed form data: {}", err))
}

/// Index page: every post as a link, followed by the search form
/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let posts = state.db.list_posts().await?;

    let mut html = render::post_links("이상향 월드컵", &posts);
    html.push_str(&state.templates.load("search.html").await?);

    Ok(Html(html))
}

/// Static post creation form
/// GET /create
pub async fn create_form(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let html = state.templates.load("create.html").await?;
    Ok(Html(html))
}

/// Create a new post from a multipart submission carrying `title`,
/// `content` and the `image1` file field repeated four times.
/// POST /create
///
/// Files are written to the upload directory as the parts stream in; a
/// submission that later fails validation or INSERT leaves orphaned files
/// behind.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut title = None;
    let mut content = None;
    let mut image_urls = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        // Copy the part name out before the field is consumed below
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "content" => content = Some(field.text().await.map_err(multipart_error)?),
            "image1" => {
                let original = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                image_urls.push(state.uploads.save(&original, &data).await?);
            }
            _ => {}
        }
    }

    let request = CreatePostRequest {
        title: title.unwrap_or_default(),
        content: content.unwrap_or_default(),
        image_urls,
    };

    let post = state.db.create_post(request).await?;

    info!("New post created: {}", post.id);
    Ok(Redirect::to("/"))
}

/// Search posts whose title contains the query substring
/// GET /search?query=
pub async fn search_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let posts = state.db.search_posts(&params.query).await?;

    info!("Search for '{}' matched {} posts", params.query, posts.len());
    Ok(Html(render::post_links("검색 결과", &posts)))
}

/// Post detail page: two of the four stored images, chosen uniformly at
/// random without replacement
/// GET /post?id=
pub async fn show_post(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostQuery>,
) -> Result<Html<String>, AppError> {
    let post = state.db.get_post(params.id).await?;

    let [first_image, second_image] = post.random_image_pair();
    let id = post.id.to_string();

    let html = state
        .templates
        .render(
            "post.html",
            &[
                ("post.title", post.title.as_str()),
                ("post.content", post.content.as_str()),
                ("post.id", id.as_str()),
                ("post.image_url1", first_image),
                ("post.image_url2", second_image),
            ],
        )
        .await?;

    Ok(Html(html))
}

/// Edit form pre-filled with the post's title, content and the first two
/// image slots
/// GET /edit?id=
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostQuery>,
) -> Result<Html<String>, AppError> {
    let post = state.db.get_post(params.id).await?;
    let id = post.id.to_string();

    let html = state
        .templates
        .render(
            "edit.html",
            &[
                ("post.title", post.title.as_str()),
                ("post.content", post.content.as_str()),
                ("post.id", id.as_str()),
                ("post.image_url1", post.image_url1.as_str()),
                ("post.image_url2", post.image_url2.as_str()),
            ],
        )
        .await?;

    Ok(Html(html))
}

/// Update a post from a multipart submission: `id`, `title` and `content`
/// are required; an optional `image` file replaces the single slot named
/// by the `slot` field (1-4).
/// POST /update
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut id = None;
    let mut title = None;
    let mut content = None;
    let mut slot = None;
    let mut image_file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "id" => id = Some(field.text().await.map_err(multipart_error)?),
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "content" => content = Some(field.text().await.map_err(multipart_error)?),
            "slot" => slot = Some(field.text().await.map_err(multipart_error)?),
            "image" => {
                let original = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                // Browsers submit an empty part when no file was chosen
                if original.is_empty() && data.is_empty() {
                    continue;
                }
                image_file = Some(state.uploads.save(&original, &data).await?);
            }
            _ => {}
        }
    }

    let id: i32 = id
        .ok_or_else(|| AppError::validation("Post id is required"))?
        .trim()
        .parse()
        .map_err(|_| AppError::validation("Post id must be an integer"))?;

    let image = match image_file {
        Some(filename) => {
            let slot = slot
                .as_deref()
                .and_then(ImageSlot::parse)
                .ok_or_else(|| {
                    AppError::validation("A replacement image requires a slot between 1 and 4")
                })?;
            Some(ImageReplacement { slot, filename })
        }
        None => None,
    };

    let request = UpdatePostRequest {
        id,
        title: title.unwrap_or_default(),
        content: content.unwrap_or_default(),
        image,
    };

    state.db.update_post(request).await?;

    info!("Post updated: {}", id);
    Ok(Redirect::to(&format!("/post?id={}", id)))
}

/// Delete confirmation page
/// GET /delete?id=
pub async fn delete_form(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostQuery>,
) -> Result<Html<String>, AppError> {
    let post = state.db.get_post(params.id).await?;
    let id = post.id.to_string();

    let html = state
        .templates
        .render("delete.html", &[("post.id", id.as_str())])
        .await?;

    Ok(Html(html))
}

/// Delete a post and return to the index
/// POST /delete
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DeleteForm>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_post(form.id).await?;

    info!("Post deleted: {}", form.id);
    Ok(Redirect::to("/"))
}
