/// Card endpoints: multipart create and image-aware delete
use crate::{
    cards::{Card, CardSubmission, ImageUpload},
    context::AppContext,
    db::documents::DeleteResult,
    error::{LandingError, LandingResult},
};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};

/// Form field carrying the image
const IMAGE_FIELD: &str = "image";

/// Create a card from a multipart form (text fields + one `image` part)
pub async fn create_card(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> LandingResult<(StatusCode, Json<Card>)> {
    let mut multipart = multipart.map_err(|e| {
        LandingError::Validation(format!("Expected a multipart form: {}", e.body_text()))
    })?;
    let submission = read_submission(&mut multipart).await?;
    let card = ctx.cards().create(submission).await?;

    tracing::info!("Added card {} ({})", card.id, card.image_url);

    Ok((StatusCode::CREATED, Json(card)))
}

/// Delete a card and its locally stored image
pub async fn delete_card(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LandingResult<Json<DeleteResult>> {
    let result = ctx.cards().delete(&id).await?;

    tracing::info!("Deleted card {} (count {})", id, result.deleted_count);

    Ok(Json(result))
}

/// Collect text fields and image parts from the form
async fn read_submission(multipart: &mut Multipart) -> LandingResult<CardSubmission> {
    let mut submission = CardSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            submission.images.push(read_image(field).await?);
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        let fields = &mut submission.fields;
        match name.as_str() {
            "title" => fields.title = value,
            "header" => fields.header = value,
            "subHeader" => fields.sub_header = value,
            "description" => fields.description = value,
            "shortDescription" => fields.short_description = Some(value),
            other => tracing::debug!("Ignoring card form field {:?}", other),
        }
    }

    Ok(submission)
}

async fn read_image(field: Field<'_>) -> LandingResult<ImageUpload> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field.bytes().await.map_err(multipart_error)?;

    Ok(ImageUpload {
        file_name,
        content_type,
        data: data.to_vec(),
    })
}

fn multipart_error(e: MultipartError) -> LandingError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        LandingError::PayloadTooLarge(e.body_text())
    } else {
        LandingError::Validation(format!("Malformed multipart body: {}", e.body_text()))
    }
}
