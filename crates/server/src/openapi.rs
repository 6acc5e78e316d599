use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorBody { pub error: String, pub code: Option<u16>, pub detail: Option<String> }

#[derive(Serialize, ToSchema)]
pub struct PointDoc {
    #[serde(rename = "type")]
    #[schema(example = "Point")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: Vec<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct TimeOfDayDoc { pub hour: u8, pub minute: u8 }

#[derive(Serialize, ToSchema)]
pub struct DailyScheduleDoc { pub start: TimeOfDayDoc, pub end: TimeOfDayDoc }

#[derive(Serialize, ToSchema)]
pub struct ContactDoc { pub name: String, pub value: String }

/// Restaurant payload for create; update accepts any subset of these fields.
#[derive(Serialize, ToSchema)]
pub struct RestaurantInputDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(example = "$$")]
    pub price: String,
    pub location: PointDoc,
    /// weekday name -> opening interval
    pub schedule: std::collections::HashMap<String, DailyScheduleDoc>,
    pub contacts: Vec<ContactDoc>,
}

#[derive(ToSchema)]
pub struct CreatedResponse { pub id: String }

#[derive(ToSchema)]
pub struct ScoreInputDoc {
    /// number or numeric string, 0 to 5
    pub score: f64,
}

#[derive(ToSchema)]
pub struct ScoreResponse { pub score: f64 }

#[derive(ToSchema)]
pub struct CommentInputDoc { pub text: String }

#[derive(ToSchema)]
pub struct ImageResponse { pub url: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::restaurants::create,
        crate::routes::restaurants::list,
        crate::routes::restaurants::search,
        crate::routes::restaurants::get,
        crate::routes::restaurants::update,
        crate::routes::restaurants::delete,
        crate::routes::restaurants::add_score,
        crate::routes::restaurants::list_scores,
        crate::routes::restaurants::my_score,
        crate::routes::restaurants::add_comment,
        crate::routes::restaurants::list_comments,
        crate::routes::restaurants::add_image,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            PointDoc,
            TimeOfDayDoc,
            DailyScheduleDoc,
            ContactDoc,
            RestaurantInputDoc,
            CreatedResponse,
            ScoreInputDoc,
            ScoreResponse,
            CommentInputDoc,
            ImageResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "restaurants"),
        (name = "scores"),
        (name = "comments"),
        (name = "images")
    )
)]
pub struct ApiDoc;
