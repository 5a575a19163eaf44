use rocket::{Request, catch, serde::json::Json};
use shared::ApiResponse;

type Envelope = Json<ApiResponse<()>>;

#[catch(400)]
pub fn bad_request(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("Invalid request parameters."))
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("Unauthorized"))
}

#[catch(403)]
pub fn forbidden(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("Access forbidden."))
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("The requested resource was not found."))
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("Malformed request body."))
}

#[catch(429)]
pub fn too_many_requests(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("Rate limit exceeded. Please wait before trying again."))
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Envelope {
    Json(ApiResponse::failure("An internal server error occurred."))
}
