use utoipa::OpenApi;

use crate::models::{Booking, BookingRequest, ClassName, ClassView, ErrorBody};

#[derive(OpenApi)]
#[openapi(
    info(title = "Fitness Studio Booking API"),
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::list_classes,
        crate::handlers::create_booking,
        crate::handlers::list_bookings
    ),
    components(schemas(ClassName, ClassView, BookingRequest, Booking, ErrorBody)),
    tags(
        (name = "studio", description = "Class catalog and booking operations")
    ),
)]
pub struct ApiDoc;
