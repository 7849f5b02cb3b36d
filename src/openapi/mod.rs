use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scanner Log API",
        version = "0.1.0",
        description = r#"
Inventory tracking backend.

Authenticate with `POST /token` (form fields `username`, `password`) and send the
returned token on every other request:

```
Authorization: Bearer <access_token>
```

Creating or updating an item whose quantity is at or below its minimum records a
low-stock notification for the acting user.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "auth", description = "Registration, login and current user"),
        (name = "items", description = "Inventory items"),
        (name = "notifications", description = "Low-stock alerts"),
        (name = "health", description = "Health probes")
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::register,
        crate::handlers::auth::me,

        crate::handlers::items::create_item,
        crate::handlers::items::list_items,
        crate::handlers::items::export_items,
        crate::handlers::items::get_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,

        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::notifications::mark_all_notifications_read,

        crate::handlers::health::healthz,
        crate::handlers::health::protected_healthz,
    ),
    components(
        schemas(
            crate::handlers::auth::TokenRequest,
            crate::handlers::auth::TokenResponse,
            crate::handlers::auth::UserResponse,
            crate::handlers::health::HealthResponse,
            crate::services::RegisterUser,
            crate::services::CreateItemInput,
            crate::services::UpdateItemInput,
            crate::entities::item::Model,
            crate::entities::notification::Model,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Swagger UI at `/docs`, backed by `/openapi.json`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi())
}
