//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, checkouts, health, orders, reference, subscriptions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshare API",
        version = "1.0.0",
        description = "Book lending marketplace REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::check_password,
        auth::update_password,
        // Reference data
        reference::add_author,
        reference::list_authors,
        reference::list_languages,
        reference::list_categories,
        // Books
        books::available_books,
        books::create_book,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Orders
        orders::create_order,
        orders::my_orders,
        orders::get_order,
        orders::cancel_order,
        // Checkouts
        checkouts::create_checkout,
        checkouts::update_checkout,
        checkouts::return_checkout,
        // Subscriptions
        subscriptions::subscribe,
    ),
    components(
        schemas(
            // Auth
            auth::AuthPayload,
            crate::models::user::User,
            crate::models::user::CreateAccount,
            crate::models::user::LoginRequest,
            crate::models::user::UpdateProfile,
            crate::models::user::PasswordCheck,
            crate::models::user::ChangePassword,
            // Reference data
            crate::models::reference::Author,
            crate::models::reference::Language,
            crate::models::reference::Category,
            crate::models::reference::CreateAuthor,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::enums::BookStatus,
            // Orders
            crate::models::order::Order,
            crate::models::enums::OrderStatus,
            // Checkouts
            crate::models::checkout::Checkout,
            crate::models::checkout::CreateCheckout,
            crate::models::checkout::UpdateCheckout,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorKind,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sign-in"),
        (name = "reference", description = "Authors, languages and categories"),
        (name = "books", description = "Book listings"),
        (name = "orders", description = "Orders on listed books"),
        (name = "checkouts", description = "Checkouts and returns"),
        (name = "subscriptions", description = "Lifecycle event streams")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
