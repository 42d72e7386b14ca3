/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP
/// request, extracting the necessary data, calling the appropriate
/// repository functions, and returning a properly formatted response.
///
/// Authentication is handled by the `AuthUser` / `AdminUser` extractors;
/// a handler taking one of them can only run for an authenticated (or
/// admin) caller.

mod auth_handlers;
mod company_handlers;
mod dashboard_handlers;
mod student_handlers;
mod user_handlers;
mod year_handlers;

// Re-export all handlers
pub use auth_handlers::*;
pub use company_handlers::*;
pub use dashboard_handlers::*;
pub use student_handlers::*;
pub use user_handlers::*;
pub use year_handlers::*;
