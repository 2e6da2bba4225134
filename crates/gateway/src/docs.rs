use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::rest;

#[derive(OpenApi)]
#[openapi(
    paths(
        rest::health::health_check,
        rest::auth::register,
        rest::auth::login,
        rest::auth::logout,
        rest::auth::me,
        rest::auth::change_password,
        rest::members::list_members,
        rest::members::create_member,
        rest::members::own_member,
        rest::members::get_member,
        rest::members::update_member,
        rest::members::delete_member,
        rest::members::verify_member,
        rest::members::reject_member,
        rest::members::upload_photo,
        rest::members::upload_id_card,
        rest::members::list_provinces,
        rest::roles::list_roles,
        rest::roles::create_role,
        rest::roles::get_role,
        rest::roles::update_role,
        rest::roles::delete_role,
        rest::roles::set_role_permissions,
        rest::roles::list_permissions,
        rest::roles::get_permission,
        rest::roles::assign_role,
        rest::roles::revoke_role,
        rest::tickets::list_tickets,
        rest::tickets::create_ticket,
        rest::tickets::get_ticket,
        rest::tickets::reply_ticket,
        rest::tickets::assign_ticket,
        rest::tickets::change_ticket_status,
        rest::blog::list_published_posts,
        rest::blog::read_post,
        rest::blog::list_posts,
        rest::blog::create_post,
        rest::blog::get_post,
        rest::blog::update_post,
        rest::blog::bulk_posts,
        rest::blog::list_categories,
        rest::blog::create_category,
        rest::surveys::list_surveys,
        rest::surveys::create_survey,
        rest::surveys::get_survey,
        rest::surveys::update_survey,
        rest::surveys::delete_survey,
        rest::surveys::publish_survey,
        rest::surveys::respond_survey,
        rest::surveys::survey_results,
        rest::organization::organization_chart,
        rest::organization::create_position,
        rest::organization::update_position,
        rest::organization::delete_position,
        rest::statistics::dashboard
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            rest::health::HealthResponse,
            rest::auth::RegisterRequest,
            rest::auth::LoginRequest,
            rest::auth::ChangePasswordRequest,
            rest::auth::SessionResponse,
            rest::auth::UserResponse,
            rest::roles::SetPermissionsRequest,
            rest::roles::AssignRoleRequest,
            rest::roles::AssignRoleResponse,
            rest::tickets::AssignTicketRequest,
            rest::blog::CreateCategoryRequest,
            rest::surveys::PublishRequest,
            rest::surveys::ResponseCreated
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Registration, sessions and the current user"),
        (name = "Members", description = "Member profiles, verification and documents"),
        (name = "Roles", description = "Roles, permissions and role assignment"),
        (name = "Tickets", description = "Complaint tickets"),
        (name = "Blog", description = "News posts and categories"),
        (name = "Surveys", description = "Surveys, responses and results"),
        (name = "Organization", description = "Board structure per period"),
        (name = "Statistics", description = "Dashboard aggregates")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
