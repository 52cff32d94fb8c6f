use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::{
    dtos as admin_dtos, handlers as admin_handlers, models as admin_models,
};
use crate::features::auth;
use crate::features::documents::{
    dtos as documents_dtos, handlers as documents_handlers, models as documents_models,
};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::features::projects::{
    dtos as projects_dtos, handlers as projects_handlers, models as projects_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::modules::storage::SignedUrl;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::get_me,
        // Users
        users_handlers::update_profile,
        users_handlers::change_password,
        users_handlers::get_dashboard,
        // Projects
        projects_handlers::list_projects,
        projects_handlers::create_project,
        projects_handlers::get_project,
        projects_handlers::update_project,
        projects_handlers::delete_project,
        projects_handlers::list_project_files,
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::delete_file,
        files_handlers::assign_project,
        files_handlers::download_file,
        files_handlers::preview_file,
        files_handlers::create_signed_url,
        files_handlers::signed_download,
        files_handlers::upload_attachment,
        files_handlers::list_attachments,
        files_handlers::download_attachment,
        files_handlers::delete_attachment,
        // Documents
        documents_handlers::list_kinds,
        documents_handlers::generate_document,
        // Admin
        admin_handlers::get_stats,
        admin_handlers::list_users,
        admin_handlers::update_user_role,
        admin_handlers::delete_user,
        admin_handlers::list_projects,
        admin_handlers::update_project_status,
        admin_handlers::delete_project,
        admin_handlers::list_files,
        admin_handlers::delete_file,
        admin_handlers::list_audit_logs,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::AuthUserDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::AuthUserDto>,
            // Users
            users_models::UserRole,
            users_dtos::UpdateProfileDto,
            users_dtos::ChangePasswordDto,
            users_dtos::DashboardDto,
            ApiResponse<users_dtos::DashboardDto>,
            // Projects
            projects_models::ProjectStatus,
            projects_dtos::CreateProjectDto,
            projects_dtos::UpdateProjectDto,
            projects_dtos::ProjectResponseDto,
            projects_dtos::ProjectDetailDto,
            projects_dtos::StatusCountDto,
            ApiResponse<projects_dtos::ProjectResponseDto>,
            ApiResponse<Vec<projects_dtos::ProjectResponseDto>>,
            ApiResponse<projects_dtos::ProjectDetailDto>,
            // Files
            files_models::DownloadStatus,
            files_dtos::UploadFileDto,
            files_dtos::UploadAttachmentDto,
            files_dtos::UserFileResponseDto,
            files_dtos::AttachmentResponseDto,
            files_dtos::AssignProjectDto,
            files_dtos::DeleteFileResponseDto,
            SignedUrl,
            ApiResponse<files_dtos::UserFileResponseDto>,
            ApiResponse<Vec<files_dtos::UserFileResponseDto>>,
            ApiResponse<files_dtos::AttachmentResponseDto>,
            ApiResponse<Vec<files_dtos::AttachmentResponseDto>>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            ApiResponse<SignedUrl>,
            // Documents
            documents_models::DocumentKind,
            documents_dtos::GenerateDocumentDto,
            documents_dtos::DocumentKindDto,
            ApiResponse<Vec<documents_dtos::DocumentKindDto>>,
            // Admin
            admin_models::AuditAction,
            admin_dtos::AdminStatsDto,
            admin_dtos::AdminUserDto,
            admin_dtos::UpdateRoleDto,
            admin_dtos::RoleUpdateDto,
            admin_dtos::AdminProjectDto,
            admin_dtos::UpdateStatusDto,
            admin_dtos::StatusUpdateDto,
            admin_dtos::AdminFileDto,
            admin_dtos::AuditLogDto,
            admin_dtos::AdminDeleteDto,
            ApiResponse<admin_dtos::AdminStatsDto>,
            ApiResponse<Vec<admin_dtos::AdminUserDto>>,
            ApiResponse<admin_dtos::RoleUpdateDto>,
            ApiResponse<Vec<admin_dtos::AdminProjectDto>>,
            ApiResponse<admin_dtos::StatusUpdateDto>,
            ApiResponse<Vec<admin_dtos::AdminFileDto>>,
            ApiResponse<Vec<admin_dtos::AuditLogDto>>,
            ApiResponse<admin_dtos::AdminDeleteDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session"),
        (name = "users", description = "The signed-in user's account"),
        (name = "projects", description = "Grant projects"),
        (name = "files", description = "Stored files, attachments and signed download links"),
        (name = "documents", description = "DOCX generation from templates"),
        (name = "admin", description = "Back-office (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Saraban Docs API",
        version = "0.1.0",
        description = "API documentation for Saraban Docs",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
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

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/projects/{id}",
            "/api/files/signed/{id}",
            "/api/files/{id}/attachments",
            "/api/documents/{kind}",
            "/api/admin/audit-logs",
            "/api/users/me/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
