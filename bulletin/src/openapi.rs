//! OpenAPI documentation for `/api/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Documents the HMAC signature the storage service attaches to completion callbacks.
struct CallbackSignatureAddon;

impl Modify for CallbackSignatureAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CallbackSignature".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-upload-signature",
                    "`v1,<base64 HMAC-SHA256>` computed with the shared signing secret over \
                     `{x-upload-timestamp}.{raw body}`. Only enforced when `callback.signing_secret` is configured.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Bulletin API")
    ),
    modifiers(&CallbackSignatureAddon),
    paths(
        api::handlers::uploads::complete_upload,
        api::handlers::configurations::list_configurations,
        api::handlers::configurations::get_configuration,
    ),
    components(
        schemas(
            api::models::uploads::UploadCompleteEvent,
            api::models::uploads::UploadMetadata,
            api::models::uploads::UploadInput,
            api::models::uploads::UploadedFile,
            api::models::uploads::UploadCompleteResponse,
            api::models::configurations::ConfigurationResponse,
            crate::uploads::FileKind,
        )
    ),
    tags(
        (name = "uploads", description = "Completion callbacks from the storage service"),
        (name = "configurations", description = "Bulletin-generation configurations"),
    )
)]
pub struct ApiDoc;
