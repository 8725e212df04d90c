use axum::{
    body::Body,
    routing::{get, post},
    Json, Router,
};
use warden_oauth2::{scope_catalog, Authority, KeySetSource, SecurityDescriptor};
use warden_tower::Oauth2Authorizer;

scope_catalog! {
    /// The scopes understood by the demo API
    pub enum ApiScope {
        /// Read messages
        ReadMessages = ("read:messages", "Read Messages"),
        /// Create messages
        CreateMessages = ("create:messages", "Create Messages"),
    }
}

/// Builds the demo API, verifying tokens with keys from `keys`
pub fn app<K>(descriptor: &SecurityDescriptor<ApiScope>, client_id: &str, keys: K) -> Router
where
    K: KeySetSource + 'static,
{
    let authorizer =
        Oauth2Authorizer::<_, ApiScope, Body>::new(Authority::from_descriptor(descriptor, keys));
    let scheme = descriptor.oauth2_scheme(client_id);

    Router::new()
        .route("/public", get(public))
        .route(
            "/authenticated",
            get(authenticated).route_layer(authorizer.authenticated()),
        )
        .route(
            "/messages",
            get(read_messages)
                .route_layer(authorizer.security([ApiScope::ReadMessages]))
                .merge(
                    post(create_messages)
                        .route_layer(authorizer.security([ApiScope::CreateMessages])),
                ),
        )
        .route("/docs/oauth2", get(move || async move { Json(scheme) }))
}

async fn public() -> &'static str {
    "Success. You don't need to be authenticated to call this"
}

async fn authenticated() -> &'static str {
    "Success. You only get this message if you're authenticated"
}

async fn read_messages() -> &'static str {
    "Success, authenticated with the 'read:messages' scope"
}

async fn create_messages() -> &'static str {
    "Success, authenticated with the 'create:messages' scope"
}
