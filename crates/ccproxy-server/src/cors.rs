use ccproxy_config::{AnyOrArray, CorsConfig};
use http::Method;
use http::header::HeaderName;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
///
/// Entries that fail to parse are skipped.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = match &config.origins {
        AnyOrArray::Any => CorsLayer::new().allow_origin(AllowOrigin::any()),
        AnyOrArray::List(origins) => CorsLayer::new().allow_origin(parse_all::<http::HeaderValue>(origins)),
    };

    let layer = match &config.methods {
        AnyOrArray::Any => layer.allow_methods(AllowMethods::any()),
        AnyOrArray::List(methods) => layer.allow_methods(parse_all::<Method>(methods)),
    };

    let mut layer = match &config.headers {
        AnyOrArray::Any => layer.allow_headers(AllowHeaders::any()),
        AnyOrArray::List(headers) => layer.allow_headers(parse_all::<HeaderName>(headers)),
    };

    if !config.expose_headers.is_empty() {
        layer = layer.expose_headers(parse_all::<HeaderName>(&config.expose_headers));
    }

    if let Some(duration) = config.max_age_duration() {
        layer = layer.max_age(duration);
    }

    layer
}

fn parse_all<T: std::str::FromStr>(values: &[String]) -> Vec<T> {
    values.iter().filter_map(|v| v.parse().ok()).collect()
}
