//! Ready-made [`HostExtension`]s.
use axum::Router;

use crate::{
    adapters::CorrelationIdLayer,
    config::HostConfigValidator,
    core::web_host::{HostExtension, extension},
};

/// Propagate the correlation id configured under `correlation_id.header_name`.
///
/// Fails the host composition when the section is missing or invalid.
pub fn correlation_id() -> HostExtension {
    extension(|builder, config, logger| {
        let options = HostConfigValidator::require_correlation_id(config)?;
        let layer = CorrelationIdLayer::new(options)?;
        tracing::info!(
            parent: logger,
            header = %layer.header_name(),
            "Correlation id propagation enabled"
        );
        Ok(builder.layer(layer))
    })
}

/// Merge additional routes into the host.
pub fn routes(router: Router) -> HostExtension {
    extension(move |builder, _config, _logger| Ok(builder.merge(router.clone())))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request, routing::get};
    use tower::ServiceExt; // for oneshot
    use tracing::Span;

    use super::*;
    use crate::{
        config::{CorrelationIdOptions, HostConfig},
        core::{HostBuilder, web_host::apply_extensions},
    };

    fn config_with_header(header: &str) -> HostConfig {
        HostConfig {
            correlation_id: Some(CorrelationIdOptions::new(header)),
            ..HostConfig::default()
        }
    }

    fn compose(config: &HostConfig, extensions: &[HostExtension]) -> eyre::Result<Router> {
        let builder = HostBuilder::new("test-app", Vec::new(), config)?;
        let host = apply_extensions(builder, extensions, config, &Span::none())?.build()?;
        Ok(host.router())
    }

    #[test]
    fn test_correlation_id_requires_configuration() {
        let err = compose(&HostConfig::default(), &[correlation_id()])
            .err()
            .unwrap();
        assert!(format!("{err:?}").contains("correlation_id.header_name"));
    }

    #[tokio::test]
    async fn test_extension_order_does_not_change_result() {
        let config = config_with_header("X-Correlation-ID");
        let hello = Router::new().route("/hello", get(|| async { "hello" }));

        let orders = [
            vec![correlation_id(), routes(hello.clone())],
            vec![routes(hello.clone()), correlation_id()],
        ];

        for extensions in orders {
            let router = compose(&config, &extensions).unwrap();
            let response = router
                .oneshot(
                    Request::builder()
                        .uri("/hello")
                        .header("X-Correlation-ID", "ordered")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.headers().get("X-Correlation-ID").unwrap(), "ordered");
        }
    }
}
