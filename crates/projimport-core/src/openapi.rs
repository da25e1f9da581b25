//! Helpers for combining the OpenAPI documents contributed by plugins

use utoipa::openapi::{ComponentsBuilder, ContactBuilder, InfoBuilder, OpenApi, OpenApiBuilder};

/// Base document that plugin schemas are merged into.
pub fn base_document(version: &str) -> OpenApi {
    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title("Project Importer")
                .description(Some(
                    "Bootstraps managed projects by importing existing git repositories",
                ))
                .version(version)
                .contact(Some(
                    ContactBuilder::new()
                        .name(Some("Projimport Contributors"))
                        .build(),
                ))
                .build(),
        )
        .components(Some(ComponentsBuilder::new().build()))
        .build()
}

/// Merges `schemas` into `base`.
///
/// Paths, component schemas, responses and security schemes from later
/// documents replace same-named entries of earlier ones. Tags and servers are
/// appended.
pub fn merge_openapi_schemas(mut base: OpenApi, schemas: Vec<OpenApi>) -> OpenApi {
    for schema in schemas {
        base.paths.paths.extend(schema.paths.paths);

        if let Some(components) = schema.components {
            let base_components = base.components.get_or_insert_with(Default::default);
            base_components.schemas.extend(components.schemas);
            base_components.responses.extend(components.responses);
            base_components
                .security_schemes
                .extend(components.security_schemes);
        }

        if let Some(tags) = schema.tags {
            base.tags.get_or_insert_with(Vec::new).extend(tags);
        }

        if let Some(servers) = schema.servers {
            base.servers.get_or_insert_with(Vec::new).extend(servers);
        }

        if schema.external_docs.is_some() && base.external_docs.is_none() {
            base.external_docs = schema.external_docs;
        }
    }

    base
}
