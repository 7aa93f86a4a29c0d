//! Builds the ordered corpus of requests a run will replay.
//!
//! A corpus is produced by parsing a request template (see [`template`])
//! and an entity listing (see [`entity_map`]), then expanding every
//! `${ENTITY_ID}` placeholder in the template against the listing (see
//! [`expand`]). Template and listing documents are read through the
//! [`source::BlobSource`] and [`source::WarehouseEntitySource`] traits so
//! the builder stays agnostic to whether they live on local disk, in
//! object storage, or behind a warehouse query.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod entity_map;
pub mod error;
pub mod expand;
pub mod source;
pub mod template;

pub use entity_map::EntityMap;
pub use error::{Error, Result};
pub use source::{
    BlobSource, LocalFileBlobSource, LocalWarehouseEntitySource, WarehouseEntitySource, WarehouseRow,
};
pub use template::{RequestTemplate, TemplateShape};

use fsloadgen_request::Request;

/// Where the entity listing comes from.
pub enum EntityListingSource<'a> {
    /// A blob URI, read through a [`BlobSource`].
    Blob(&'a str),
    /// A warehouse query, read through a [`WarehouseEntitySource`].
    Warehouse(&'a str),
}

/// Builds an ordered [`Request`] corpus from a template URI and an entity
/// listing, reading both through the supplied sources.
///
/// # Errors
///
/// Returns [`Error::ExternalUnavailable`] if either document cannot be
/// read, [`Error::InputMalformed`] if either document fails to parse, or
/// [`Error::NoMatchingEntities`] if a placeholder-bearing template has no
/// matching entities in the listing.
pub fn build_corpus(
    blobs: &dyn BlobSource,
    warehouse: &dyn WarehouseEntitySource,
    template_uri: &str,
    listing: EntityListingSource<'_>,
) -> Result<Vec<Request>> {
    let template_doc = blobs.read_to_string(template_uri)?;
    let templates = template::parse_template(&template_doc)?;

    let entities = match listing {
        EntityListingSource::Blob(uri) => EntityMap::parse(&blobs.read_to_string(uri)?)?,
        EntityListingSource::Warehouse(query) => {
            let mut entities = EntityMap::default();
            for row in warehouse.query(query)? {
                entities.insert(row.featurestore_id, row.entity_type_id, row.entity_id);
            }
            entities
        }
    };

    let corpus = expand::expand_all(&templates, &entities)?;
    tracing::debug!(
        template_count = templates.len(),
        entity_groups = entities.group_count(),
        corpus_size = corpus.len(),
        "corpus built"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticBlobSource {
        template: &'static str,
        listing: &'static str,
    }

    impl BlobSource for StaticBlobSource {
        fn read_to_string(&self, uri: &str) -> Result<String> {
            match uri {
                "template.textpb" => Ok(self.template.to_string()),
                "listing.txt" => Ok(self.listing.to_string()),
                other => Err(Error::ExternalUnavailable(format!("no such blob: {other}"))),
            }
        }
    }

    struct UnusedWarehouse;
    impl WarehouseEntitySource for UnusedWarehouse {
        fn query(&self, query: &str) -> Result<Vec<WarehouseRow>> {
            Err(Error::ExternalUnavailable(format!("unexpected query: {query}")))
        }
    }

    struct StaticWarehouse(Vec<WarehouseRow>);
    impl WarehouseEntitySource for StaticWarehouse {
        fn query(&self, _query: &str) -> Result<Vec<WarehouseRow>> {
            Ok(self.0.clone())
        }
    }

    const TEMPLATE: &str = r#"
        requests_per_featurestore {
          featurestore_id: "fs1"
          requests {
            read_feature_values_request {
              entity_type: "users"
              entity_id: "${ENTITY_ID}"
              feature_selector { id_matcher { ids: "age" ids: "income" } }
            }
          }
        }
    "#;

    const LISTING: &str = "featurestores/fs1/entityTypes/users/entities/u1\n\
                            featurestores/fs1/entityTypes/users/entities/u2\n\
                            featurestores/fs1/entityTypes/users/entities/u3";

    #[test]
    fn end_to_end_corpus_build_expands_one_template_to_k_requests() {
        let blobs = StaticBlobSource {
            template: TEMPLATE,
            listing: LISTING,
        };
        let corpus = build_corpus(
            &blobs,
            &UnusedWarehouse,
            "template.textpb",
            EntityListingSource::Blob("listing.txt"),
        )
        .unwrap();
        assert_eq!(corpus.len(), 3);
        assert!(corpus.iter().all(Request::is_single));
    }

    #[test]
    fn warehouse_rows_fold_into_the_entity_map_directly() {
        let blobs = StaticBlobSource {
            template: TEMPLATE,
            listing: LISTING,
        };
        let warehouse = StaticWarehouse(vec![
            WarehouseRow {
                featurestore_id: "fs1".to_string(),
                entity_type_id: "users".to_string(),
                entity_id: "u1".to_string(),
            },
            WarehouseRow {
                featurestore_id: "fs1".to_string(),
                entity_type_id: "users".to_string(),
                entity_id: "u2".to_string(),
            },
        ]);
        let corpus = build_corpus(
            &blobs,
            &warehouse,
            "template.textpb",
            EntityListingSource::Warehouse("select * from entities"),
        )
        .unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(corpus.iter().all(Request::is_single));
    }

    #[test]
    fn missing_template_blob_is_external_unavailable() {
        let blobs = StaticBlobSource {
            template: TEMPLATE,
            listing: LISTING,
        };
        let err = build_corpus(
            &blobs,
            &UnusedWarehouse,
            "missing.textpb",
            EntityListingSource::Blob("listing.txt"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ExternalUnavailable(_)));
    }
}
