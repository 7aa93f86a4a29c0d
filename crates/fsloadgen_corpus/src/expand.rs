//! Expands `${ENTITY_ID}` placeholders in parsed templates against an
//! [`EntityMap`], producing the ordered corpus of concrete [`Request`]s.

use fsloadgen_request::Request;

use crate::entity_map::EntityMap;
use crate::error::{Error, Result};
use crate::template::{RequestTemplate, TemplateShape};

const PLACEHOLDER: &str = "${ENTITY_ID}";

/// Expands one template into one or more concrete requests.
///
/// A template whose shape contains no `${ENTITY_ID}` placeholder is emitted
/// unchanged, exactly once. Otherwise the template is expanded once per
/// entity registered for its `(featurestore_id, entity_type)` pair, in
/// listing order:
///
/// - Single-entity (`ReadFeatureValuesRequest`): the `entity_id` field is
///   replaced wholesale by each entity in turn (a Cartesian expansion over
///   the one placeholder slot available).
/// - Streaming (`StreamingReadFeatureValuesRequest`): a placeholder slot is
///   replaced in-place by the entire known entity set, flattened into the
///   surrounding `entity_ids` list; literal (non-placeholder) entries are
///   left untouched. This always yields exactly one `Request`; unlike the
///   single-entity case, streaming expansion is not a Cartesian product.
pub fn expand_template(template: &RequestTemplate, entities: &EntityMap) -> Result<Vec<Request>> {
    match &template.shape {
        TemplateShape::Single(entity_id) => {
            if entity_id == PLACEHOLDER {
                let ids = lookup(template, entities)?;
                ids.iter()
                    .map(|id| {
                        Request::single(
                            template.featurestore_id.clone(),
                            template.entity_type.clone(),
                            id.clone(),
                            template.feature_ids.clone(),
                        )
                        .map_err(Error::from)
                    })
                    .collect()
            } else {
                Ok(vec![Request::single(
                    template.featurestore_id.clone(),
                    template.entity_type.clone(),
                    entity_id.clone(),
                    template.feature_ids.clone(),
                )?])
            }
        }
        TemplateShape::Streaming(entity_ids) => {
            let has_placeholder = entity_ids.iter().any(|id| id == PLACEHOLDER);
            let substituted = if has_placeholder {
                let ids = lookup(template, entities)?;
                let mut out = Vec::with_capacity(entity_ids.len() - 1 + ids.len());
                for slot in entity_ids {
                    if slot == PLACEHOLDER {
                        out.extend(ids.iter().cloned());
                    } else {
                        out.push(slot.clone());
                    }
                }
                out
            } else {
                entity_ids.clone()
            };
            Ok(vec![Request::streaming(
                template.featurestore_id.clone(),
                template.entity_type.clone(),
                substituted,
                template.feature_ids.clone(),
            )?])
        }
    }
}

fn lookup<'a>(template: &RequestTemplate, entities: &'a EntityMap) -> Result<&'a [String]> {
    let ids = entities
        .entities_for(&template.featurestore_id, &template.entity_type)
        .ok_or_else(|| Error::NoMatchingEntities {
            entity_type: template.entity_type.clone(),
        })?;
    if ids.is_empty() {
        return Err(Error::NoMatchingEntities {
            entity_type: template.entity_type.clone(),
        });
    }
    Ok(ids)
}

/// Expands a full list of templates in order, concatenating each
/// template's expansion in turn so corpus order matches template-then-entity
/// order.
pub fn expand_all(templates: &[RequestTemplate], entities: &EntityMap) -> Result<Vec<Request>> {
    let mut out = Vec::new();
    for template in templates {
        out.extend(expand_template(template, entities)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_map::EntityMap;

    fn template_single(placeholder: bool) -> RequestTemplate {
        RequestTemplate {
            featurestore_id: "fs1".to_string(),
            entity_type: "users".to_string(),
            shape: TemplateShape::Single(if placeholder {
                PLACEHOLDER.to_string()
            } else {
                "fixed-id".to_string()
            }),
            feature_ids: vec!["age".to_string()],
        }
    }

    #[test]
    fn single_entity_expands_to_one_request_per_entity() {
        let listing = "featurestores/fs1/entityTypes/users/entities/u1\n\
                        featurestores/fs1/entityTypes/users/entities/u2\n\
                        featurestores/fs1/entityTypes/users/entities/u3";
        let entities = EntityMap::parse(listing).unwrap();
        let requests = expand_template(&template_single(true), &entities).unwrap();
        assert_eq!(requests.len(), 3);
        for (req, id) in requests.iter().zip(["u1", "u2", "u3"]) {
            assert_eq!(
                req.entity_ref,
                fsloadgen_request::EntityRef::Single(id.to_string())
            );
        }
    }

    #[test]
    fn literal_template_is_not_expanded() {
        let entities = EntityMap::default();
        let requests = expand_template(&template_single(false), &entities).unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn missing_entities_is_an_error() {
        let entities = EntityMap::default();
        let err = expand_template(&template_single(true), &entities).unwrap_err();
        assert!(matches!(err, Error::NoMatchingEntities { .. }));
    }

    #[test]
    fn streaming_substitutes_the_whole_entity_set_in_place_as_one_request() {
        let template = RequestTemplate {
            featurestore_id: "fs1".to_string(),
            entity_type: "users".to_string(),
            shape: TemplateShape::Streaming(vec![
                PLACEHOLDER.to_string(),
                "fixed-neighbor".to_string(),
            ]),
            feature_ids: vec!["age".to_string()],
        };
        let listing = "featurestores/fs1/entityTypes/users/entities/u1\n\
                        featurestores/fs1/entityTypes/users/entities/u2";
        let entities = EntityMap::parse(listing).unwrap();
        let requests = expand_template(&template, &entities).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].entity_ref,
            fsloadgen_request::EntityRef::Streaming(vec![
                "u1".to_string(),
                "u2".to_string(),
                "fixed-neighbor".to_string()
            ])
        );
    }
}
