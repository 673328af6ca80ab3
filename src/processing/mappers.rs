//! Mapping helpers from partition elements to response bodies.

use crate::{
    config::ResponseShape,
    partition::Element,
    processing::types::{ElementRecord, PartitionResponse},
};

/// Render elements in the requested response shape, preserving order.
pub fn build_response(elements: &[Element], shape: ResponseShape) -> PartitionResponse {
    match shape {
        ResponseShape::Chunks => PartitionResponse::Chunks {
            chunks: elements.iter().map(ToString::to_string).collect(),
        },
        ResponseShape::Elements => PartitionResponse::Elements {
            data: elements.iter().map(map_element).collect(),
        },
    }
}

fn map_element(element: &Element) -> ElementRecord {
    ElementRecord {
        category: element.category.to_string(),
        text: element.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{ElementCategory, ElementMetadata};
    use serde_json::json;

    fn element(category: ElementCategory, text: &str) -> Element {
        Element {
            element_id: "id".into(),
            category,
            text: text.into(),
            metadata: ElementMetadata::default(),
        }
    }

    #[test]
    fn chunks_shape_serializes_bare_strings() {
        let elements = vec![
            element(ElementCategory::Title, "Intro"),
            element(ElementCategory::PageBreak, ""),
        ];
        let body = serde_json::to_value(build_response(&elements, ResponseShape::Chunks))
            .expect("serialize");

        assert_eq!(body, json!({ "chunks": ["Intro", ""] }));
    }

    #[test]
    fn elements_shape_serializes_records() {
        let elements = vec![element(ElementCategory::NarrativeText, "Body text.")];
        let body = serde_json::to_value(build_response(&elements, ResponseShape::Elements))
            .expect("serialize");

        assert_eq!(
            body,
            json!({ "data": [{ "category": "NarrativeText", "text": "Body text." }] })
        );
    }

    #[test]
    fn empty_input_keeps_shape() {
        let body = serde_json::to_value(build_response(&[], ResponseShape::Elements))
            .expect("serialize");
        assert_eq!(body, json!({ "data": [] }));
    }
}
