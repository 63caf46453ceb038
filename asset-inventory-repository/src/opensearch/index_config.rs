//! Index template for the asset indices.

use serde_json::{json, Value};

use crate::config::AssetIndexNaming;

/// The name the asset index template is installed under.
pub const INDEX_TEMPLATE_NAME: &str = "assets";

/// Get the index template body for the asset indices.
///
/// The template:
/// - matches every index under the asset prefix
/// - disables `subobjects` so dotted names like `asset.ean` stay flat keys
/// - maps every string to a `keyword`
/// - maps `@timestamp` as a `date`
pub fn get_index_template(naming: &AssetIndexNaming) -> Value {
    json!({
        "index_patterns": [naming.pattern()],
        "priority": 100,
        "template": {
            "settings": {},
            "mappings": {
                "subobjects": false,
                "dynamic_templates": [
                    {
                        "strings_as_keywords": {
                            "match_mapping_type": "string",
                            "mapping": {
                                "type": "keyword",
                                "ignore_above": 1024
                            }
                        }
                    }
                ],
                "properties": {
                    "@timestamp": {
                        "type": "date"
                    }
                }
            }
        }
    })
}
