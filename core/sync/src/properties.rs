//! Front matter to page property mapping.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use notionsync_common::{Error, Result};
use notionsync_notion::{PageProperty, PropertyValue, RichText};

/// Front-matter keys never sent as properties. `link` and `notionID` are
/// written back by the sync itself and `title` would clash with `Name`.
pub const RESERVED_KEYS: [&str; 4] = ["__content", "link", "notionID", "title"];

/// Key holding the page tags.
pub const TAGS_KEY: &str = "tags";

/// Convert front matter into page properties, keeping front-matter order.
///
/// Only strings and finite numbers are mapped. A `url` key becomes a URL
/// property; everything else that is not supported is skipped without error.
pub fn map_properties(front_matter: &Mapping) -> Vec<PageProperty> {
    let mut properties = Vec::new();

    for (key, value) in front_matter {
        let Some(key) = key.as_str() else {
            continue;
        };
        if RESERVED_KEYS.contains(&key) {
            continue;
        }

        let mapped = if key == "url" {
            value.as_str().map(|url| PropertyValue::Url(url.to_string()))
        } else {
            match value {
                Value::String(text) => Some(PropertyValue::RichText(vec![RichText::plain(
                    text.as_str(),
                )])),
                Value::Number(number) => to_json_number(number).map(PropertyValue::Number),
                _ => None,
            }
        };

        match mapped {
            Some(value) => properties.push(PageProperty::new(key, value)),
            None => debug!("Skipping front matter key {}", key),
        }
    }

    properties
}

fn to_json_number(number: &serde_yaml::Number) -> Option<serde_json::Number> {
    if let Some(i) = number.as_i64() {
        Some(serde_json::Number::from(i))
    } else if let Some(u) = number.as_u64() {
        Some(serde_json::Number::from(u))
    } else {
        number.as_f64().and_then(serde_json::Number::from_f64)
    }
}

/// Read the tag list from front matter.
///
/// Accepts a sequence of strings or a single string of comma or whitespace
/// separated tags. A leading `#` is dropped from each tag. A missing or null
/// `tags` key yields `None`.
///
/// # Errors
/// - `Error::InvalidInput` for any other shape
pub fn extract_tags(front_matter: &Mapping) -> Result<Option<Vec<String>>> {
    let Some(value) = front_matter.get(TAGS_KEY) else {
        return Ok(None);
    };

    let raw: Vec<String> = match value {
        Value::Null => return Ok(None),
        Value::String(text) => text
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::to_string)
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => Ok(text.clone()),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(Error::InvalidInput(
                    "Tags must be strings".to_string(),
                )),
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(Error::InvalidInput(
                "Tags must be a list or a string".to_string(),
            ))
        }
    };

    let tags = raw
        .iter()
        .map(|tag| tag.trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some(tags))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Mapping {
        serde_yaml::from_str(text).unwrap()
    }

    fn names(props: &[PageProperty]) -> Vec<&str> {
        props.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_reserved_keys_skipped() {
        let fm = yaml(
            "title: T\nlink: https://x\nnotionID: abc\n__content: body\nauthor: Ann\n",
        );
        let props = map_properties(&fm);
        assert_eq!(names(&props), vec!["author"]);
    }

    #[test]
    fn test_value_types() {
        let fm = yaml(
            "author: Ann\nrating: 5\nscore: 2.5\ndraft: true\nlist: [a, b]\nnested: {a: 1}\nempty: ~\n",
        );
        let props = map_properties(&fm);
        assert_eq!(names(&props), vec!["author", "rating", "score"]);

        match &props[0].value {
            PropertyValue::RichText(segments) => {
                assert_eq!(segments.len(), 1);
                assert_eq!(segments[0].plain_text(), "Ann");
            }
            other => panic!("unexpected value: {other:?}"),
        }
        assert_eq!(
            props[1].value,
            PropertyValue::Number(serde_json::Number::from(5))
        );
        assert_eq!(
            props[2].value,
            PropertyValue::Number(serde_json::Number::from_f64(2.5).unwrap())
        );
    }

    #[test]
    fn test_url_key() {
        let props = map_properties(&yaml("url: https://example.com\n"));
        assert_eq!(
            props[0].value,
            PropertyValue::Url("https://example.com".to_string())
        );

        let props = map_properties(&yaml("url: 42\n"));
        assert!(props.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let props = map_properties(&yaml("zeta: z\nalpha: a\nmid: 3\n"));
        assert_eq!(names(&props), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_non_finite_number_skipped() {
        let props = map_properties(&yaml("n: .nan\ni: .inf\n"));
        assert!(props.is_empty());
    }

    #[test]
    fn test_tags_sequence() {
        let tags = extract_tags(&yaml("tags: ['#rust', notes]\n")).unwrap();
        assert_eq!(tags, Some(vec!["rust".to_string(), "notes".to_string()]));
    }

    #[test]
    fn test_tags_string() {
        let tags = extract_tags(&yaml("tags: 'rust, notes #sync'\n")).unwrap();
        assert_eq!(
            tags,
            Some(vec!["rust".to_string(), "notes".to_string(), "sync".to_string()])
        );
    }

    #[test]
    fn test_tags_missing_or_null() {
        assert_eq!(extract_tags(&yaml("a: 1\n")).unwrap(), None);
        assert_eq!(extract_tags(&yaml("tags:\n")).unwrap(), None);
    }

    #[test]
    fn test_tags_bad_shape() {
        assert!(extract_tags(&yaml("tags: {a: 1}\n")).is_err());
        assert!(extract_tags(&yaml("tags: [[a]]\n")).is_err());
        assert!(extract_tags(&yaml("tags: true\n")).is_err());
    }
}
