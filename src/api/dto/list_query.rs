/*
 * Responsibility
 * - list (GET /{collection}) の query string を store の Query に変換
 * - `sort` / `limit` / `offset` 以外の key は schema の field として扱う
 *   (値は field の型に合わせて変換、未知の key は 400)
 */
use url::form_urlencoded;

use crate::schema::{Schema, ValidationError};
use crate::services::store::{Query, Sort};

pub fn parse_list_query(schema: &Schema, raw: Option<&str>) -> Result<Query, ValidationError> {
    let mut query = Query::default();

    for (name, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        match name.as_ref() {
            "sort" => query.sort = parse_sort(schema, &value)?,
            "limit" => query.limit = Some(parse_count("limit", &value)?),
            "offset" => query.offset = parse_count("offset", &value)?,
            field => {
                let filter_value = schema.coerce_param(field, &value)?;
                // a repeated key: the last one wins
                query.filter.insert(field.to_string(), filter_value);
            }
        }
    }

    Ok(query)
}

// `createdAt` → ascending, `-createdAt` → descending
fn parse_sort(schema: &Schema, raw: &str) -> Result<Sort, ValidationError> {
    let (field, descending) = match raw.strip_prefix('-') {
        Some(field) => (field, true),
        None => (raw, false),
    };

    if schema.field(field).is_none() {
        return Err(ValidationError::InvalidParameter {
            name: "sort".to_string(),
            value: raw.to_string(),
        });
    }

    Ok(Sort {
        field: field.to_string(),
        descending,
    })
}

fn parse_count(name: &str, raw: &str) -> Result<usize, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidParameter {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CATEGORIES, CREATED_AT_FIELD, OWNER_FIELD, TODOS};
    use serde_json::{Value, json};

    #[test]
    fn empty_query_lists_newest_first() {
        let query = parse_list_query(&TODOS, None).unwrap();
        assert!(query.filter.is_empty());
        assert_eq!(query.sort, Sort::default());
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn field_filters_are_typed() {
        let query = parse_list_query(
            &TODOS,
            Some("isDone=false&categoryID=abc123&creatorID=user_1"),
        )
        .unwrap();

        assert_eq!(query.filter["isDone"], json!(false));
        assert_eq!(query.filter["categoryID"], json!("abc123"));
        assert_eq!(query.filter[OWNER_FIELD], json!("user_1"));
    }

    #[test]
    fn names_are_url_decoded() {
        let query = parse_list_query(&CATEGORIES, Some("name=Home%20%26%20Garden")).unwrap();
        assert_eq!(query.filter["name"], Value::String("Home & Garden".into()));
    }

    #[test]
    fn paging_and_sort_parameters() {
        let query = parse_list_query(&TODOS, Some("sort=createdAt&limit=20&offset=40")).unwrap();
        assert_eq!(
            query.sort,
            Sort {
                field: CREATED_AT_FIELD.to_string(),
                descending: false
            }
        );
        assert_eq!(query.limit, Some(20));
        assert_eq!(query.offset, 40);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert_eq!(
            parse_list_query(&TODOS, Some("owner=me")),
            Err(ValidationError::UnknownParameter("owner".into()))
        );
        assert!(parse_list_query(&TODOS, Some("limit=-1")).is_err());
        assert!(parse_list_query(&TODOS, Some("sort=-password")).is_err());
        assert!(parse_list_query(&TODOS, Some("isDone=yes")).is_err());
    }
}
