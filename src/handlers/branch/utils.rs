use serde::Deserialize;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::error::ApiError;
use crate::services::branch_service::PageRequest;

/// Raw `?limit=&skip=` parameters; parsed by hand so bad input gets the
/// JSON error envelope instead of axum's plain-text rejection
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub skip: Option<String>,
}

impl PageQuery {
    pub fn resolve(&self, pagination: &PaginationConfig) -> Result<PageRequest, ApiError> {
        let limit = parse_count("limit", self.limit.as_deref())?
            .unwrap_or(pagination.default_limit)
            .min(pagination.max_limit);
        let skip = parse_count("skip", self.skip.as_deref())?.unwrap_or(0);

        Ok(PageRequest { limit, skip })
    }
}

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<usize>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{} must be a non-negative integer", name))),
    }
}

pub fn parse_id(raw: &str, name: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_id(format!("invalid {}: {}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> PaginationConfig {
        PaginationConfig {
            default_limit: 20,
            max_limit: 50,
        }
    }

    fn query(limit: Option<&str>, skip: Option<&str>) -> PageQuery {
        PageQuery {
            limit: limit.map(str::to_string),
            skip: skip.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply_when_absent() {
        let page = PageQuery::default().resolve(&pagination()).unwrap();
        assert_eq!(page, PageRequest { limit: 20, skip: 0 });
    }

    #[test]
    fn explicit_values_are_used_and_limit_is_clamped() {
        let page = query(Some("5"), Some("10")).resolve(&pagination()).unwrap();
        assert_eq!(page, PageRequest { limit: 5, skip: 10 });

        let page = query(Some("500"), None).resolve(&pagination()).unwrap();
        assert_eq!(page.limit, 50);
    }

    #[test]
    fn garbage_is_a_bad_request() {
        assert!(matches!(
            query(Some("ten"), None).resolve(&pagination()),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            query(None, Some("-1")).resolve(&pagination()),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(matches!(parse_id("not-a-uuid", "branch_id"), Err(ApiError::InvalidId(_))));
        assert!(parse_id("67e55044-10b1-426f-9247-bb680e5fe0c8", "branch_id").is_ok());
    }
}
