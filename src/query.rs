//! List query parameters: `filter`, `orderby`, `offset`, `limit`.

use crate::error::AppError;
use crate::filter::{self, Predicate};
use crate::model::{EntityDescriptor, FieldVisibility};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Structured form of one list request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySpec {
    pub predicate: Option<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub offset: u64,
    /// `None` returns every remaining record.
    pub limit: Option<u64>,
}

/// Limits applied when the request does not carry its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListLimits {
    pub default_limit: Option<u64>,
    pub max_limit: Option<u64>,
}

fn order_term() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([A-Za-z_][A-Za-z0-9_]*)(?:\s+(asc|desc))?$").expect("valid order-by pattern")
    })
}

/// Resolves raw query pairs into a [`QuerySpec`]. Unrecognized keys are ignored;
/// a repeated key keeps its last value; empty `filter` / `orderby` count as absent.
pub fn resolve_query(
    params: &[(String, String)],
    entity: &EntityDescriptor,
    visibility: &FieldVisibility,
    limits: ListLimits,
) -> Result<QuerySpec, AppError> {
    let mut filter_src: Option<&str> = None;
    let mut order_src: Option<&str> = None;
    let mut offset_src: Option<&str> = None;
    let mut limit_src: Option<&str> = None;
    for (k, v) in params {
        match k.as_str() {
            "filter" => filter_src = Some(v.as_str()),
            "orderby" => order_src = Some(v.as_str()),
            "offset" => offset_src = Some(v.as_str()),
            "limit" => limit_src = Some(v.as_str()),
            _ => {}
        }
    }

    let predicate = match filter_src.map(str::trim).filter(|s| !s.is_empty()) {
        Some(src) => Some(filter::parse(src, entity, visibility)?),
        None => None,
    };
    let order_by = match order_src.map(str::trim).filter(|s| !s.is_empty()) {
        Some(src) => parse_order_by(src, visibility)?,
        None => Vec::new(),
    };
    let offset = offset_src.map(|s| parse_count("offset", s)).transpose()?.unwrap_or(0);
    let mut limit = limit_src
        .map(|s| parse_count("limit", s))
        .transpose()?
        .or(limits.default_limit);
    if let Some(max) = limits.max_limit {
        limit = Some(limit.map_or(max, |l| l.min(max)));
    }

    Ok(QuerySpec {
        predicate,
        order_by,
        offset,
        limit,
    })
}

/// `field[ asc|desc]` terms separated by commas; direction defaults to `asc`.
pub fn parse_order_by(src: &str, visibility: &FieldVisibility) -> Result<Vec<OrderBy>, AppError> {
    let mut out = Vec::new();
    for raw in src.split(',') {
        let term = raw.trim();
        let caps = order_term()
            .captures(term)
            .ok_or_else(|| AppError::BadRequest(format!("malformed orderby term '{}'", term)))?;
        let field = caps[1].to_string();
        if !visibility.is_readable(&field) {
            return Err(AppError::BadRequest(format!("unknown orderby column '{}'", field)));
        }
        let direction = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(d) if d == "desc" => Direction::Desc,
            _ => Direction::Asc,
        };
        out.push(OrderBy { field, direction });
    }
    Ok(out)
}

fn parse_count(name: &str, s: &str) -> Result<u64, AppError> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer, got '{}'", name, s)))
}
