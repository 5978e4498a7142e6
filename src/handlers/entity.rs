//! Entity CRUD handlers: the base handler of every endpoint chain, and the
//! axum entry point that decodes a request for it.

use crate::decorator::{BoxFuture, EndpointRequest, Handler, HandlerResult};
use crate::error::AppError;
use crate::error_map::ErrorMapper;
use crate::model::{coerce_str, EntityDescriptor, FieldType, FieldVisibility, KeyTuple, Record};
use crate::query::resolve_query;
use crate::response::Reply;
use crate::routes::{RegisteredEndpoint, Verb};
use crate::serialize::Serializer;
use crate::service::CrudService;
use crate::state::EngineContext;
use axum::{
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form,
};
use serde_json::Value;
use std::sync::Arc;

/// Runs one verb against the store, renders the result, and applies the
/// endpoint's error mapper to any failure.
pub struct CrudHandler {
    verb: Verb,
    entity: Arc<EntityDescriptor>,
    visibility: Arc<FieldVisibility>,
    serializer: Serializer,
    error_mapper: ErrorMapper,
    ctx: EngineContext,
}

impl CrudHandler {
    pub fn new(
        verb: Verb,
        entity: Arc<EntityDescriptor>,
        visibility: Arc<FieldVisibility>,
        serializer: Serializer,
        error_mapper: ErrorMapper,
        ctx: EngineContext,
    ) -> Self {
        CrudHandler {
            verb,
            entity,
            visibility,
            serializer,
            error_mapper,
            ctx,
        }
    }

    async fn run(&self, mut req: EndpointRequest) -> Result<Reply, AppError> {
        if let Some(err) = req.rejection.take() {
            return Err(err);
        }
        let store = self.ctx.store.as_ref();
        let entity = self.entity.as_ref();
        let visibility = self.visibility.as_ref();
        let render = |r: &Record| self.serializer.render(r, visibility);
        match self.verb {
            Verb::List => {
                let spec = resolve_query(&req.query, entity, visibility, self.ctx.config.limits())?;
                let rows = CrudService::list(store, entity, &spec).await?;
                Ok(Reply::ok(self.serializer.render_many(&rows, visibility)))
            }
            Verb::Get => {
                let key = KeyTuple::from_path(entity, &req.path_params)?;
                Ok(Reply::ok(render(&CrudService::get(store, entity, &key).await?)))
            }
            Verb::Create => {
                let row = CrudService::create(store, entity, visibility, req.payload).await?;
                Ok(Reply::created(render(&row)))
            }
            Verb::Replace => {
                let key = KeyTuple::from_path(entity, &req.path_params)?;
                let row = CrudService::replace(store, entity, visibility, &key, req.payload).await?;
                Ok(Reply::ok(render(&row)))
            }
            Verb::Patch => {
                let key = KeyTuple::from_path(entity, &req.path_params)?;
                let row = CrudService::patch(store, entity, visibility, &key, req.payload).await?;
                Ok(Reply::ok(render(&row)))
            }
            Verb::Delete => {
                let key = KeyTuple::from_path(entity, &req.path_params)?;
                CrudService::delete(store, entity, &key).await?;
                Ok(Reply::no_content())
            }
        }
    }
}

impl Handler for CrudHandler {
    fn call<'a>(&'a self, req: EndpointRequest) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            tracing::debug!(entity = %self.entity.name(), verb = %self.verb, "dispatch");
            match self.run(req).await {
                Ok(reply) => Ok(reply),
                Err(err) => self.error_mapper.apply(err),
            }
        })
    }
}

/// Decodes path variables, query string and body, runs the endpoint chain and
/// renders whatever outcome is left with the default mapping. A decode failure
/// travels down the chain in [`EndpointRequest::rejection`].
pub async fn dispatch(
    endpoint: Arc<RegisteredEndpoint>,
    path_params: Result<Vec<(String, String)>, AppError>,
    request: Request,
) -> Response {
    let req = decode(&endpoint, path_params, request).await;
    match endpoint.call(req).await {
        Ok(reply) => reply.into_response(),
        Err(err) => reject(&endpoint, err),
    }
}

fn reject(endpoint: &RegisteredEndpoint, err: AppError) -> Response {
    tracing::warn!(
        entity = %endpoint.entity.name(),
        verb = %endpoint.verb,
        code = err.code(),
        error = %err,
        "request failed"
    );
    err.into_response()
}

async fn decode(
    endpoint: &RegisteredEndpoint,
    path_params: Result<Vec<(String, String)>, AppError>,
    request: Request,
) -> EndpointRequest {
    let mut req = EndpointRequest::new(endpoint.verb);
    req.headers = request.headers().clone();
    match path_params {
        Ok(params) => req.path_params = params,
        Err(err) => req.rejection = Some(err),
    }
    match Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        Ok(Query(pairs)) => req.query = pairs,
        Err(e) => {
            req.rejection.get_or_insert(AppError::BadRequest(e.body_text()));
        }
    }
    if req.rejection.is_none() && endpoint.verb.has_body() {
        match decode_body(&endpoint.entity, &req.headers, request).await {
            Ok(payload) => req.payload = payload,
            Err(err) => req.rejection = Some(err),
        }
    }
    req
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// JSON object or urlencoded form. An empty body is an empty payload.
async fn decode_body(entity: &EntityDescriptor, headers: &HeaderMap, request: Request) -> Result<Record, AppError> {
    if is_form(headers) {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(form_to_record(entity, pairs));
    }
    let bytes = Bytes::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::new());
    }
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
    }
}

/// Form values are strings; coerce them to each field's declared type.
/// An empty value for a non-string field is null; an uncoercible value stays
/// a string so validation reports it.
fn form_to_record(entity: &EntityDescriptor, pairs: Vec<(String, String)>) -> Record {
    let mut record = Record::new();
    for (k, v) in pairs {
        let value = match entity.field(&k) {
            Some(f) if f.field_type != FieldType::String && v.is_empty() => Value::Null,
            Some(f) => coerce_str(f.field_type, &v).unwrap_or(Value::String(v)),
            None => Value::String(v),
        };
        record.insert(k, value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDescriptor;
    use serde_json::json;

    #[test]
    fn form_values_are_coerced() {
        let e = EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(FieldDescriptor::new("title", FieldType::String))
            .field(FieldDescriptor::new("done", FieldType::Boolean))
            .field(FieldDescriptor::new("score", FieldType::Float))
            .primary_key(["id"])
            .build()
            .unwrap();
        let pairs = vec![
            ("title".to_string(), "12".to_string()),
            ("done".to_string(), "true".to_string()),
            ("score".to_string(), "".to_string()),
            ("id".to_string(), "x".to_string()),
        ];
        let rec = form_to_record(&e, pairs);
        assert_eq!(Value::Object(rec), json!({"title": "12", "done": true, "score": null, "id": "x"}));
    }
}
