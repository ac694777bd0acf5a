use actix_cors::Cors;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
    time::Instant,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Request id assigned by [`RequestTracing`], readable from request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Any origin, method and header; answers `Access-Control-Allow-Origin: *`.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// Tags each request with an id, times it, and emits one log line per
/// response. Both values are echoed back as response headers.
pub struct RequestTracing;

impl<S, B> Transform<S, ServiceRequest> for RequestTracing
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTracingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTracingService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestTracingService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestTracingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let method = req.method().clone();
        let path = req.path().to_string();

        req.extensions_mut().insert(RequestId(request_id.clone()));

        let span = info_span!("http_request", %method, %path, request_id = %request_id);
        let fut = span.in_scope(|| service.call(req));

        Box::pin(
            async move {
                let mut res = fut.await?;
                let duration_ms = start.elapsed().as_millis();
                let status = res.status();

                let headers = res.headers_mut();
                headers.insert(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    HeaderValue::from_str(&request_id)
                        .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
                );
                headers.insert(
                    HeaderName::from_static(RESPONSE_TIME_HEADER),
                    HeaderValue::from_str(&format!("{}ms", duration_ms))
                        .unwrap_or_else(|_| HeaderValue::from_static("0ms")),
                );

                if status.is_server_error() {
                    warn!(status = %status, duration_ms, "Request processed with server error");
                } else {
                    info!(status = %status, duration_ms, "Request processed");
                }

                Ok(res)
            }
            .instrument(span),
        )
    }
}
