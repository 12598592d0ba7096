//! Request dispatch.
//!
//! One call walks a request through the dispatch states:
//!
//! ```text
//! route → resolve action → negotiate format → invoke → normalize
//! ```
//!
//! Every failure on the way is an [`HttpError`]. With interception on it is
//! rendered through the scope's exception handler (or the `error` view);
//! with it off it leaves the stack as [`DispatchError`].

use http::header::ACCEPT;
use shortstack_core::negotiate::negotiate;
use shortstack_core::{
    Abort, ActionResult, DispatchError, HttpError, HttpResult, Reply, Request, Response,
};
use shortstack_telemetry::logging::fields;
use shortstack_telemetry::{record_dispatch, DispatchOutcome};

use crate::controller::Controller;
use crate::stack::StackInner;

type Dispatched = (Result<Response, DispatchError>, DispatchOutcome);

/// Routes `request` and dispatches it.
pub(crate) fn dispatch(
    stack: &StackInner,
    mut request: Request,
) -> Result<Response, DispatchError> {
    tracing::info!(
        { fields::HTTP_METHOD } = %request.method(),
        { fields::HTTP_PATH } = request.path(),
        "request received"
    );
    tracing::debug!(params = ?request.params(), "request params");

    let matched = stack
        .router
        .match_route(request.method(), request.path())
        .map(|m| (m.target.clone(), m.params, m.format));
    let Some((target, captures, hint)) = matched else {
        let error = HttpError::not_found(format!(
            "no route for {} {}",
            request.method(),
            request.path()
        ));
        return finish(fail_early(stack, 0, request, error));
    };

    for (name, value) in captures {
        request.params_mut().insert(name, value);
    }
    finish(run_action(stack, target.scope, &target.action, request, hint))
}

/// Dispatches to a root action, skipping the route table.
pub(crate) fn dispatch_action(
    stack: &StackInner,
    action: &str,
    request: Request,
) -> Result<Response, DispatchError> {
    finish(run_action(stack, 0, action, request, None))
}

fn finish((result, outcome): Dispatched) -> Result<Response, DispatchError> {
    record_dispatch(outcome);
    if let Ok(response) = &result {
        tracing::debug!(
            { fields::HTTP_STATUS_CODE } = response.status().as_u16(),
            outcome = %outcome,
            "dispatch finished"
        );
    }
    result
}

fn run_action(
    stack: &StackInner,
    scope_index: usize,
    action_id: &str,
    request: Request,
    hint: Option<String>,
) -> Dispatched {
    let scope = stack.scope(scope_index);
    let Some(action) = scope.registry.dispatchable(action_id) else {
        let error = HttpError::not_found(format!("action `{action_id}` is not published"));
        return fail_early(stack, scope_index, request, error);
    };

    let declared = stack.declared_formats(scope, action);
    let explicit = hint.or_else(|| request.params().get("format").map(str::to_string));
    let accept = request.header_list(ACCEPT.as_str());
    let negotiated = negotiate(&stack.mime, &declared, accept.as_deref(), explicit.as_deref());
    let format = match negotiated {
        Ok(format) => format,
        Err(error) => return fail_early(stack, scope_index, request, error),
    };

    tracing::debug!(
        { fields::ACTION } = action_id,
        { fields::FORMAT } = %format,
        "action chosen"
    );

    let mut controller = Controller::new(stack, scope, request, action_id.to_string(), format);
    controller.prepare();
    let result = (action.handler())(&mut controller);
    conclude(stack, controller, result)
}

/// Fails before an action runs, rendering in the default format.
fn fail_early(
    stack: &StackInner,
    scope_index: usize,
    request: Request,
    error: HttpError,
) -> Dispatched {
    let scope = stack.scope(scope_index);
    let mut controller = Controller::new(
        stack,
        scope,
        request,
        String::new(),
        stack.default_format.clone(),
    );
    controller.prepare();
    handle_http(stack, controller, error)
}

fn conclude(stack: &StackInner, mut controller: Controller<'_>, result: ActionResult) -> Dispatched {
    match result {
        Ok(reply) => match complete(&mut controller, reply) {
            Ok(response) => (Ok(response), DispatchOutcome::Completed),
            Err(error) => handle_http(stack, controller, error),
        },
        Err(Abort::Halt(body)) => {
            tracing::debug!(
                { fields::ACTION } = controller.action(),
                status = controller.status().as_u16(),
                "halted"
            );
            let response = controller
                .response()
                .write(body.unwrap_or_default())
                .finish();
            (Ok(response), DispatchOutcome::Halted)
        }
        Err(Abort::Raise(cause)) => match cause.downcast::<HttpError>() {
            Ok(error) => handle_http(stack, controller, error),
            Err(cause) if stack.config.handle_errors => {
                let detail = format!("{cause:#}");
                tracing::error!(
                    { fields::ACTION } = controller.action(),
                    error = %detail,
                    "action failed"
                );
                handle_http(stack, controller, HttpError::wrap(cause))
            }
            Err(cause) => (Err(DispatchError::Unhandled(cause)), DispatchOutcome::Propagated),
        },
    }
}

/// Turns a handler's reply into a response.
///
/// Raw responses pass through, builders are finished, page text goes
/// through the layout, and anything else becomes the body as is, with the
/// controller's status and headers.
fn complete(controller: &mut Controller<'_>, reply: Reply) -> HttpResult<Response> {
    match reply {
        Reply::Raw(response) => Ok(response),
        Reply::Built(builder) => Ok(builder.finish()),
        Reply::Text(content) => {
            let body = controller.wrap(content)?;
            Ok(controller.response().write(body).finish())
        }
        Reply::Value(value) => Ok(controller.response().write(value).finish()),
        Reply::Nothing => Ok(controller.response().finish()),
    }
}

fn handle_http(stack: &StackInner, mut controller: Controller<'_>, error: HttpError) -> Dispatched {
    if stack.config.log_http_errors {
        log_http_error(&error);
    }
    if !stack.config.handle_errors {
        return (Err(DispatchError::Http(error)), DispatchOutcome::Propagated);
    }

    controller.set_status(error.status());
    let reply = match controller.scope().exception_handler.clone() {
        Some(handler) => handler(&mut controller, &error),
        None => default_reply(&controller, &error),
    };

    let response = match complete(&mut controller, reply) {
        Ok(response) => response,
        Err(render_error) => {
            tracing::error!(
                error = %render_error,
                { fields::HTTP_STATUS_CODE } = error.code(),
                "error page failed to render"
            );
            Response::text(error.status(), fallback_body(&error))
        }
    };
    (Ok(response), DispatchOutcome::Failed)
}

fn default_reply(controller: &Controller<'_>, error: &HttpError) -> Reply {
    match controller.render_error(error) {
        Ok(page) => Reply::Text(page),
        Err(render_error) => {
            tracing::warn!(error = %render_error, "error view failed to render");
            Reply::Value(fallback_body(error))
        }
    }
}

fn fallback_body(error: &HttpError) -> String {
    format!("{} {}", error.code(), error.name())
}

fn log_http_error(error: &HttpError) {
    if error.status().is_server_error() {
        tracing::error!(
            { fields::HTTP_STATUS_CODE } = error.code(),
            message = error.message(),
            "http error"
        );
    } else {
        tracing::warn!(
            { fields::HTTP_STATUS_CODE } = error.code(),
            message = error.message(),
            "http error"
        );
    }
    if let Some(backtrace) = error.backtrace() {
        tracing::debug!(%backtrace, "http error backtrace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use shortstack_config::DispatchConfig;
    use shortstack_core::{Format, ResponseBuilder};

    use crate::StackBuilder;

    fn body(response: Response) -> String {
        String::from_utf8(response.into_parts().2.into_bytes().to_vec()).unwrap()
    }

    fn get(path: &str) -> Request {
        Request::new(Method::GET, path)
    }

    #[test]
    fn test_raw_response_passes_through() {
        let stack = StackBuilder::new()
            .get("/", |c| {
                c.set_status(StatusCode::CREATED);
                Ok(Reply::Raw(Response::text(StatusCode::ACCEPTED, "raw")))
            })
            .build()
            .unwrap();

        let response = stack.call(get("/")).unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(body(response), "raw");
    }

    #[test]
    fn test_built_response_is_finished() {
        let stack = StackBuilder::new()
            .get("/", |_c| {
                Ok(ResponseBuilder::new().status(StatusCode::NO_CONTENT).write("dropped").into())
            })
            .build()
            .unwrap();

        let response = stack.call(get("/")).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_nothing_keeps_status_and_headers() {
        let stack = StackBuilder::new()
            .get("/", |c| {
                c.set_status(StatusCode::ACCEPTED);
                c.headers_mut().insert("x-kept", "yes".parse()?);
                Ok(Reply::Nothing)
            })
            .build()
            .unwrap();

        let response = stack.call(get("/")).unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-kept"], "yes");
        assert_eq!(body(response), "");
    }

    #[test]
    fn test_content_type_follows_format() {
        let stack = StackBuilder::new()
            .provides(vec![Format::JSON])
            .get("/", |_c| Ok(Reply::value(1)))
            .build()
            .unwrap();

        let response = stack.call(get("/")).unwrap();
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["content-length"], "1");
    }

    #[test]
    fn test_format_param_is_explicit() {
        let stack = StackBuilder::new()
            .provides(vec![Format::HTML, Format::JSON])
            .get("/", |c| Ok(Reply::from(c.format().to_string())))
            .build()
            .unwrap();

        let response = stack.call(get("/?format=json")).unwrap();
        assert_eq!(body(response), "json");

        let response = stack.call(get("/?format=csv")).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_captures_win_over_query() {
        let stack = StackBuilder::new()
            .get("/posts/:id", |c| Ok(Reply::from(c.param("id").unwrap_or("").to_string())))
            .build()
            .unwrap();

        let response = stack.call(get("/posts/9?id=1")).unwrap();
        assert_eq!(body(response), "9");
    }

    #[test]
    fn test_untyped_error_propagates_without_interception() {
        let stack = StackBuilder::new()
            .dispatch_config(DispatchConfig {
                handle_errors: false,
                ..DispatchConfig::default()
            })
            .get("/", |_c| Err(Abort::raise(anyhow::anyhow!("boom"))))
            .build()
            .unwrap();

        let err = stack.call(get("/")).unwrap_err();
        assert!(matches!(err, DispatchError::Unhandled(ref cause) if cause.to_string() == "boom"));
    }

    #[test]
    fn test_untyped_error_becomes_server_error() {
        let stack = StackBuilder::new()
            .provides(vec![Format::TEXT])
            .get("/", |_c| Err(Abort::raise(anyhow::anyhow!("secret detail"))))
            .build()
            .unwrap();

        let response = stack.call(get("/")).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body(response);
        assert!(text.starts_with("500 Internal Server Error"));
        assert!(!text.contains("secret detail"));
    }

    #[test]
    fn test_handler_status_is_preset() {
        let stack = StackBuilder::new()
            .handle_exception(|c, _err| Reply::value(c.status().as_u16()))
            .build()
            .unwrap();

        let response = stack.call(get("/missing")).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(response), "404");
    }
}
