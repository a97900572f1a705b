//! Minimal portico example: one JSON endpoint behind the standard pipeline.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!
//! The POST succeeds from loopback. Set `PORTICO_ALLOWED_ADDRESSES=` (empty)
//! and it gets an empty 401 instead; the GET keeps working.

use http::{HeaderValue, Method, StatusCode, header};
use portico::{BoxFuture, Config, Context, Error, Handler, Pipeline, Server};
use tokio::io::AsyncReadExt;

/// Stand-in for the application's own routing.
struct Users;

impl Handler for Users {
    fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            match cx.request.method {
                Method::GET => {
                    let id = cx.request.path.rsplit('/').next().unwrap_or("unknown").to_owned();
                    json(cx, StatusCode::OK, format!(r#"{{"id":"{id}","name":"alice"}}"#)).await
                }
                Method::POST => {
                    let mut body = Vec::new();
                    cx.request.body.read_to_end(&mut body).await?;
                    if body.is_empty() {
                        cx.response.status = StatusCode::BAD_REQUEST;
                        return Ok(());
                    }
                    json(cx, StatusCode::CREATED, r#"{"id":"99","name":"new_user"}"#.to_owned()).await
                }
                _ => {
                    cx.response.status = StatusCode::METHOD_NOT_ALLOWED;
                    Ok(())
                }
            }
        })
    }
}

async fn json(cx: &mut Context, status: StatusCode, body: String) -> Result<(), Error> {
    cx.response.status = status;
    cx.response.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    cx.response.write(body).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    Server::bind(config.bind)
        .serve(Pipeline::standard(config.policy(), Users))
        .await
}
