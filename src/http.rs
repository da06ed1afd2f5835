//! HTTP control API
//!
//! A single endpoint, `GET /api?command=…`, drives the [`TableController`];
//! `/` serves the control page. Successful commands answer `200` with the
//! JSON string `"success"`. Bad parameters and failed operations answer `500`
//! with one line of text (details go to the log); unknown commands and
//! methods other than GET answer `405`.
//!
//! | command         | parameters                                    |
//! |-----------------|-----------------------------------------------|
//! | `brightness`    | `value`                                       |
//! | `startcolormap` | `map`, `brightness`                           |
//! | `stopcolormap`  |                                               |
//! | `tablecolors`   | `left`, `right`, `top`, `bottom`, `brightness` |
//! | `active`        | `direction` (edge name or `start,end`)        |
//! | `nextactive`    |                                               |
//! | `activeoff`     |                                               |
//! | `reconnect`     |                                               |

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::TableColors;
use crate::controller::TableController;
use crate::types::{Color, Direction, Side};

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPTS_JS: &str = include_str!("../static/scripts.js");

/// Raw `/api` query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ApiQuery {
    pub command: Option<String>,
    pub value: Option<String>,
    pub map: Option<String>,
    pub brightness: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub direction: Option<String>,
}

/// A validated API command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    Brightness(u8),
    StartColormap { map: String, brightness: u8 },
    StopColormap,
    TableColors { colors: TableColors, brightness: u8 },
    Active(Direction),
    NextActive,
    ActiveOff,
    Reconnect,
}

/// Why a request could not be turned into an [`ApiCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Missing or malformed parameter; answered with `500`.
    Invalid(String),
    /// Unrecognized command; answered with `405`.
    UnknownCommand(String),
}

impl RequestError {
    fn status(&self) -> StatusCode {
        match self {
            RequestError::Invalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RequestError::UnknownCommand(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn message(&self) -> &str {
        match self {
            RequestError::Invalid(message) => message,
            RequestError::UnknownCommand(_) => "unknown command",
        }
    }
}

impl ApiCommand {
    pub fn from_query(query: &ApiQuery) -> Result<Self, RequestError> {
        let command = required(&query.command, "command")?;
        match command {
            "brightness" => Ok(ApiCommand::Brightness(brightness(&query.value, "value")?)),
            "startcolormap" => Ok(ApiCommand::StartColormap {
                map: required(&query.map, "colormap")?.to_string(),
                brightness: brightness(&query.brightness, "brightness")?,
            }),
            "stopcolormap" => Ok(ApiCommand::StopColormap),
            "tablecolors" => Ok(ApiCommand::TableColors {
                colors: TableColors {
                    right: color(&query.right, "right")?,
                    bottom: color(&query.bottom, "bottom")?,
                    left: color(&query.left, "left")?,
                    top: color(&query.top, "top")?,
                },
                brightness: brightness(&query.brightness, "brightness")?,
            }),
            "active" => Ok(ApiCommand::Active(direction(required(&query.direction, "direction")?)?)),
            "nextactive" => Ok(ApiCommand::NextActive),
            "activeoff" => Ok(ApiCommand::ActiveOff),
            "reconnect" => Ok(ApiCommand::Reconnect),
            other => Err(RequestError::UnknownCommand(other.to_string())),
        }
    }

    /// Run the command against the controller.
    pub async fn execute(self, controller: &TableController) -> crate::Result<()> {
        match self {
            ApiCommand::Brightness(value) => controller.set_brightness(value).await,
            ApiCommand::StartColormap { map, brightness } => {
                controller.start_colormap(&map, Some(brightness)).await
            }
            ApiCommand::StopColormap => {
                controller.stop().await;
                Ok(())
            }
            ApiCommand::TableColors { colors, brightness } => {
                controller.start_table_colors(colors, Some(brightness)).await
            }
            ApiCommand::Active(direction) => controller.set_active(direction).await,
            ApiCommand::NextActive => controller.next_active().await.map(|_| ()),
            ApiCommand::ActiveOff => controller.active_off().await,
            ApiCommand::Reconnect => controller.reconnect().await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ApiCommand::Brightness(_) => "brightness",
            ApiCommand::StartColormap { .. } => "startcolormap",
            ApiCommand::StopColormap => "stopcolormap",
            ApiCommand::TableColors { .. } => "tablecolors",
            ApiCommand::Active(_) => "active",
            ApiCommand::NextActive => "nextactive",
            ApiCommand::ActiveOff => "activeoff",
            ApiCommand::Reconnect => "reconnect",
        }
    }
}

fn required<'a>(param: &'a Option<String>, name: &str) -> Result<&'a str, RequestError> {
    param.as_deref().ok_or_else(|| RequestError::Invalid(format!("{name} not given")))
}

fn brightness(param: &Option<String>, name: &str) -> Result<u8, RequestError> {
    required(param, name)?
        .trim()
        .parse()
        .map_err(|_| RequestError::Invalid(format!("invalid {name} given")))
}

fn color(param: &Option<String>, name: &str) -> Result<Color, RequestError> {
    required(param, name)?.parse().map_err(|_| RequestError::Invalid(format!("invalid {name} given")))
}

/// An edge name (`right`) or an explicit `start,end` range.
fn direction(param: &str) -> Result<Direction, RequestError> {
    if let Ok(side) = param.parse::<Side>() {
        return Ok(side.direction());
    }
    let invalid = || RequestError::Invalid("invalid direction given".to_string());
    let (start, end) = param.split_once(',').ok_or_else(invalid)?;
    let start = start.trim().parse().map_err(|_| invalid())?;
    let end = end.trim().parse().map_err(|_| invalid())?;
    Ok(Direction::new(start, end))
}

/// Build the router serving the API and the control page.
pub fn router(controller: Arc<TableController>) -> Router {
    Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/scripts.js", get(scripts))
        .route("/api", get(api).fallback(method_not_allowed))
        .with_state(controller)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(controller: Arc<TableController>, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(controller)).with_graceful_shutdown(shutdown).await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn scripts() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/javascript")], SCRIPTS_JS)
}

async fn method_not_allowed() -> Response {
    warn!("Method not allowed");
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}

async fn api(
    State(controller): State<Arc<TableController>>,
    query: Result<Query<ApiQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!("Malformed query: {rejection}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "invalid query").into_response();
        }
    };
    info!(?query, "Incoming API request");

    let command = match ApiCommand::from_query(&query) {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected request: {e:?}");
            return (e.status(), e.message().to_string()).into_response();
        }
    };

    let name = command.name();
    match command.execute(&controller).await {
        Ok(()) => success(),
        Err(e) => {
            warn!(command = name, "Command failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{name} failed")).into_response()
        }
    }
}

fn success() -> Response {
    ([(ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Json("success")).into_response()
}
