//! Request handling for the browser front end, kept apart from the socket
//! library so it can be driven directly in tests.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::ServerConfig;
use crate::engine::{ExecStatus, Shell};

/// Stand-in for an empty command result in the JSON reply.
pub const EMPTY_OUTPUT: &str = "Command executed successfully";

pub const EXECUTE_PATH: &str = "/execute";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Set when the command was `exit`; the server stops after replying.
    pub shutdown: bool,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
            shutdown: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExecuteResponse<'a> {
    output: &'a str,
}

pub fn handle(shell: &mut Shell, config: &ServerConfig, method: &str, url: &str, body: &str) -> Reply {
    let path = url.split_once('?').map_or(url, |(path, _)| path);

    match method {
        "GET" => serve_static(&config.static_root, path),
        "POST" if path == EXECUTE_PATH => execute(shell, config, body),
        _ => Reply::text(405, "Invalid request"),
    }
}

fn execute(shell: &mut Shell, config: &ServerConfig, body: &str) -> Reply {
    let Some(command) = form_field(body, "command") else {
        return Reply::text(400, "Missing command");
    };
    if command.len() > config.max_command_len {
        tracing::warn!(len = command.len(), "rejected oversized command");
        return Reply::text(400, "Command too long");
    }

    tracing::info!(command = %command, "executing");
    let result = shell.run(&command);
    let output = if result.text.is_empty() {
        EMPTY_OUTPUT
    } else {
        result.text.as_str()
    };

    match serde_json::to_vec(&ExecuteResponse { output }) {
        Ok(body) => Reply {
            status: 200,
            content_type: "application/json",
            body,
            shutdown: result.status == ExecStatus::Exit,
        },
        Err(err) => {
            tracing::warn!("failed to encode response: {err}");
            Reply::text(500, "Internal error")
        }
    }
}

fn serve_static(root: &Path, path: &str) -> Reply {
    let (file, content_type) = match path {
        "/" | "/index.html" => ("index.html", "text/html"),
        "/style.css" => ("style.css", "text/css"),
        "/script.js" => ("script.js", "application/javascript"),
        _ => return Reply::text(404, "Not found"),
    };

    match fs::read(root.join(file)) {
        Ok(body) => Reply {
            status: 200,
            content_type,
            body,
            shutdown: false,
        },
        Err(err) => {
            tracing::warn!(file, "static file unavailable: {err}");
            Reply::text(404, "File not found")
        }
    }
}

/// Decodes one field of an `application/x-www-form-urlencoded` body.
pub fn form_field(body: &str, key: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_component(name) == key).then(|| decode_component(value))
    })
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned(),
    }
}
