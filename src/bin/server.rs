//! Browser front end for the shell.
//!
//! One request at a time on one thread, all sharing a single `Shell`.

use std::env;
use std::io::Read;
use std::process::ExitCode;

use tiny_http::{Header, Response, Server};
use webshell::http::{self, Reply};
use webshell::{ServerConfig, Shell, ShellConfig, ShellError, logging};

fn main() -> ExitCode {
    logging::init("info");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ShellError> {
    let server_config = ServerConfig::from_env_and_args(env::args())?;
    let mut shell = Shell::new(ShellConfig::from_env()?)?;

    let server = Server::http(&server_config.addr).map_err(|e| ShellError::Bind {
        addr: server_config.addr.clone(),
        reason: e.to_string(),
    })?;

    println!("Web Shell Server running on http://{}", server_config.addr);
    tracing::info!(
        addr = %server_config.addr,
        static_root = %server_config.static_root.display(),
        "server started"
    );

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(err) = request.as_reader().read_to_string(&mut body) {
            tracing::warn!("could not read request body: {err}");
            let _ = request.respond(to_response(Reply {
                status: 400,
                content_type: "text/plain",
                body: b"Bad request".to_vec(),
                shutdown: false,
            }));
            continue;
        }

        let method = request.method().as_str().to_string();
        let url = request.url().to_string();
        let reply = http::handle(&mut shell, &server_config, &method, &url, &body);
        tracing::info!(%method, %url, status = reply.status, "request");

        let shutdown = reply.shutdown;
        if let Err(err) = request.respond(to_response(reply)) {
            tracing::warn!("failed to send response: {err}");
        }
        if shutdown {
            tracing::info!("exit requested; shutting down");
            break;
        }
    }

    Ok(())
}

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    for (name, value) in [
        ("Content-Type", reply.content_type),
        ("Access-Control-Allow-Origin", "*"),
    ] {
        if let Ok(header) = Header::from_bytes(name, value) {
            response.add_header(header);
        }
    }
    response
}
