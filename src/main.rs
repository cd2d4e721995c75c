use crabstack::{
    logger::{self, micro::*},
    Config, Error, Method, Router, Server,
};

fn main() {
    let config = Config::from_env();
    if let Err(e) = logger::init_stdout_logger(config.log_buffer, config.log_level) {
        eprintln!("failed to install logger: {}", e);
    }

    info!("# of CPU: {}, lines: {}", num_cpus::get(), config.max_lines);
    let mut s = match Server::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to bind port {}: {}", config.port, e);
            std::process::exit(1);
        }
    };
    set_up_server_handlers(s.router());

    if let Err(e) = s.start() {
        error!("server stopped: {}", e);
        std::process::exit(1);
    }
}

fn set_up_server_handlers(root: &mut Router) {
    root.use_fn("/", |req, _, next| {
        debug!("{} {} reached the root stack", req.method(), req.path());
        next.proceed();
    });
    root.get_fn("/hello", |_, res, _| {
        res.respond(b"Hello");
    });

    let mut api = Router::new();
    api.use_fn("/admin", |req, _, next| {
        if req.param("token") == Some("letmein") {
            next.proceed();
        } else {
            next.fail(Error::msg("admin token missing"));
        }
    });
    api.get_fn("/admin/stats", |_, res, _| {
        res.respond(b"all good");
    });
    api.route("/users/:id")
        .get_fn(|req, res, _| {
            let body = format!("user {}", req.param("id").unwrap_or("?"));
            res.respond(body.as_bytes());
        })
        .register_fn(Method::PATCH, |req, res, _| {
            let body = format!("patched user {} with {} bytes", req.param("id").unwrap_or("?"), req.body().len());
            res.respond(body.as_bytes());
        });
    root.use_router("/api", api);
}
