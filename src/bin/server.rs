use std::{
    env,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use spendlog::{
    AppConfig, AppState, IdentityConfig, SQLiteExpenseStore, ViewConfig, build_router,
    graceful_shutdown, initialize_db,
};

/// The web server for spendlog.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "SPENDLOG_DB_PATH")]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, env = "SPENDLOG_PORT", default_value_t = 3000)]
    port: u16,

    /// The address to listen on.
    #[arg(short, long, env = "SPENDLOG_ADDRESS", default_value = "127.0.0.1")]
    address: IpAddr,

    /// The label appended to amounts, e.g. "€" or "NZD".
    #[arg(long, env = "SPENDLOG_CURRENCY_LABEL", default_value = "€")]
    currency_label: String,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, env = "SPENDLOG_TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The request header the identity provider puts the signed in user's ID in.
    #[arg(long, env = "SPENDLOG_IDENTITY_HEADER", default_value = "X-Forwarded-User")]
    identity_header: String,

    /// The request header the identity provider puts the signed in user's email in.
    #[arg(long, env = "SPENDLOG_EMAIL_HEADER", default_value = "X-Forwarded-Email")]
    email_header: String,

    /// Where to send users that are not signed in.
    #[arg(long, env = "SPENDLOG_SIGN_IN_URL", default_value = "/oauth2/sign_in")]
    sign_in_url: String,

    /// Where to send users after they log out.
    #[arg(long, env = "SPENDLOG_SIGN_OUT_URL", default_value = "/oauth2/sign_out")]
    sign_out_url: String,
}

impl Args {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            local_timezone: self.timezone.clone(),
            view: ViewConfig {
                currency_label: self.currency_label.clone(),
            },
            identity: IdentityConfig {
                user_header: self.identity_header.clone(),
                email_header: self.email_header.clone(),
                sign_in_url: self.sign_in_url.clone(),
                sign_out_url: self.sign_out_url.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from((args.address, args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    let connection = Connection::open(&args.db_path).unwrap_or_else(|error| {
        panic!("Could not open database file at {}: {error}", args.db_path)
    });
    initialize_db(&connection).expect("Could not initialize database.");

    let expense_store = SQLiteExpenseStore::new(Arc::new(Mutex::new(connection)));
    let app_state = AppState::new(Arc::new(expense_store), &secret, args.app_config())
        .unwrap_or_else(|error| panic!("Invalid configuration: {error}"));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(app_state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are handled.
        .on_failure(());

    router.layer(tracing_layer)
}
