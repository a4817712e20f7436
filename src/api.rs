//! HTTP routes.
//!
//! Every handler answers with JSON and never rejects: failures become a status
//! code with an `{"error": ...}` body. Rejections from warp itself (wrong
//! method, unreadable body) are turned into the same shape by [`recover`].

use std::{convert::Infallible, fmt::Display, net::SocketAddr, sync::Arc};

use log::{error, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::{Clock, Store};
use warp::{
    http::StatusCode,
    reply::{Reply, Response},
    Filter, Rejection,
};

use crate::{
    config::Config,
    cooldown::{CooldownGate, Mark},
    essence::EssencePool,
    leaderboard::Leaderboard,
    models::Fish,
    nft::{HeliusClient, NftSearch},
    rate_limit::RateLimiter,
    wallet::Wallet,
};

const BODY_LIMIT: u64 = 16 * 1024;
const LEADERBOARD_SIZE: usize = 10;

/// Everything the handlers share. Cheap to clone, all state lives in the store.
#[derive(Clone)]
pub struct Services {
    pub nft: HeliusClient,
    pub rate_limit: RateLimiter,
    pub cooldown: CooldownGate,
    pub leaderboard: Leaderboard,
    pub essence: EssencePool,
}

impl Services {
    pub fn new(config: &Config, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            nft: HeliusClient::new(&config.helius),
            rate_limit: RateLimiter::new(store.clone(), config.rate_limit.clone()),
            cooldown: CooldownGate::new(store.clone(), clock.clone(), config.cooldown.clone()),
            leaderboard: Leaderboard::new(store.clone()),
            essence: EssencePool::new(store, clock, config.essence.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WalletBody {
    wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NftSearchBody {
    wallet: Option<String>,
    collection: Option<String>,
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CatchBody {
    wallet: Option<String>,
    fish: Fish,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn reply<T: Serialize>(status: StatusCode, body: &T) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

fn error_reply(status: StatusCode, message: impl Display) -> Response {
    reply(
        status,
        &ErrorBody {
            error: message.to_string(),
        },
    )
}

/// Picks the address a request came from, trusting proxy headers first.
pub fn client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    remote: Option<SocketAddr>,
) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .or(real_ip)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn with_client_ip() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::optional::<String>("x-forwarded-for")
        .and(warp::header::optional::<String>("x-real-ip"))
        .and(warp::addr::remote())
        .map(
            |forwarded_for: Option<String>, real_ip: Option<String>, remote| {
                client_ip(forwarded_for.as_deref(), real_ip.as_deref(), remote)
            },
        )
}

fn with_services(
    services: Arc<Services>,
) -> impl Filter<Extract = (Arc<Services>,), Error = Infallible> + Clone {
    warp::any().map(move || services.clone())
}

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

async fn nft_search(
    services: Arc<Services>,
    ip: String,
    body: NftSearchBody,
) -> Result<Response, Infallible> {
    let wallet = match Wallet::from_field(body.wallet.as_deref()) {
        Ok(wallet) => wallet,
        Err(err) => return Ok(error_reply(StatusCode::BAD_REQUEST, err)),
    };

    match services.rate_limit.allow(&ip).await {
        Ok(true) => {}
        Ok(false) => return Ok(error_reply(StatusCode::TOO_MANY_REQUESTS, "Too many requests")),
        Err(err) => {
            error!("Could not check rate limit for {ip}: {err:?}");
            return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, err));
        }
    }

    let search = NftSearch {
        wallet,
        collection: body.collection.filter(|collection| !collection.is_empty()),
        page: body.page.unwrap_or(1),
    };

    Ok(match services.nft.search(&search).await {
        Ok(items) => reply(StatusCode::OK, &json!({ "items": items })),
        Err(err) => {
            error!("NFT search for {} failed: {err:?}", search.wallet);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, err)
        }
    })
}

async fn record_wallet(body: WalletBody) -> Result<Response, Infallible> {
    Ok(match Wallet::from_field(body.wallet.as_deref()) {
        Ok(wallet) => {
            info!("Wallet connected: {wallet}");
            reply(
                StatusCode::OK,
                &json!({ "success": true, "recorded": wallet }),
            )
        }
        Err(err) => error_reply(StatusCode::BAD_REQUEST, err),
    })
}

#[derive(Debug, Deserialize)]
struct CooldownQuery {
    wallet: Option<String>,
}

async fn get_cooldown(
    services: Arc<Services>,
    query: CooldownQuery,
) -> Result<Response, Infallible> {
    let wallet = match Wallet::from_field(query.wallet.as_deref()) {
        Ok(wallet) => wallet,
        Err(err) => return Ok(error_reply(StatusCode::BAD_REQUEST, err)),
    };

    Ok(match services.cooldown.can_play(&wallet).await {
        Ok(status) => reply(StatusCode::OK, &status),
        Err(err) => {
            error!("Could not check cooldown of {wallet}: {err:?}");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "canPlay": false, "error": err.to_string() }),
            )
        }
    })
}

async fn post_cooldown(services: Arc<Services>, body: WalletBody) -> Result<Response, Infallible> {
    let wallet = match Wallet::from_field(body.wallet.as_deref()) {
        Ok(wallet) => wallet,
        Err(err) => return Ok(error_reply(StatusCode::BAD_REQUEST, err)),
    };

    Ok(match services.cooldown.mark_played(&wallet).await {
        Ok(Mark::Recorded) => reply(StatusCode::OK, &json!({ "success": true })),
        Ok(Mark::Unlimited) => reply(
            StatusCode::OK,
            &json!({ "success": true, "unlimited": true }),
        ),
        Ok(Mark::AlreadyPlayed { reset_in_seconds }) => {
            warn!("{wallet} tried to cast twice");
            reply(
                StatusCode::TOO_MANY_REQUESTS,
                &json!({
                    "success": false,
                    "error": "Already played today",
                    "resetInSeconds": reset_in_seconds,
                }),
            )
        }
        Err(err) => {
            error!("Could not mark {wallet} as played: {err:?}");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "success": false, "error": err.to_string() }),
            )
        }
    })
}

async fn get_leaderboard(services: Arc<Services>) -> Result<Response, Infallible> {
    Ok(match services.leaderboard.top(LEADERBOARD_SIZE).await {
        Ok(entries) => reply(StatusCode::OK, &json!({ "leaderboard": entries })),
        Err(err) => {
            error!("Could not load leaderboard: {err:?}");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Could not load leaderboard")
        }
    })
}

async fn post_leaderboard(
    services: Arc<Services>,
    body: CatchBody,
) -> Result<Response, Infallible> {
    let wallet = match Wallet::from_field(body.wallet.as_deref()) {
        Ok(wallet) => wallet,
        Err(err) => return Ok(error_reply(StatusCode::BAD_REQUEST, err)),
    };

    Ok(match services.leaderboard.record(&wallet, &body.fish).await {
        Ok(score) => reply(StatusCode::OK, &json!({ "success": true, "score": score })),
        Err(err) => {
            error!("Could not record catch of {wallet}: {err:?}");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Could not record catch")
        }
    })
}

async fn primordial_essence(
    services: Arc<Services>,
    body: WalletBody,
) -> Result<Response, Infallible> {
    let wallet = match Wallet::from_field(body.wallet.as_deref()) {
        Ok(wallet) => wallet,
        Err(err) => return Ok(error_reply(StatusCode::BAD_REQUEST, err)),
    };

    let draw: f64 = rand::thread_rng().gen();

    Ok(match services.essence.roll(&wallet, draw).await {
        Ok(roll) => reply(StatusCode::OK, &roll),
        Err(err) => {
            error!("Could not roll essence for {wallet}: {err:?}");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Could not roll for essence")
        }
    })
}

/// Turns warp's own rejections into JSON errors.
pub async fn recover(rejection: Rejection) -> Result<Response, Infallible> {
    if rejection.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not found"));
    }

    // GET and POST share paths, so a bad POST body also carries the GET
    // route's wrong method rejection. Body errors win.
    if let Some(err) = rejection.find::<warp::body::BodyDeserializeError>() {
        warn!("Rejected request body: {err}");
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid JSON body"));
    }

    if rejection
        .find::<warp::reject::UnsupportedMediaType>()
        .is_some()
    {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid JSON body"));
    }

    if rejection.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(error_reply(
            StatusCode::LENGTH_REQUIRED,
            "Content-Length required",
        ));
    }

    if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
        ));
    }

    if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        ));
    }

    error!("Unhandled rejection: {rejection:?}");
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    ))
}

pub fn routes(
    services: Arc<Services>,
    allowed_origin: &str,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    // POST /nft-search
    let nft_search_route = warp::path!("nft-search")
        .and(warp::post())
        .and(with_services(services.clone()))
        .and(with_client_ip())
        .and(json_body::<NftSearchBody>())
        .and_then(nft_search);

    // POST /record-wallet
    let record_wallet_route = warp::path!("record-wallet")
        .and(warp::post())
        .and(json_body::<WalletBody>())
        .and_then(record_wallet);

    // GET /cooldown?wallet=...
    let get_cooldown_route = warp::path!("cooldown")
        .and(warp::get())
        .and(with_services(services.clone()))
        .and(warp::query::<CooldownQuery>())
        .and_then(get_cooldown);

    // POST /cooldown
    let post_cooldown_route = warp::path!("cooldown")
        .and(warp::post())
        .and(with_services(services.clone()))
        .and(json_body::<WalletBody>())
        .and_then(post_cooldown);

    // GET /leaderboard
    let get_leaderboard_route = warp::path!("leaderboard")
        .and(warp::get())
        .and(with_services(services.clone()))
        .and_then(get_leaderboard);

    // POST /leaderboard
    let post_leaderboard_route = warp::path!("leaderboard")
        .and(warp::post())
        .and(with_services(services.clone()))
        .and(json_body::<CatchBody>())
        .and_then(post_leaderboard);

    // POST /primordial-essence
    let primordial_essence_route = warp::path!("primordial-essence")
        .and(warp::post())
        .and(with_services(services))
        .and(json_body::<WalletBody>())
        .and_then(primordial_essence);

    let cors = warp::cors()
        .allow_origin(allowed_origin)
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_header("content-type");

    nft_search_route
        .or(record_wallet_route)
        .unify()
        .or(get_cooldown_route)
        .unify()
        .or(post_cooldown_route)
        .unify()
        .or(get_leaderboard_route)
        .unify()
        .or(post_leaderboard_route)
        .unify()
        .or(primordial_essence_route)
        .unify()
        .recover(recover)
        .unify()
        .with(cors)
        .with(warp::log("primordial_pit::api"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;
    use secrecy::SecretString;
    use store::{ManualClock, MemoryStore, SystemClock, UpstashStore};
    use test_case::test_case;

    use super::*;
    use crate::{
        config::{CooldownConfig, EssenceConfig, HeliusConfig, RateLimitConfig, DEFAULT_ORIGIN},
        generator::FishGenerator,
        nft::tests::{client, spawn_helius, WALLET},
    };

    const ADMIN: &str = "DRpbCBMxVnDK7maPM5tGv6MvB3v1sRMC86PZ8okm21hy";

    fn services(nft: HeliusClient) -> (Arc<ManualClock>, Arc<Services>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        (clock.clone(), services_on(nft, store, clock))
    }

    fn services_on(
        nft: HeliusClient,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Services> {
        let cooldown = CooldownConfig {
            unlimited: HashSet::from([Wallet::parse(ADMIN).unwrap()]),
            ..Default::default()
        };

        Arc::new(Services {
            nft,
            rate_limit: RateLimiter::new(store.clone(), RateLimitConfig::default()),
            cooldown: CooldownGate::new(store.clone(), clock.clone(), cooldown),
            leaderboard: Leaderboard::new(store.clone()),
            essence: EssencePool::new(store, clock, EssenceConfig::default()),
        })
    }

    /// A store backend that answers every command with 503.
    fn unavailable_store() -> Arc<dyn Store> {
        let route = warp::any().map(|| {
            warp::reply::with_status("maintenance", StatusCode::SERVICE_UNAVAILABLE)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        Arc::new(
            UpstashStore::new(
                &format!("http://{addr}/"),
                SecretString::new("token".to_string()),
            )
            .unwrap(),
        )
    }

    fn offline() -> (Arc<ManualClock>, Arc<Services>) {
        services(HeliusClient::new(&HeliusConfig::default()))
    }

    fn body<B: AsRef<[u8]>>(response: &warp::http::Response<B>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[test_case(Some("1.2.3.4, 10.0.0.1"), Some("5.6.7.8"), None, "1.2.3.4" ; "forwarded first")]
    #[test_case(None, Some("5.6.7.8"), None, "5.6.7.8" ; "real ip")]
    #[test_case(None, None, Some(([9, 9, 9, 9], 80).into()), "9.9.9.9" ; "socket")]
    #[test_case(Some(" "), None, None, "unknown" ; "blank header")]
    #[test_case(None, None, None, "unknown" ; "nothing")]
    fn picks_client_ip(
        forwarded: Option<&str>,
        real_ip: Option<&str>,
        remote: Option<SocketAddr>,
        expected: &str,
    ) {
        assert_eq!(client_ip(forwarded, real_ip, remote), expected);
    }

    #[tokio::test]
    async fn nft_search_returns_upstream_items() {
        let (_, services) = services(client(spawn_helius()));
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path("/nft-search")
            .json(&json!({ "wallet": WALLET, "collection": "midevils" }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let items = &body(&response)["items"];
        assert_eq!(items[0]["id"], "asset-1");
        assert_eq!(items[1]["echo"]["page"], 1);
    }

    #[tokio::test]
    async fn nft_search_reports_upstream_errors() {
        let (_, services) = services(client(spawn_helius()));
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path("/nft-search")
            .json(&json!({ "wallet": "22222222222222222222222222222222" }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), json!({ "error": "Invalid owner" }));
    }

    #[test_case(json!({}), "Wallet address required" ; "missing")]
    #[test_case(json!({ "wallet": "" }), "Wallet address required" ; "empty")]
    #[test_case(json!({ "wallet": "0xdeadbeef" }), "Invalid Solana wallet address" ; "not base58")]
    #[tokio::test]
    async fn nft_search_validates_wallet_first(request: Value, error: &str) {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path("/nft-search")
            .json(&request)
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response), json!({ "error": error }));
    }

    #[tokio::test]
    async fn nft_search_without_api_key() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path("/nft-search")
            .json(&json!({ "wallet": WALLET }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body(&response),
            json!({ "error": "API key not configured" })
        );
    }

    #[tokio::test]
    async fn nft_search_is_rate_limited_per_ip() {
        let (clock, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let search = |ip: &'static str| {
            warp::test::request()
                .method("POST")
                .path("/nft-search")
                .header("x-forwarded-for", ip)
                .json(&json!({ "wallet": WALLET }))
        };

        for _ in 0..10 {
            let response = search("1.2.3.4").reply(&api).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        let response = search("1.2.3.4").reply(&api).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body(&response), json!({ "error": "Too many requests" }));

        let response = search("4.3.2.1").reply(&api).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        clock.advance(Duration::seconds(60));
        let response = search("1.2.3.4").reply(&api).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test_case("GET", "/nft-search" ; "get nft search")]
    #[test_case("PUT", "/record-wallet" ; "put record wallet")]
    #[test_case("DELETE", "/cooldown" ; "delete cooldown")]
    #[test_case("GET", "/primordial-essence" ; "get essence")]
    #[tokio::test]
    async fn wrong_method(method: &str, path: &str) {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method(method)
            .path(path)
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body(&response),
            json!({ "error": "Method not allowed" })
        );
    }

    #[test_case("/record-wallet" ; "record wallet")]
    #[test_case("/cooldown" ; "cooldown shares its path with a get")]
    #[test_case("/leaderboard" ; "leaderboard shares its path with a get")]
    #[test_case("/primordial-essence" ; "essence")]
    #[tokio::test]
    async fn invalid_json_body(path: &str) {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path(path)
            .header("content-type", "application/json")
            .body("{ wallet: ")
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response), json!({ "error": "Invalid JSON body" }));
    }

    #[test_case("/cooldown" ; "cooldown")]
    #[test_case("/leaderboard" ; "leaderboard")]
    #[tokio::test]
    async fn non_json_body(path: &str) {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path(path)
            .header("content-type", "text/plain")
            .body(format!("wallet={WALLET}"))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response), json!({ "error": "Invalid JSON body" }));
    }

    #[tokio::test]
    async fn records_wallet() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path("/record-wallet")
            .json(&json!({ "wallet": format!("  {WALLET}  ") }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body(&response),
            json!({ "success": true, "recorded": WALLET })
        );
    }

    #[tokio::test]
    async fn cooldown_round_trip() {
        let (clock, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);
        let check = || {
            warp::test::request()
                .method("GET")
                .path(&format!("/cooldown?wallet={WALLET}"))
        };
        let mark = || {
            warp::test::request()
                .method("POST")
                .path("/cooldown")
                .json(&json!({ "wallet": WALLET }))
        };

        let response = check().reply(&api).await;
        assert_eq!(body(&response), json!({ "canPlay": true }));

        let response = mark().reply(&api).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), json!({ "success": true }));

        let response = mark().reply(&api).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body(&response)["resetInSeconds"], 86_400);

        clock.advance(Duration::hours(2));
        let response = check().reply(&api).await;
        assert_eq!(
            body(&response),
            json!({ "canPlay": false, "resetInSeconds": 79_200 })
        );

        clock.advance(Duration::hours(22));
        let response = check().reply(&api).await;
        assert_eq!(body(&response), json!({ "canPlay": true }));
    }

    #[tokio::test]
    async fn cooldown_fails_closed_when_the_store_is_down() {
        let services = services_on(
            HeliusClient::new(&HeliusConfig::default()),
            unavailable_store(),
            Arc::new(SystemClock),
        );
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/cooldown?wallet={WALLET}"))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body(&response),
            json!({ "canPlay": false, "error": "Could not reach cooldown store" })
        );

        let response = warp::test::request()
            .method("POST")
            .path("/cooldown")
            .json(&json!({ "wallet": WALLET }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response)["success"], false);
    }

    #[tokio::test]
    async fn cooldown_needs_a_wallet() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("GET")
            .path("/cooldown")
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unlimited_wallet_is_never_marked() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        for _ in 0..2 {
            let response = warp::test::request()
                .method("POST")
                .path("/cooldown")
                .json(&json!({ "wallet": ADMIN }))
                .reply(&api)
                .await;
            assert_eq!(
                body(&response),
                json!({ "success": true, "unlimited": true })
            );
        }
    }

    #[tokio::test]
    async fn leaderboard_records_catches() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);
        let fish = FishGenerator::default().generate(&mut rand::thread_rng(), Utc::now());
        let points = fish.rarity.points();

        let response = warp::test::request()
            .method("POST")
            .path("/leaderboard")
            .json(&json!({ "wallet": WALLET, "fish": fish }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response)["score"], points as f64);

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard")
            .reply(&api)
            .await;
        assert_eq!(
            body(&response),
            json!({ "leaderboard": [{ "wallet": WALLET, "score": points as f64, "catches": 1 }] })
        );
    }

    #[tokio::test]
    async fn essence_roll_reports_remaining() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("POST")
            .path("/primordial-essence")
            .json(&json!({ "wallet": WALLET }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body(&response);
        let remaining = body["remaining"].as_i64().unwrap();
        match body["found"].as_bool().unwrap() {
            true => assert_eq!(remaining, 99),
            false => assert_eq!(remaining, 100),
        }
    }

    #[tokio::test]
    async fn cors_allows_the_configured_origin() {
        let (_, services) = offline();
        let api = routes(services, DEFAULT_ORIGIN);

        let response = warp::test::request()
            .method("OPTIONS")
            .path("/nft-search")
            .header("origin", DEFAULT_ORIGIN)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            DEFAULT_ORIGIN
        );

        let response = warp::test::request()
            .method("POST")
            .path("/record-wallet")
            .header("origin", "https://evil.example")
            .json(&json!({ "wallet": WALLET }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
