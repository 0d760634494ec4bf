use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::dataset::ElectionData;
use crate::error::{ElectionError, EntityKind};
use crate::metrics;
use crate::models::{
    self, ApiIndex, ConstituencyTypeQuery, ConstituencyTypeReport, ElectionRecord,
    ElectionSummary, MarginStats, PartiesQuery, PartyComparison, PartyPerformance, PartyTrends,
    SearchQuery, SearchResults, StatePartyTrends, StateQuery, StateVoteShareTrends, TrendQuery,
    TurnoutReport, Year, YearComparison, YearsQuery,
};
use crate::validated_query::{ValidatedPath, ValidatedQuery};

use axum::{
    extract::State,
    http::{HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use std::collections::BTreeMap;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::{event, Level};

/// Routes served under `/api`, relative to it.
fn api_routes() -> Vec<(&'static str, MethodRouter<SharedAppState>)> {
    vec![
        ("/years", get(years)),
        ("/constituencies", get(constituencies)),
        ("/parties", get(parties)),
        ("/states", get(states)),
        ("/election/:year", get(election)),
        ("/constituency/:name", get(constituency)),
        ("/party/:name", get(party)),
        ("/compare/parties", get(compare_parties)),
        ("/compare/years", get(compare_years)),
        ("/state-party-trends", get(state_party_trends)),
        ("/state-vote-share", get(state_vote_share)),
        ("/state-analysis", get(state_analysis)),
        ("/party-trends", get(party_trends)),
        ("/constituency-types", get(constituency_types)),
        ("/turnout", get(turnout)),
        ("/winmargin", get(win_margins)),
        ("/search", get(search)),
    ]
}

/// The `/api` router, with an index at its root listing every other route.
fn api() -> Router<SharedAppState> {
    let routes = api_routes();
    let endpoints: Vec<String> = routes
        .iter()
        .map(|(path, _)| format!("/api{}", path))
        .collect();
    let router = Router::new().route("/", get(move || index(endpoints.clone())));
    routes
        .into_iter()
        .fold(router, |router, (path, method_router)| {
            router.route(path, method_router)
        })
}

/// Build the CORS layer for the configured origins.
///
/// An empty list or one containing `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET]);
    let origins: Vec<&str> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .collect();
    if origins.is_empty() || origins.contains(&"*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                event!(Level::WARN, "Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Returns a [axum::Router] for the Election Explorer API
///
/// The router is populated with all routes as well as the following middleware:
///
/// * a [tower_http::trace::TraceLayer] providing logging and metrics for each request
/// * a [tower_http::cors::CorsLayer] allowing cross-origin reads from the configured origins
///
/// # Arguments
///
/// * `state`: Shared application state holding the loaded election data
pub fn router(state: SharedAppState) -> Router {
    let cors = cors_layer(&state.args.cors_origins);
    Router::new()
        .nest("/api", api())
        .route("/metrics", get(metrics::metrics_handler))
        .fallback(not_found)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(metrics::request_counter)
                .on_response(metrics::record_response_metrics),
        )
        .with_state(state)
}

/// The Election Explorer service type
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] for the Election Explorer API
///
/// The service is populated with all routes as well as the following middleware:
///
/// * a [tower_http::normalize_path::NormalizePathLayer] for trimming trailing slashes from
///   requests
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `data`: Election data loaded at startup
pub fn service(args: &CommandLineArgs, data: ElectionData) -> Service {
    let state = SharedAppState::new(AppState::new(args, data));
    let router = router(state);
    // Note that any middleware that should affect routing must wrap the router.
    // See https://docs.rs/axum/0.6.12/axum/middleware/index.html#rewriting-request-uri-in-middleware
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn index(endpoints: Vec<String>) -> Json<ApiIndex> {
    Json(ApiIndex {
        message: "Lok Sabha Elections API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}

async fn years(State(state): State<SharedAppState>) -> Json<Vec<Year>> {
    Json(state.data.years())
}

async fn constituencies(State(state): State<SharedAppState>) -> Json<Vec<String>> {
    Json(state.data.constituencies())
}

async fn parties(State(state): State<SharedAppState>) -> Json<Vec<String>> {
    Json(state.data.parties())
}

async fn states(State(state): State<SharedAppState>) -> Json<Vec<String>> {
    Json(state.data.states())
}

async fn election(
    State(state): State<SharedAppState>,
    ValidatedPath(year): ValidatedPath<String>,
) -> Result<Json<ElectionSummary>, ElectionError> {
    let year = models::parse_year(&year)?;
    Ok(Json(state.data.election_summary(year)?))
}

async fn constituency(
    State(state): State<SharedAppState>,
    ValidatedPath(name): ValidatedPath<String>,
) -> Result<Json<Vec<ElectionRecord>>, ElectionError> {
    Ok(Json(state.data.constituency_results(&name)?))
}

async fn party(
    State(state): State<SharedAppState>,
    ValidatedPath(name): ValidatedPath<String>,
) -> Result<Json<PartyPerformance>, ElectionError> {
    Ok(Json(state.data.party_performance(&name)?))
}

async fn compare_parties(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<PartiesQuery>,
) -> Result<Json<PartyComparison>, ElectionError> {
    Ok(Json(state.data.compare_parties(&query.parties)?))
}

async fn compare_years(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<YearsQuery>,
) -> Result<Json<YearComparison>, ElectionError> {
    Ok(Json(state.data.compare_years(&query.years)?))
}

async fn state_party_trends(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<TrendQuery>,
) -> Result<Json<StatePartyTrends>, ElectionError> {
    let trends = state
        .data
        .state_party_trends_for(query.state.as_deref(), query.party.as_deref())?;
    Ok(Json(trends))
}

async fn state_vote_share(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<TrendQuery>,
) -> Result<Json<StateVoteShareTrends>, ElectionError> {
    let shares = state
        .data
        .state_vote_share_trends(query.state.as_deref(), query.party.as_deref())?;
    Ok(Json(shares))
}

async fn state_analysis(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<StateQuery>,
) -> Result<Response, ElectionError> {
    let response = match query.state {
        Some(name) => Json(state.data.state_summary(&name)?).into_response(),
        None => Json(state.data.all_state_summaries()?).into_response(),
    };
    Ok(response)
}

async fn party_trends(State(state): State<SharedAppState>) -> Json<PartyTrends> {
    Json(state.data.party_trends())
}

async fn constituency_types(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<ConstituencyTypeQuery>,
) -> Result<Json<ConstituencyTypeReport>, ElectionError> {
    let report = state
        .data
        .constituency_types(query.constituency_type.as_deref())?;
    Ok(Json(report))
}

async fn turnout(State(state): State<SharedAppState>) -> Json<TurnoutReport> {
    Json(state.data.turnout())
}

async fn win_margins(State(state): State<SharedAppState>) -> Json<BTreeMap<Year, MarginStats>> {
    Json(state.data.win_margins())
}

async fn search(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<SearchResults>, ElectionError> {
    Ok(Json(state.data.search(&query.q)?))
}

async fn not_found(uri: Uri) -> ElectionError {
    ElectionError::not_found(EntityKind::Route, uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, *};

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use clap::Parser;
    use regex::Regex;
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    fn test_service(cors_origins: &str) -> Service {
        let args = CommandLineArgs::try_parse_from([
            "election-explorer",
            "--cors-origins",
            cors_origins,
        ])
        .unwrap();
        service(&args, test_utils::get_test_data())
    }

    async fn get_response(uri: &str) -> Response {
        test_service("*")
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    async fn get_json(uri: &str, status: StatusCode) -> Value {
        let response = get_response(uri).await;
        assert_eq!(status, response.status(), "uri: {uri}");
        assert_eq!(
            "application/json",
            response.headers()[header::CONTENT_TYPE].to_str().unwrap()
        );
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    async fn get_error_message(uri: &str, status: StatusCode) -> String {
        let body = get_json(uri, status).await;
        body["error"]["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn api_index() {
        let body = get_json("/api", StatusCode::OK).await;
        assert_eq!("Lok Sabha Elections API", body["message"]);
        let endpoints = body["endpoints"].as_array().unwrap();
        assert_eq!(api_routes().len(), endpoints.len());
        assert!(endpoints.contains(&json!("/api/constituency-types")));
    }

    #[tokio::test]
    async fn api_index_endpoints_are_routed() {
        let body = get_json("/api", StatusCode::OK).await;
        for endpoint in body["endpoints"].as_array().unwrap() {
            let uri = endpoint
                .as_str()
                .unwrap()
                .replace(":year", "2019")
                .replace(":name", VARANASI);
            let response = get_response(&uri).await;
            if response.status() == StatusCode::NOT_FOUND {
                let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
                let message = body["error"]["message"].as_str().unwrap();
                assert!(!message.starts_with("route"), "{uri}: {message}");
            }
        }
    }

    #[tokio::test]
    async fn list_years() {
        let body = get_json("/api/years", StatusCode::OK).await;
        assert_eq!(json!([2019, 2024]), body);
    }

    #[tokio::test]
    async fn list_names() {
        let body = get_json("/api/constituencies", StatusCode::OK).await;
        assert_eq!(json!([AMETHI, THRISSUR, VARANASI, WAYANAD]), body);
        let body = get_json("/api/parties", StatusCode::OK).await;
        assert_eq!(json!([ALPHA, BETA, GAMMA]), body);
        let body = get_json("/api/states", StatusCode::OK).await;
        assert_eq!(json!([KERALA, UTTAR_PRADESH]), body);
    }

    #[tokio::test]
    async fn trailing_slash() {
        let body = get_json("/api/years/", StatusCode::OK).await;
        assert_eq!(json!([2019, 2024]), body);
    }

    #[tokio::test]
    async fn constituency_results() {
        let body = get_json("/api/constituency/Varanasi", StatusCode::OK).await;
        let results = body.as_array().unwrap();
        assert_eq!(5, results.len());
        assert_eq!(
            json!({
                "year": 2019,
                "state": UTTAR_PRADESH,
                "constituency": VARANASI,
                "party": ALPHA,
                "candidate": "Asha Rao",
                "votes": 500,
                "electors": 1000,
                "constituency_type": "GEN",
                "rank": 1,
                "winner": true,
                "vote_share": 55.56,
            }),
            results[0]
        );
        assert_eq!(json!(2024), results[3]["year"]);
        assert_eq!(json!(true), results[3]["winner"]);
    }

    #[tokio::test]
    async fn constituency_invalid_utf8() {
        let message = get_error_message("/api/constituency/%FF", StatusCode::BAD_REQUEST).await;
        assert!(message.starts_with("invalid input: "), "{message}");
    }

    #[tokio::test]
    async fn party_invalid_utf8() {
        get_json("/api/party/%C3%28", StatusCode::BAD_REQUEST).await;
    }

    #[tokio::test]
    async fn constituency_not_found() {
        let message =
            get_error_message("/api/constituency/NoSuchPlace", StatusCode::NOT_FOUND).await;
        assert_eq!("constituency NoSuchPlace not found", message);
    }

    #[tokio::test]
    async fn party_performance() {
        let body = get_json("/api/party/Alpha%20Party", StatusCode::OK).await;
        assert_eq!(json!(2), body["2019"]["seats_won"]);
        assert_eq!(json!(1050), body["2019"]["total_votes"]);
        assert_eq!(json!(3), body["2019"]["constituencies_contested"]);
        assert_eq!(json!(66.67), body["2019"]["seat_share"]);
        assert_eq!(json!(51.22), body["2019"]["vote_share"]);
        assert_eq!(
            json!({
                "constituency": VARANASI,
                "state": UTTAR_PRADESH,
                "candidate": "Asha Rao",
                "votes": 500,
                "margin": 200,
                "margin_percent": 22.22,
            }),
            body["2019"]["seats"][1]
        );
        assert_eq!(json!(1), body["2024"]["seats_won"]);
    }

    #[tokio::test]
    async fn party_not_found() {
        let message = get_error_message("/api/party/Delta%20Dal", StatusCode::NOT_FOUND).await;
        assert_eq!("party Delta Dal not found", message);
    }

    #[tokio::test]
    async fn compare_parties() {
        let body = get_json(
            "/api/compare/parties?parties=Alpha+Party&parties=Delta+Dal",
            StatusCode::OK,
        )
        .await;
        let single = get_json("/api/party/Alpha%20Party", StatusCode::OK).await;
        assert_eq!(json!({ ALPHA: single }), body["parties"]);
        assert_eq!(json!(["Delta Dal"]), body["unknown"]);
    }

    #[tokio::test]
    async fn compare_parties_without_parties() {
        let body = get_json("/api/compare/parties", StatusCode::BAD_REQUEST).await;
        assert_eq!("query parameters are not valid", body["error"]["message"]);
        let caused_by = body["error"]["caused_by"].to_string();
        let re = Regex::new(r"at least one party must be specified").unwrap();
        assert!(re.is_match(&caused_by), "caused_by: {caused_by}");
    }

    #[tokio::test]
    async fn compare_years() {
        let body = get_json("/api/compare/years?years=2019&years=2024", StatusCode::OK).await;
        assert_eq!(json!([2019, 2024]), body["years"]);
        assert_eq!(json!({"2019": 1, "2024": 2}), body["party_seats"][BETA]);
        assert_eq!(json!({"2019": 71.67, "2024": 81.94}), body["turnout"]);
    }

    #[tokio::test]
    async fn compare_years_invalid() {
        let message =
            get_error_message("/api/compare/years?years=recent", StatusCode::BAD_REQUEST).await;
        assert_eq!("invalid input: invalid year \"recent\"", message);
        let message =
            get_error_message("/api/compare/years?years=1999", StatusCode::NOT_FOUND).await;
        assert_eq!("year 1999 not found", message);
        get_json("/api/compare/years", StatusCode::BAD_REQUEST).await;
    }

    #[tokio::test]
    async fn election_summary() {
        let body = get_json("/api/election/2019", StatusCode::OK).await;
        assert_eq!(json!(3), body["total_seats"]);
        assert_eq!(json!({ALPHA: 2, BETA: 1}), body["party_seats"]);
        assert_eq!(3, body["constituencies"].as_array().unwrap().len());
    }

    #[tokio::test]
    async fn election_summary_invalid() {
        let message = get_error_message("/api/election/next", StatusCode::BAD_REQUEST).await;
        assert_eq!("invalid input: invalid year \"next\"", message);
        let message = get_error_message("/api/election/1999", StatusCode::NOT_FOUND).await;
        assert_eq!("year 1999 not found", message);
    }

    #[tokio::test]
    async fn state_party_trends() {
        let body = get_json("/api/state-party-trends", StatusCode::OK).await;
        assert_eq!(
            json!({
                KERALA: {
                    ALPHA: {"2019": 1, "2024": 1},
                    GAMMA: {"2019": 0, "2024": 1},
                },
                UTTAR_PRADESH: {
                    ALPHA: {"2019": 1, "2024": 0},
                    BETA: {"2019": 1, "2024": 2},
                    GAMMA: {"2019": 0, "2024": 0},
                },
            }),
            body
        );
    }

    #[tokio::test]
    async fn state_party_trends_for_state() {
        let body = get_json("/api/state-party-trends?state=Kerala", StatusCode::OK).await;
        assert_eq!(vec![KERALA], body.as_object().unwrap().keys().collect::<Vec<_>>());
        let message =
            get_error_message("/api/state-party-trends?state=Atlantis", StatusCode::NOT_FOUND)
                .await;
        assert_eq!("state Atlantis not found", message);
    }

    #[tokio::test]
    async fn state_party_trends_for_party() {
        let body = get_json(
            "/api/state-party-trends?state=Uttar+Pradesh&party=Beta+Front",
            StatusCode::OK,
        )
        .await;
        assert_eq!(json!({UTTAR_PRADESH: {BETA: {"2019": 1, "2024": 2}}}), body);
        let message =
            get_error_message("/api/state-party-trends?party=Delta+Dal", StatusCode::NOT_FOUND)
                .await;
        assert_eq!("party Delta Dal not found", message);
    }

    #[tokio::test]
    async fn state_vote_share() {
        let body = get_json("/api/state-vote-share?state=Kerala", StatusCode::OK).await;
        assert_eq!(
            json!({
                KERALA: {
                    ALPHA: {"2019": 50.0, "2024": 72.73},
                    GAMMA: {"2019": 50.0, "2024": 27.27},
                },
            }),
            body
        );
        let body = get_json("/api/state-vote-share?party=Gamma+League", StatusCode::OK).await;
        assert_eq!(json!({"2019": 6.06, "2024": 3.03}), body[UTTAR_PRADESH][GAMMA]);
    }

    #[tokio::test]
    async fn constituency_types() {
        let body = get_json("/api/constituency-types", StatusCode::OK).await;
        assert_eq!(json!([2019, 2024]), body["years"]);
        assert_eq!(json!([GEN, SC]), body["types"]);
        assert_eq!(json!({"2019": 1, "2024": 1}), body["data"][SC]["seats"]);
        assert_eq!(
            json!({"2019": 75.0, "2024": null}),
            body["data"][SC]["avg_turnout"]
        );

        let body = get_json("/api/constituency-types?type=GEN", StatusCode::OK).await;
        assert_eq!(json!([GEN]), body["types"]);
        assert_eq!(json!({"2019": 2, "2024": 0}), body["data"][GEN]["party_seats"][ALPHA]);

        let message =
            get_error_message("/api/constituency-types?type=ST", StatusCode::NOT_FOUND).await;
        assert_eq!("constituency type ST not found", message);
    }

    #[tokio::test]
    async fn state_analysis() {
        let body = get_json("/api/state-analysis?state=Uttar%20Pradesh", StatusCode::OK).await;
        assert_eq!(json!(UTTAR_PRADESH), body["state"]);
        assert_eq!(json!(2), body["years"]["2019"]["total_seats"]);

        let body = get_json("/api/state-analysis", StatusCode::OK).await;
        assert_eq!(2, body.as_object().unwrap().len());
        assert_eq!(json!(KERALA), body[KERALA]["state"]);
    }

    #[tokio::test]
    async fn party_trends() {
        let body = get_json("/api/party-trends", StatusCode::OK).await;
        assert_eq!(
            json!({
                "years": [2019, 2024],
                "seats": {ALPHA: [2, 1], BETA: [1, 2]},
            }),
            body
        );
    }

    #[tokio::test]
    async fn turnout() {
        let body = get_json("/api/turnout", StatusCode::OK).await;
        assert_eq!(json!({"2019": 71.67, "2024": 81.94}), body["years"]);
        assert_eq!(json!({"2019": 50.0, "2024": 75.0}), body["states"][KERALA]);
    }

    #[tokio::test]
    async fn win_margins() {
        let body = get_json("/api/winmargin", StatusCode::OK).await;
        assert_eq!(
            json!({"avg_margin_percent": 9.63, "close_contests": 1, "landslide_wins": 1}),
            body["2019"]
        );
    }

    #[tokio::test]
    async fn search() {
        let body = get_json("/api/search?q=an", StatusCode::OK).await;
        assert_eq!(
            json!({
                "constituencies": [VARANASI, WAYANAD],
                "candidates": ["Farah Khan"],
                "parties": [],
            }),
            body
        );
    }

    #[tokio::test]
    async fn search_without_query() {
        let body = get_json("/api/search", StatusCode::BAD_REQUEST).await;
        assert_eq!("query parameters are not valid", body["error"]["message"]);
    }

    #[tokio::test]
    async fn unknown_route() {
        let message = get_error_message("/nope", StatusCode::NOT_FOUND).await;
        assert_eq!("route /nope not found", message);
    }

    #[tokio::test]
    async fn metrics_endpoint() {
        let response = get_response("/metrics").await;
        assert_eq!(StatusCode::OK, response.status());
    }

    #[tokio::test]
    async fn cors_any_origin() {
        let response = test_service("*")
            .oneshot(
                Request::builder()
                    .uri("/api/years")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "*",
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN]
                .to_str()
                .unwrap()
        );
    }

    #[tokio::test]
    async fn cors_listed_origin() {
        let origins = "http://localhost:3000,http://localhost:8000";
        let request = |origin: &'static str| {
            Request::builder()
                .uri("/api/years")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap()
        };

        let response = test_service(origins)
            .oneshot(request("http://localhost:8000"))
            .await
            .unwrap();
        assert_eq!(
            "http://localhost:8000",
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN]
                .to_str()
                .unwrap()
        );

        let response = test_service(origins)
            .oneshot(request("https://example.com"))
            .await
            .unwrap();
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
