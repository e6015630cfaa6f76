//! HTTP routes: autocomplete, weather settings, city import, city pages and blocks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use warp::{Filter, Rejection, Reply};
use weather_cities::{suggest, City, CityRepository, ImportJob, IMPORT_TITLE};
use weather_core::{is_known_country, AppError, BlockConfiguration, COUNTRY_OPTIONS};
use weather_provider::BlockForm;

use crate::rejection::{handle_rejection, reject};
use crate::state::AppState;

/// Page size for `/weather_city/list` when none is given.
const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

/// All routes, with errors rendered as JSON.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let resource_dir = state.config().catalog.resource_dir;

    autocomplete(state.clone())
        .or(settings(state.clone()))
        .or(import(state.clone()))
        .or(cities(state.clone()))
        .or(blocks(state))
        .or(warp::path("res").and(warp::fs::dir(resource_dir)))
        .with(warp::trace::request())
        .recover(handle_rejection)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

// ---- autocomplete ----

fn autocomplete(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::get()
        .and(warp::path!("weather" / "autocomplete"))
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(autocomplete_handler)
}

async fn autocomplete_handler(
    params: HashMap<String, String>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let query = params.get("q").map(String::as_str).unwrap_or_default();
    let suggestions = {
        let store = state.store.lock();
        suggest(&*store, query).map_err(reject)?
    };
    Ok(warp::reply::json(&suggestions))
}

// ---- settings ----

#[derive(Debug, Serialize)]
struct CountryOption {
    code: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct SettingsView {
    key: String,
    country: String,
    countries: Vec<CountryOption>,
    city_count: usize,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SettingsForm {
    #[serde(default)]
    key: String,
}

fn settings_view(state: &AppState) -> Result<SettingsView, AppError> {
    let config = state.config();
    let city_count = state.store.lock().count()?;

    Ok(SettingsView {
        key: config.weather.key,
        country: config.weather.country,
        countries: COUNTRY_OPTIONS
            .iter()
            .map(|&(code, label)| CountryOption { code, label })
            .collect(),
        city_count,
        message: format!("The count cities in database: {}", city_count),
    })
}

fn settings(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let show = warp::get()
        .and(warp::path!("admin" / "weather" / "settings"))
        .and(with_state(state.clone()))
        .and_then(|state: AppState| async move {
            settings_view(&state)
                .map(|view| warp::reply::json(&view))
                .map_err(reject)
        });

    let save = warp::post()
        .and(warp::path!("admin" / "weather" / "settings"))
        .and(warp::body::form::<SettingsForm>())
        .and(with_state(state))
        .and_then(|form: SettingsForm, state: AppState| async move {
            let key = form.key.trim().to_string();
            state
                .update_config(|config| config.weather.key = key)
                .map_err(reject)?;
            tracing::info!("Weather API key updated");
            let view = settings_view(&state).map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&view))
        });

    show.or(save)
}

// ---- city import ----

#[derive(Debug, Deserialize)]
struct ImportForm {
    country: String,
}

#[derive(Debug, Serialize)]
struct ImportStarted {
    title: &'static str,
    job: ImportJob,
}

#[derive(Debug, Serialize)]
struct ImportStepReply {
    job: ImportJob,
    progress: f64,
    finished: bool,
    message: Option<String>,
}

fn import(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let start = warp::post()
        .and(warp::path!("admin" / "weather" / "cities" / "import"))
        .and(warp::body::form::<ImportForm>())
        .and(with_state(state.clone()))
        .and_then(import_start_handler);

    let step = warp::post()
        .and(warp::path!("admin" / "weather" / "cities" / "import" / "step"))
        .and(warp::body::json::<ImportJob>())
        .and(with_state(state))
        .and_then(import_step_handler);

    start.or(step)
}

async fn import_start_handler(form: ImportForm, state: AppState) -> Result<impl Reply, Rejection> {
    let country = form.country.trim().to_uppercase();
    if !is_known_country(&country) {
        return Err(reject(AppError::Validation(format!(
            "Unsupported country: {}",
            country
        ))));
    }

    state
        .update_config(|config| config.weather.country = country.clone())
        .map_err(reject)?;
    tracing::info!("Starting city import for {}", country);

    Ok(warp::reply::json(&ImportStarted {
        title: IMPORT_TITLE,
        job: ImportJob::new(country),
    }))
}

async fn import_step_handler(mut job: ImportJob, state: AppState) -> Result<impl Reply, Rejection> {
    if job.needs_initialization() {
        let fetcher = state.fetcher();
        job.initialize(&fetcher).await;
    }

    {
        let store = state.store.lock();
        job.process_chunk(&*store).map_err(reject)?;
    }

    let finished = job.is_finished();
    let message = if finished {
        Some(job.finish_message())
    } else {
        job.message.clone()
    };

    Ok(warp::reply::json(&ImportStepReply {
        progress: job.progress(),
        finished,
        message,
        job,
    }))
}

// ---- city pages ----

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

fn cities(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::get()
        .and(warp::path!("weather_city" / "list"))
        .and(warp::query::<ListQuery>())
        .and(with_state(state.clone()))
        .and_then(|query: ListQuery, state: AppState| async move {
            let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
            let cities: Vec<City> = {
                let store = state.store.lock();
                store.list(query.offset, limit).map_err(reject)?
            };
            Ok::<_, Rejection>(warp::reply::json(&cities))
        });

    let canonical = warp::get()
        .and(warp::path!("weather_city" / i64))
        .and(with_state(state))
        .and_then(|city_id: i64, state: AppState| async move {
            let city = {
                let store = state.store.lock();
                store.get(city_id).map_err(reject)?
            };
            match city {
                Some(city) => Ok::<_, Rejection>(warp::reply::json(&city)),
                None => Err(reject(AppError::NotFound(format!("City {}", city_id)))),
            }
        });

    list.or(canonical)
}

// ---- blocks ----

fn blocks(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let render = warp::get()
        .and(warp::path!("block" / String))
        .and(with_state(state.clone()))
        .and_then(render_block_handler);

    let show_config = warp::get()
        .and(warp::path!("block" / String / "config"))
        .and(with_state(state.clone()))
        .and_then(|id: String, state: AppState| async move {
            let config = state.config();
            match config.blocks.get(&id) {
                Some(block) => Ok::<_, Rejection>(warp::reply::json(block)),
                None => Err(reject(AppError::NotFound(format!("Block {}", id)))),
            }
        });

    let save_config = warp::post()
        .and(warp::path!("block" / String / "config"))
        .and(warp::body::form::<BlockForm>())
        .and(with_state(state))
        .and_then(save_block_handler);

    render.or(show_config).or(save_config)
}

async fn render_block_handler(id: String, state: AppState) -> Result<impl Reply, Rejection> {
    let settings = {
        let config = state.config();
        config.blocks.get(&id).cloned()
    };
    let Some(settings) = settings else {
        return Err(reject(AppError::NotFound(format!("Block {}", id))));
    };

    let service = state.weather_service();
    let html = state.weather_block().render(&service, &settings).await;

    Ok(warp::reply::with_header(
        warp::reply::html(html),
        "cache-control",
        "no-store, max-age=0",
    ))
}

async fn save_block_handler(
    id: String,
    form: BlockForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let settings: BlockConfiguration = form.into_configuration().map_err(reject)?;

    let stored = settings.clone();
    state
        .update_config(|config| {
            config.blocks.insert(id.clone(), stored);
        })
        .map_err(reject)?;
    tracing::info!("Block {} now shows city {} in {}", id, settings.city, settings.scale);

    Ok(warp::reply::json(&settings))
}
