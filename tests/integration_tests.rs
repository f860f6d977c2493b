use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use stormtrack::compute::stats::{StormCounts, clipping_counts, durations_hours};
use stormtrack::compute::temporal::ForecastSchedule;
use stormtrack::index::floor_hour;
use stormtrack::{
    BatchMatcher, Config, Crs, NearestStormMatcher, Point, StormCollection, StormFilter,
    StormFormat, StormLoader, StormType, SwissProjector, TemporalIndex, build_tracks, nearest,
    storage,
};
use tempfile::tempdir;

const STORMS_CSV: &str = "\
ID,time,longitude,latitude,A,w_rainstorm,s_rainstorm,w_hailstorm,s_hailstorm,supercell
S1,202106281200,7.0,46.0,100,0,0,1,0,0
S1,202106281230,7.01,46.01,100,0,0,1,0,0
S2,202106281215,8.5,47.3,40,1,0,0,0,0
S2,202106281255,8.6,47.35,55,1,0,0,0,0
S2,202106281310,8.7,47.4,60,1,1,0,0,0
S3,202106291805,9.5,46.2,12,0,0,1,1,1
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, day, hour, minute, 0).unwrap()
}

fn load_sample() -> StormCollection {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storms.csv");
    std::fs::write(&path, STORMS_CSV).unwrap();
    StormLoader::new().load(&path).unwrap()
}

#[test]
fn test_load_groups_and_orders() {
    init_logging();
    let storms = load_sample();

    assert_eq!(storms.len(), 3);
    assert_eq!(storms.num_points(), 6);
    assert_eq!(storms.crs(), Crs::Wgs84);

    let s2 = storms.get("S2").unwrap();
    assert_eq!(s2.start(), at(28, 12, 15));
    assert_eq!(s2.end(), at(28, 13, 10));
    assert!(s2.last().flags.severe_rainstorm);
}

#[test]
fn test_nearest_storm_scenario() {
    init_logging();
    let storms = load_sample();
    let index = TemporalIndex::build(&storms);
    let station = [Point::new(7.0, 46.0)];

    let inside = nearest(&storms, &index, &station, at(28, 12, 30), Crs::Wgs84).unwrap();
    assert_eq!(inside.ids[0].as_deref(), Some("S1"));
    assert!(inside.distances_km[0].is_finite());

    let outside = nearest(&storms, &index, &station, at(28, 14, 0), Crs::Wgs84).unwrap();
    assert_eq!(outside.ids[0], None);
    assert_eq!(outside.distances_km[0], f64::INFINITY);
}

#[test]
fn test_nearest_with_planar_stations() {
    let storms = load_sample();
    let index = TemporalIndex::build(&storms);

    // Same station as above, given directly in LV03.
    let station = to_lv03(7.0, 46.0);
    let result = nearest(&storms, &index, &[station], at(28, 12, 30), Crs::Lv03).unwrap();
    assert_eq!(result.ids[0].as_deref(), Some("S1"));
    assert!(result.distances_km[0] < 0.01);
}

fn to_lv03(lon: f64, lat: f64) -> Point {
    use stormtrack::Projector;
    SwissProjector
        .project(Point::new(lon, lat), Crs::Wgs84, Crs::Lv03)
        .unwrap()
}

#[test]
fn test_index_covers_every_observation() {
    let storms = load_sample();
    let index = TemporalIndex::build(&storms);
    for p in storms.points() {
        assert!(index.active_at(floor_hour(p.timestamp)).contains(&p.storm_id));
    }
    assert!(index.active_at(at(28, 13, 0)).contains("S2"));
    assert!(!index.active_at(at(28, 13, 0)).contains("S1"));
}

#[test]
fn test_csv_save_load_roundtrip() {
    let storms = load_sample();
    let dir = tempdir().unwrap();
    let path = dir.path().join("copy.csv");

    storage::save(&storms, &path, StormFormat::Csv).unwrap();
    let reloaded = storage::load(&path, StormFormat::Csv).unwrap();

    let mut original: Vec<_> = storms.points().cloned().collect();
    let mut copy: Vec<_> = reloaded.points().cloned().collect();
    original.sort_by(|a, b| (&a.storm_id, a.timestamp).cmp(&(&b.storm_id, b.timestamp)));
    copy.sort_by(|a, b| (&a.storm_id, a.timestamp).cmp(&(&b.storm_id, b.timestamp)));
    assert_eq!(original, copy);
}

#[cfg(feature = "snapshot")]
#[test]
fn test_binary_save_load_roundtrip() {
    let storms = load_sample();
    let dir = tempdir().unwrap();
    let path = dir.path().join("storms.pkl");

    StormLoader::new().save(&storms, &path).unwrap();
    assert_eq!(StormLoader::new().load(&path).unwrap(), storms);
}

#[test]
fn test_filter_pipeline() {
    let storms = load_sample();

    let june_28 = StormFilter::new()
        .min_date(NaiveDate::from_ymd_opt(2021, 6, 28).unwrap())
        .max_date(NaiveDate::from_ymd_opt(2021, 6, 29).unwrap());
    let day = june_28.apply(&storms);
    assert_eq!(day.ids().collect::<Vec<_>>(), vec!["S1", "S2"]);

    let hail = StormFilter::new().storm_type(StormType::Hailstorm).apply(&storms);
    assert_eq!(hail.ids().collect::<Vec<_>>(), vec!["S1", "S3"]);

    let parsed = StormFilter::from_pairs([("min_lon", "8.0"), ("max_lat", "47.4")]).unwrap();
    // S2 reaches exactly 47.4, which the exclusive upper bound drops.
    assert_eq!(parsed.apply(&storms).ids().collect::<Vec<_>>(), vec!["S3"]);

    assert_eq!(june_28.apply(&day), day);
}

#[test]
fn test_matcher_on_filtered_collection() {
    let storms = load_sample();
    let rain = StormFilter::new().storm_type(StormType::Rainstorm).apply(&storms);
    let index = TemporalIndex::build(&rain);

    // S1 is closer but filtered out.
    let result = nearest(&rain, &index, &[Point::new(7.0, 46.0)], at(28, 12, 30), Crs::Wgs84).unwrap();
    assert_eq!(result.ids[0].as_deref(), Some("S2"));
}

#[test]
fn test_batch_over_a_day() {
    init_logging();
    let storms = load_sample();
    let index = TemporalIndex::build(&storms);
    let config = Config::default();
    let matcher = NearestStormMatcher::from_config(&storms, &index, &SwissProjector, &config).unwrap();

    let stations = vec![Point::new(7.0, 46.0), Point::new(8.6, 47.35), Point::new(9.5, 46.2)];
    let batch = BatchMatcher::new(matcher, stations, Crs::Wgs84);
    let instants =
        stormtrack::batch::instants_between(at(28, 0, 0), at(29, 23, 0), Duration::hours(1))
            .unwrap();
    let results = batch.run(&instants).unwrap();

    assert_eq!(results.len(), 48);
    let hits: Vec<_> = results
        .iter()
        .filter(|r| r.matched() > 0)
        .map(|r| r.instant)
        .collect();
    // S3 is only observed at 18:05, after the 18:00 instant of its hour.
    assert_eq!(hits, vec![at(28, 12, 0), at(28, 13, 0)]);
}

#[test]
fn test_tracks_and_statistics() {
    let storms = load_sample();
    let tracks = build_tracks(&storms);
    assert_eq!(tracks.len(), 3);
    assert!(tracks["S3"].geometry.is_point());
    assert_eq!(tracks["S2"].geometry.num_points(), 3);

    let lengths =
        stormtrack::compute::stats::track_lengths_km(&tracks, &SwissProjector, Crs::Lv95).unwrap();
    assert!(lengths["S2"] > 10.0 && lengths["S2"] < 30.0);
    assert_eq!(lengths["S3"], 0.0);

    let durations = durations_hours(&storms);
    assert_eq!(durations["S1"], 0.5);

    let counts = StormCounts::of(&storms);
    assert_eq!(counts.total, 3);
    assert_eq!(counts.hailstorm, 2);
    assert_eq!(counts.supercell, 1);

    let clipping = clipping_counts(&storms, 26).unwrap();
    assert!(clipping.windows(2).all(|w| w[0].counts.total <= w[1].counts.total));
    assert_eq!(clipping[0].counts.total, 3);
}

#[cfg(feature = "geojson")]
#[test]
fn test_track_file_roundtrip() {
    let tracks = build_tracks(&load_sample());
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.geojson");

    stormtrack::save_tracks(&tracks, &path).unwrap();
    assert_eq!(stormtrack::load_tracks(&path).unwrap(), tracks);
}

#[test]
fn test_forecast_schedule() {
    let storms = load_sample();
    let schedule =
        ForecastSchedule::build(&storms, &[Duration::hours(6), Duration::hours(24)]).unwrap();

    // Storm hours: 28th 12h, 13h and 29th 18h.
    assert_eq!(schedule.len(), 6);
    assert!(schedule.is_required(at(28, 6, 0), Duration::hours(6)));
    assert!(schedule.is_required(at(28, 18, 0), Duration::hours(24)));
    assert!(!schedule.is_required(at(28, 18, 0), Duration::hours(6)));
}

#[test]
fn test_config_drives_loader() {
    let config = Config::from_json(r#"{"csv_delimiter": ";", "storm_crs": "wgs84"}"#).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("storms.csv");
    std::fs::write(&path, STORMS_CSV.replace(',', ";")).unwrap();

    let storms = StormLoader::new().config(config).load(&path).unwrap();
    assert_eq!(storms, load_sample());
}
