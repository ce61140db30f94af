use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::{Value, json};

use s2series::io::writers::tables::{COVERAGE_HEADER, SELECTED_HEADER, TIME_SERIES_HEADER};
use s2series::{Error, SelectionParams, run_files_to_dir};

fn strip(lon0: f64, lon1: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[lon0, 39.5], [lon1, 39.5], [lon1, 41.5], [lon0, 41.5], [lon0, 39.5]]]
    })
}

fn item(id: &str, tile: &str, datetime: &str, cloud: f64, geometry: Value) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "collection": "sentinel-2-l2a",
        "geometry": geometry,
        "properties": {
            "datetime": datetime,
            "eo:cloud_cover": cloud,
            "s2:mgrs_tile": tile,
            "platform": "sentinel-2b",
            "constellation": "sentinel-2"
        }
    })
}

fn write_json(path: &Path, value: &Value) -> PathBuf {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path.to_path_buf()
}

fn write_aoi(dir: &Path) -> PathBuf {
    let aoi = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "name": "test" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[22.8, 40.0], [23.1, 40.0], [23.1, 41.0], [22.8, 41.0], [22.8, 40.0]]]
            }
        }]
    });
    write_json(&dir.join("aoi.geojson"), &aoi)
}

fn params() -> SelectionParams {
    SelectionParams {
        n_anchors: 4,
        window_days: 60,
        date_start: NaiveDate::from_ymd_opt(2021, 1, 1),
        date_end: NaiveDate::from_ymd_opt(2021, 12, 31),
        ..Default::default()
    }
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn writes_all_tables_for_a_two_page_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let aoi = write_aoi(dir.path());
    let page1 = write_json(
        &dir.path().join("page1.json"),
        &json!({
            "type": "FeatureCollection",
            "features": [
                item("S2B_W_0215", "34TFL", "2021-02-15T09:30:21Z", 4.0, strip(22.0, 23.0)),
                item("S2B_E_0215", "34TGL", "2021-02-15T09:30:21Z", 6.0, strip(22.9, 24.0)),
                item("S2B_CLOUDY", "34TFL", "2021-05-17T09:30:21Z", 55.0, strip(22.0, 24.0)),
            ]
        }),
    );
    let page2 = write_json(
        &dir.path().join("page2.json"),
        &json!([
            item("S2A_FULL_0817", "34TFK", "2021-08-17T09:20:11Z", 2.0, strip(22.0, 24.0)),
            item("S2A_OLD", "34TFK", "2020-08-17T09:20:11Z", 1.0, strip(22.0, 24.0)),
        ]),
    );
    let out = dir.path().join("tables");

    let report = run_files_to_dir(&aoi, &[page1, page2], &out, &params()).unwrap();

    assert_eq!(report.scenes, 3);
    assert_eq!(report.timestamps, 2);
    assert_eq!(report.full_cover_timestamps, 2);
    assert_eq!(report.anchors_requested, 4);
    assert_eq!(report.anchors_selected, 2);

    for path in [
        &report.paths.scenes_catalog,
        &report.paths.coverage,
        &report.paths.selected,
        &report.paths.time_series,
        &report.paths.summary,
    ] {
        assert!(path.exists(), "{path:?} missing");
    }

    let time_series = lines(&report.paths.time_series);
    assert_eq!(time_series[0], TIME_SERIES_HEADER.join(","));
    assert_eq!(time_series.len(), 3);
    assert!(time_series[1].starts_with("2021-02-15,2021-02-15T09:30:21Z,S2B_W_0215;S2B_E_0215,2,"));
    assert!(time_series[2].starts_with("2021-08-17,2021-08-17T09:20:11Z,S2A_FULL_0817,1,"));

    let selected = lines(&report.paths.selected);
    assert_eq!(selected[0], SELECTED_HEADER.join(","));
    assert_eq!(selected.len(), 4);

    let summary: Value = serde_json::from_str(&fs::read_to_string(&report.paths.summary).unwrap()).unwrap();
    assert_eq!(summary["anchors_selected"], 2);
    assert_eq!(summary["params"]["date_end"], "2021-12-31");
    let kinds: Vec<&str> = summary["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["no_candidate_for_anchor", "no_candidate_for_anchor"]);
}

#[test]
fn empty_catalog_still_writes_headers() {
    let dir = tempfile::tempdir().unwrap();
    let aoi = write_aoi(dir.path());
    let page = write_json(&dir.path().join("empty.json"), &json!([]));
    let out = dir.path().join("tables");

    let report = run_files_to_dir(&aoi, &[page], &out, &params()).unwrap();

    assert_eq!(report.scenes, 0);
    assert_eq!(lines(&report.paths.coverage), vec![COVERAGE_HEADER.join(",")]);
    assert_eq!(lines(&report.paths.selected), vec![SELECTED_HEADER.join(",")]);
    assert_eq!(lines(&report.paths.time_series), vec![TIME_SERIES_HEADER.join(",")]);
    assert_eq!(lines(&report.paths.scenes_catalog).len(), 1);

    let summary: Value = serde_json::from_str(&fs::read_to_string(&report.paths.summary).unwrap()).unwrap();
    assert_eq!(summary["diagnostics"][0]["kind"], "empty_catalog");
}

#[test]
fn missing_catalog_page_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let aoi = write_aoi(dir.path());
    let missing = dir.path().join("nope.json");

    let err = run_files_to_dir(&aoi, &[missing], &dir.path().join("tables"), &params()).unwrap_err();
    assert!(matches!(err, Error::Catalog(_)));
}
