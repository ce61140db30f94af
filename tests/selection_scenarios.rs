use approx::assert_abs_diff_eq;
use chrono::{DateTime, Datelike, NaiveDate};
use geo::{MultiPolygon, Rect, coord};

use s2series::{
    AreaOfInterest, Diagnostic, Error, SceneRecord, SelectionParams, aoi_from_geodetic,
    rank_candidates_for_anchor, schedule_anchors, select_time_series,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).to_polygon(),
    ])
}

fn aoi() -> AreaOfInterest {
    aoi_from_geodetic(rect(0.0, 0.0, 10.0, 10.0)).unwrap()
}

/// Full-height strip over the AOI between two longitudes.
fn scene(id: &str, tile: &str, datetime: &str, cloud: f64, lon: (f64, f64)) -> SceneRecord {
    SceneRecord {
        id: id.to_string(),
        datetime: DateTime::parse_from_rfc3339(datetime).unwrap(),
        cloud_cover: cloud,
        tile_id: tile.to_string(),
        footprint: rect(lon.0, -1.0, lon.1, 11.0),
        platform: Some("sentinel-2a".to_string()),
        constellation: Some("sentinel-2".to_string()),
        collection: Some("sentinel-2-l2a".to_string()),
    }
}

fn year_2021() -> SelectionParams {
    SelectionParams {
        date_start: NaiveDate::from_ymd_opt(2021, 1, 1),
        date_end: NaiveDate::from_ymd_opt(2021, 12, 31),
        ..Default::default()
    }
}

#[test]
fn two_partial_tiles_are_unioned_when_neither_suffices() {
    let params = SelectionParams {
        n_anchors: 1,
        window_days: 400,
        full_cover_threshold: 0.95,
        ..year_2021()
    };
    let scenes = vec![
        scene("A", "34TFL", "2021-06-01T09:30:00Z", 5.0, (0.0, 6.0)),
        scene("B", "34TGL", "2021-06-01T09:30:00Z", 8.0, (4.5, 10.0)),
    ];

    let output = select_time_series(&aoi(), &scenes, &params).unwrap();

    assert_eq!(output.time_series.len(), 1);
    let row = &output.time_series[0];
    assert_eq!(row.tiles_count, 2);
    assert_eq!(row.tile_ids, "A;B");
    assert_eq!(row.cloud_score, 8.0);
    assert!(row.coverage_frac > 0.999);
    assert_eq!(output.selected.len(), 2);
}

#[test]
fn four_anchors_spread_over_2021() {
    let anchors = schedule_anchors(
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        4,
        21,
    )
    .unwrap();

    let ordinals: Vec<u32> = anchors.iter().map(|a| a.target_date.ordinal()).collect();
    assert_eq!(ordinals, vec![46, 137, 229, 320]);
    assert!(anchors.windows(2).all(|w| w[0].target_date < w[1].target_date));
}

#[test]
fn window_of_42_days_bounds_eligible_instants() {
    let params = SelectionParams {
        window_days: 42,
        ..year_2021()
    };
    let scenes = vec![
        scene("before", "T1", "2021-01-23T10:00:00Z", 1.0, (-1.0, 11.0)),
        scene("first", "T1", "2021-01-24T10:00:00Z", 9.0, (-1.0, 11.0)),
        scene("centre", "T1", "2021-02-14T10:00:00Z", 5.0, (-1.0, 11.0)),
        scene("last", "T1", "2021-03-06T10:00:00Z", 9.0, (-1.0, 11.0)),
        scene("after", "T1", "2021-03-07T10:00:00Z", 1.0, (-1.0, 11.0)),
    ];
    let anchor = NaiveDate::from_ymd_opt(2021, 2, 14).unwrap();

    let ranked = rank_candidates_for_anchor(&aoi(), &scenes, &params, anchor, 10).unwrap();

    let ids: Vec<String> = ranked.iter().map(|c| c.joined_ids()).collect();
    // equal cloud: the instant nearer the anchor wins
    assert_eq!(ids, vec!["centre", "last", "first"]);
}

#[test]
fn single_tiles_below_threshold_leave_selection_empty() {
    let params = SelectionParams {
        allow_union: false,
        full_cover_threshold: 0.95,
        n_anchors: 6,
        ..year_2021()
    };
    let scenes = vec![
        scene("A1", "T1", "2021-03-01T10:00:00Z", 2.0, (0.0, 8.0)),
        scene("B1", "T2", "2021-03-01T10:00:00Z", 2.0, (2.0, 10.0)),
        scene("A2", "T1", "2021-07-01T10:00:00Z", 2.0, (0.0, 8.0)),
    ];

    let output = select_time_series(&aoi(), &scenes, &params).unwrap();

    assert_eq!(output.coverage.len(), 2);
    for row in &output.coverage {
        assert!(!row.has_full_cover);
        assert_abs_diff_eq!(row.coverage_frac, 0.8, epsilon = 1e-6);
    }
    assert!(output.selected.is_empty());
    assert!(output.time_series.is_empty());
    assert!(
        output
            .diagnostics
            .contains(&Diagnostic::NoFullCoverageTimestamp { threshold: 0.95 })
    );
}

#[test]
fn repeated_runs_are_identical() {
    let params = SelectionParams {
        n_anchors: 12,
        window_days: 30,
        max_union_tiles: 3,
        ..year_2021()
    };
    let mut scenes = Vec::new();
    for (month, cloud) in [(1, 12.0), (3, 3.0), (5, 7.0), (8, 1.0), (11, 15.0)] {
        let dt = format!("2021-{month:02}-10T09:40:00Z");
        scenes.push(scene(&format!("W{month}"), "34TFL", &dt, cloud, (-1.0, 6.0)));
        scenes.push(scene(&format!("E{month}"), "34TGL", &dt, cloud + 1.0, (4.0, 11.0)));
    }

    let first = select_time_series(&aoi(), &scenes, &params).unwrap();
    let second = select_time_series(&aoi(), &scenes, &params).unwrap();

    assert_eq!(first, second);
    assert!(!first.time_series.is_empty());
}

#[test]
fn invalid_parameters_fail_before_processing() {
    let params = SelectionParams {
        n_anchors: 0,
        ..year_2021()
    };
    let err = select_time_series(&aoi(), &[], &params).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { param: "n_anchors", .. }));

    let params = SelectionParams {
        full_cover_threshold: 1.5,
        ..year_2021()
    };
    let err = select_time_series(&aoi(), &[], &params).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidConfiguration { param: "full_cover_threshold", .. }
    ));
}

#[test]
fn empty_catalog_is_not_an_error() {
    let output = select_time_series(&aoi(), &[], &year_2021()).unwrap();
    assert_eq!(output.anchors.len(), 24);
    assert!(output.coverage.is_empty());
    assert!(output.time_series.is_empty());
    assert_eq!(output.diagnostics, vec![Diagnostic::EmptyCatalog]);
}

#[test]
fn very_wide_window_accepts_every_instant() {
    let params = SelectionParams {
        n_anchors: 2,
        window_days: 200_000_000,
        ..year_2021()
    };
    params.validate().unwrap();
    let scenes = vec![scene("only", "T1", "2021-05-05T10:00:00Z", 3.0, (-1.0, 11.0))];

    let output = select_time_series(&aoi(), &scenes, &params).unwrap();

    assert_eq!(output.time_series.len(), 2);
    assert!(output.time_series.iter().all(|row| row.tile_ids == "only"));
}

#[test]
fn ranking_reports_an_exhausted_budget() {
    let params = SelectionParams {
        anchor_timeout_ms: Some(0),
        ..year_2021()
    };
    let scenes = vec![scene("only", "T1", "2021-05-05T10:00:00Z", 3.0, (-1.0, 11.0))];
    let anchor = NaiveDate::from_ymd_opt(2021, 5, 5).unwrap();

    let err = rank_candidates_for_anchor(&aoi(), &scenes, &params, anchor, 5).unwrap_err();
    assert!(matches!(err, Error::AnchorTimedOut { anchor_date } if anchor_date == anchor));
}
