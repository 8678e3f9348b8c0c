//! End-to-end tests: CSV extracts → INSERT scripts → SQLite.
//!
//! These tests:
//! 1. Write a small set of extracts (with a preamble, NULL tokens, quoted
//!    fields, an airport row that cannot be named) into a temp directory
//! 2. Run the full pipeline and load every generated script into SQLite
//! 3. Compare what SQLite decoded against the source rows
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use accidents_sql::config::Config;
use accidents_sql::orchestrator::{run_steps, SuiteRunner};
use accidents_sql::parser::{read_source, SourceLayout};
use accidents_sql::pipeline::{Pipeline, Step};
use accidents_sql::schema::ALL_TABLES;
use accidents_sql::ui::SilentUi;
use accidents_sql::writer::load_sql_files;

// =============================================================================
// Test Configuration
// =============================================================================

/// Number of random samples per table
const SAMPLE_SIZE: usize = 3;

/// Random seed for reproducible sampling
const RANDOM_SEED: u64 = 42;

const AIRPORTS: &str = "\
Airport_Code,Timezone,Airport_Name
KCMH,US/Eastern,
KATT,US/Central,
KATT,US/Central,
KZZZ,US/Pacific,
KDAY,US/Eastern,Dayton Intl
KCMH,US/Eastern,
";

const AIRPORT_DATABASE: &str = "\
id,ident,type,name,gps_code
3486,KCMH,large_airport,John Glenn Columbus International Airport,KCMH
3500,KDAY,medium_airport,James M Cox Dayton International Airport,KDAY
";

const WEATHER_CONDITIONS: &str = "\
WEATHER_CONDITIONS
Description*
Fair
Cloudy
Fair
Rain
Cloudy
Fair
";

const DAY_PERIODS: &str = "\
DAY_PERIODS
Sunrise_Sunset*,Civil_Twilight*,Nautical_Twilight*,Astronomical_Twilight*
Day,Day,Day,Day
Night,Night,Night,Night
Day,Day,Day,Day
Night,Day,Day,Day
Night,Night,Night,Night
Day,Day,Day,Day
";

const WEATHER: &str = "\
WEATHER
Weather_Timestamp*,Temperature(F),Humidity(%),Pressure(in),Visibility(mi),Wind_Direction,Wind_Speed(mph),Precipitation(in),Weather_Condition_ID,Day_Period_ID
2016-02-08 05:46:00-05:00,36.9,91,29.68,10,Calm,,0.02,,
2016-02-08 06:07:59,37.9,100,29.65,10,Calm,,,,
2016-02-08 06:49:00-05:00,36,100,29.67,10,SW,3.5,NULL,,
2016-02-08 07:23:00,35.1,96,29.64,9,SW,4.6,,,
2016-02-08 07:39:00,36,89,29.65,6,SSW,3.5,0.01,,
not a date,abc,89,29.65,6,SSW,3.5,0.01,,
";

const LOCATIONS: &str = "\
LOCATIONS
Original_ID*,Street,City,County,State,Zipcode,Country,Airport_Code
1,2 O'Neil St,Columbus,Franklin,OH,43215-1234,US,
2,Brice Rd,Reynoldsburg,Franklin,OH,43068,US,
3,State Route 32,Williamsburg,Clermont,OH,45176,US,
4,I-75 S,Dayton,Montgomery,OH,45417,US,
5,Miamisburg Centerville Rd,Dayton,Montgomery,OH,45459-4717,US,
6,\"Westerville Rd, Suite 2\",Columbus,Franklin,OH,43224,US,
";

const ROAD_FEATURES: &str = "\
ROAD_FEATURES
Feature_ID*,Amenity,Bump,Crossing,Give_Way,Junction,No_Exit,Railway,Roundabout,Station,Stop,Traffic_Calming,Traffic_Signal,Turning_Loop
1,False,False,False,False,False,False,False,False,False,False,False,False,False
2,True,False,False,False,False,False,False,False,False,False,False,False,False
3,False,False,False,False,False,False,False,False,False,False,False,False,False
4,False,False,False,False,True,False,False,False,False,False,False,False,False
5,False,False,TRUE,False,False,False,False,False,False,False,False,False,False
6,T,False,False,False,False,False,False,False,False,False,False,False,False
";

const ACCIDENTS: &str = "\
Accident_ID*,Severity,Start_Time,End_Time,Distance(mi),Description,Location_ID**,Feature_ID*,Weather_ID**,Year
A-1,3,2016-02-08 05:46:00-05:00,2016-02-08 11:00:00-05:00,1.0,\"Right lane blocked, I-70\",,,,2016
A-2,2,2016-02-08 06:07:59,2016-02-08 06:37:59,0.01,Accident on Brice Rd.,,,,2016
A-3,2,2016-02-08 06:49:27,2016-02-08 07:19:27,0,Lane blocked,,,,2016
A-4,3,2016-02-08 07:23:34,2016-02-08 07:53:34,0,Removed row,,,,2016
A-5,high,2016-02-08 07:39:07,2016-02-08 08:09:07,0.5,It's closed,,,,2016
A-6,2,2016-02-08 07:44:26,2016-02-08 08:14:26,2.25,Off ramp,,,,2017
";

/// Write the extracts under `dir` and return a config rooted there
fn write_fixture(dir: &Path) -> Config {
    let config = Config::default_for(dir);

    let paths = config.paths.clone();
    let files = [
        (&paths.airports_raw, AIRPORTS),
        (&paths.airports_database, AIRPORT_DATABASE),
        (&paths.weather_conditions.raw, WEATHER_CONDITIONS),
        (&paths.day_periods.raw, DAY_PERIODS),
        (&paths.weather.raw, WEATHER),
        (&paths.locations.raw, LOCATIONS),
        (&paths.road_features.raw, ROAD_FEATURES),
        (&paths.accidents.raw, ACCIDENTS),
    ];
    for (path, contents) in files {
        let path = config.resolve(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }

    config
}

fn run_all(config: &Config) {
    let mut pipeline = Pipeline::new(config.clone());
    run_steps(&mut pipeline, &Step::ALL, &mut SilentUi::new()).expect("Pipeline failed");
}

// =============================================================================
// Shared Test Database
// =============================================================================

/// Shared test database - generated and loaded once, reused by all tests
static TEST_DB: Lazy<Mutex<TestDatabase>> = Lazy::new(|| Mutex::new(TestDatabase::new()));

struct TestDatabase {
    _dir: TempDir,
    config: Config,
    db_path: PathBuf,
}

impl TestDatabase {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = write_fixture(dir.path());
        run_all(&config);

        let db_path = dir.path().join("accidents.db");
        load_sql_files(&db_path, &config, None, &mut SilentUi::new())
            .expect("Failed to load scripts into SQLite");

        Self {
            _dir: dir,
            config,
            db_path,
        }
    }

    fn connection(&self) -> Connection {
        Connection::open(&self.db_path).expect("Failed to open test database")
    }
}

fn get_test_db() -> Connection {
    TEST_DB.lock().unwrap().connection()
}

fn get_config() -> Config {
    TEST_DB.lock().unwrap().config.clone()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0))
        .unwrap_or_else(|e| panic!("{} failed: {}", sql, e))
}

// =============================================================================
// Preprocessing
// =============================================================================

#[test]
fn test_unnamed_airport_row_removed_everywhere() {
    let config = get_config();

    let removed = fs::read_to_string(config.resolve(&config.paths.removed_indices)).unwrap();
    assert_eq!(removed, "3\n");

    let conditions = fs::read_to_string(config.resolve(&config.paths.weather_conditions.filtered))
        .unwrap();
    assert!(conditions.starts_with("WEATHER_CONDITIONS\nDescription*\n"));
    assert!(!conditions.contains("Rain"));

    let accidents = fs::read_to_string(config.resolve(&config.paths.accidents.filtered)).unwrap();
    assert!(accidents.starts_with("Accident_ID*,"));
    assert!(!accidents.contains("Removed row"));
}

#[test]
fn test_repeated_airports_named() {
    let config = get_config();
    let named = read_source(
        &config.resolve(&config.paths.airports_repeated_named),
        &SourceLayout::header(),
    )
    .unwrap();

    assert_eq!(named.len(), 2);
    assert_eq!(named.get(0, "Airport_Code"), Some("KATT"));
    assert_eq!(
        named.get(0, "Airport_Name"),
        Some("Central City Municipal - Larry Reineke Field")
    );
    assert_eq!(named.get(1, "Airport_Code"), Some("KCMH"));
    assert_eq!(named.get(1, "Occurrences"), Some("2"));
    assert_eq!(
        named.get(1, "Airport_Name"),
        Some("John Glenn Columbus International Airport")
    );
}

// =============================================================================
// Table contents
// =============================================================================

#[test]
fn test_row_counts() {
    let conn = get_test_db();
    let expected = [
        ("WEATHER_CONDITIONS", 2),
        ("WEATHER_CONDITIONS_EVENTS", 5),
        ("DAY_PERIODS", 2),
        ("PERIOD_EVENTS", 5),
        ("WEATHER", 5),
        ("AIRPORTS", 3),
        ("location", 5),
        ("ROAD_FEATURES", 3),
        ("ACCIDENTS", 5),
    ];
    assert_eq!(expected.len(), ALL_TABLES.len());

    for (table, rows) in expected {
        assert_eq!(
            count(&conn, &format!("SELECT COUNT(*) FROM {}", table)),
            rows,
            "row count of {}",
            table
        );
    }
}

#[test]
fn test_ids_are_contiguous() {
    let conn = get_test_db();
    for table in ALL_TABLES.iter().filter(|t| t.primary_key == Some("id")) {
        let total = count(&conn, &format!("SELECT COUNT(*) FROM {}", table.name));
        let min = count(&conn, &format!("SELECT COALESCE(MIN(id), 1) FROM {}", table.name));
        let max = count(&conn, &format!("SELECT COALESCE(MAX(id), 0) FROM {}", table.name));
        assert_eq!((min, max), (1, total), "ids of {} should be 1..={}", table.name, total);
    }
}

#[test]
fn test_dimension_tuples_unique() {
    let conn = get_test_db();
    let checks = [
        "SELECT COUNT(*) FROM (SELECT DISTINCT Description FROM WEATHER_CONDITIONS)",
        "SELECT COUNT(*) FROM (SELECT DISTINCT Sunrise_Sunset, Civil_Twilight, \
         Nautical_Twilight, Astronomical_Twilight FROM DAY_PERIODS)",
        "SELECT COUNT(*) FROM (SELECT DISTINCT Amenity, Bump, Crossing, Give_Way, Junction, \
         No_Exit, Railway, Roundabout, Station, Stop, Traffic_Calming, Traffic_Signal, \
         Turning_Loop FROM ROAD_FEATURES)",
        "SELECT COUNT(*) FROM (SELECT DISTINCT Airport_Code, Name, Timezone FROM AIRPORTS)",
    ];
    let tables = ["WEATHER_CONDITIONS", "DAY_PERIODS", "ROAD_FEATURES", "AIRPORTS"];

    for (sql, table) in checks.iter().zip(tables) {
        assert_eq!(
            count(&conn, sql),
            count(&conn, &format!("SELECT COUNT(*) FROM {}", table)),
            "{} has duplicate tuples",
            table
        );
    }
}

#[test]
fn test_weather_links_follow_row_position() {
    let conn = get_test_db();
    let mut stmt = conn
        .prepare(
            "SELECT c.Description, p.Sunrise_Sunset FROM WEATHER w \
             JOIN WEATHER_CONDITIONS c ON c.id = w.Weather_Condition_ID \
             JOIN DAY_PERIODS p ON p.id = w.Day_Period_ID ORDER BY w.id",
        )
        .unwrap();
    let rows: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        rows,
        vec![
            ("Fair".to_string(), "Day".to_string()),
            ("Cloudy".to_string(), "Night".to_string()),
            ("Fair".to_string(), "Day".to_string()),
            ("Cloudy".to_string(), "Night".to_string()),
            ("Fair".to_string(), "Day".to_string()),
        ]
    );
}

#[test]
fn test_weather_conversions() {
    let conn = get_test_db();

    let (timestamp, precipitation): (String, f64) = conn
        .query_row(
            "SELECT Weather_Timestamp, Precipitation FROM WEATHER WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(timestamp, "2016-02-08 05:46:00");
    assert!((precipitation - 0.02).abs() < 1e-9);

    // Missing precipitation is stored as zero
    let precipitation: f64 = conn
        .query_row("SELECT Precipitation FROM WEATHER WHERE id = 2", [], |row| row.get(0))
        .unwrap();
    assert_eq!(precipitation, 0.0);

    // Unparseable values become NULL
    let (timestamp, temperature): (Option<String>, Option<f64>) = conn
        .query_row(
            "SELECT Weather_Timestamp, Temperature FROM WEATHER WHERE id = 5",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(timestamp, None);
    assert_eq!(temperature, None);
}

#[test]
fn test_locations() {
    let conn = get_test_db();
    let mut stmt = conn
        .prepare("SELECT Street, Zipcode, Airport_Code FROM location ORDER BY id")
        .unwrap();
    let rows: Vec<(String, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].0, "2 O'Neil St");
    assert_eq!(rows[0].1, "43215");
    assert_eq!(rows[3].1, "45459");
    assert_eq!(rows[4].0, "Westerville Rd, Suite 2");

    let codes: Vec<&str> = rows.iter().map(|r| r.2.as_str()).collect();
    assert_eq!(codes, vec!["KCMH", "KATT", "KATT", "KDAY", "KCMH"]);
}

#[test]
fn test_road_feature_flags() {
    let conn = get_test_db();
    let ids: Vec<i64> = conn
        .prepare("SELECT Feature_ID FROM ACCIDENTS ORDER BY id")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 1, 3, 2]);

    let crossing: i64 = conn
        .query_row("SELECT Crossing FROM ROAD_FEATURES WHERE id = 3", [], |row| row.get(0))
        .unwrap();
    assert_eq!(crossing, 1);
}

#[test]
fn test_accident_distance_and_times() {
    let conn = get_test_db();
    let (start, end, distance): (String, String, f64) = conn
        .query_row(
            "SELECT Start_Time, End_Time, Distance FROM ACCIDENTS WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(start, "2016-02-08 05:46:00");
    assert_eq!(end, "2016-02-08 11:00:00");
    assert!((distance - 1609.34).abs() < 1e-9);

    let distance: f64 = conn
        .query_row("SELECT Distance FROM ACCIDENTS WHERE id = 2", [], |row| row.get(0))
        .unwrap();
    assert!((distance - 16.09).abs() < 1e-9);

    // Fourth row after filtering has a non-numeric severity
    let severity: Option<i64> = conn
        .query_row("SELECT Severity FROM ACCIDENTS WHERE id = 4", [], |row| row.get(0))
        .unwrap();
    assert_eq!(severity, None);
}

#[test]
fn test_accident_links_present() {
    let conn = get_test_db();
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM ACCIDENTS WHERE Weather_ID IS NULL \
             OR Location_ID IS NULL OR Feature_ID IS NULL"
        ),
        0
    );
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM ACCIDENTS WHERE Weather_ID = id AND Location_ID = id"),
        5
    );
}

#[test]
fn test_sampled_accidents_round_trip() {
    let config = get_config();
    let conn = get_test_db();
    let source = read_source(
        &config.resolve(&config.paths.accidents.filtered),
        &SourceLayout::header(),
    )
    .unwrap();

    let positions: Vec<usize> = (0..source.len()).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);

    for &row in positions.choose_multiple(&mut rng, SAMPLE_SIZE) {
        let (description, year): (String, i64) = conn
            .query_row(
                "SELECT Description, Year FROM ACCIDENTS WHERE id = ?1",
                [row as i64 + 1],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();

        assert_eq!(Some(description.as_str()), source.get(row, "Description"));
        assert_eq!(Some(year.to_string().as_str()), source.get(row, "Year"));
    }
}

// =============================================================================
// Standalone steps
// =============================================================================

#[test]
fn test_short_event_file_pads_with_null() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());
    run_all(&config);

    // Keep only the first two road feature events, then rerun accidents alone
    let events = config.resolve(&config.paths.road_features_events);
    let kept: Vec<String> = fs::read_to_string(&events)
        .unwrap()
        .lines()
        .take(3)
        .map(str::to_string)
        .collect();
    fs::write(&events, kept.join("\n") + "\n").unwrap();

    let mut pipeline = Pipeline::new(config.clone());
    pipeline
        .run_step(Step::Accidents, &mut SilentUi::new())
        .unwrap();

    let db_path = dir.path().join("padded.db");
    load_sql_files(&db_path, &config, None, &mut SilentUi::new()).unwrap();
    let conn = Connection::open(&db_path).unwrap();

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM ACCIDENTS"), 5);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM ACCIDENTS WHERE Feature_ID IS NULL"),
        3
    );
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM ACCIDENTS WHERE Weather_ID IS NOT NULL"),
        5
    );
}

#[test]
fn test_all_empty_rows_keep_their_position() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    // The unnamed airport row becomes entirely empty; it must still be row 3
    let airports = AIRPORTS.replace("KZZZ,US/Pacific,\n", ",,\n");
    fs::write(config.resolve(&config.paths.airports_raw), airports).unwrap();

    // Second day period row has no values at all
    let periods = DAY_PERIODS.replacen("Night,Night,Night,Night\n", ",,,\n", 1);
    fs::write(config.resolve(&config.paths.day_periods.raw), periods).unwrap();

    run_all(&config);

    let removed = fs::read_to_string(config.resolve(&config.paths.removed_indices)).unwrap();
    assert_eq!(removed, "3\n");

    let db_path = dir.path().join("empty_rows.db");
    load_sql_files(&db_path, &config, None, &mut SilentUi::new()).unwrap();
    let conn = Connection::open(&db_path).unwrap();

    // One event per filtered source row, the empty one included
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM PERIOD_EVENTS"), 5);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM DAY_PERIODS"), 3);
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM DAY_PERIODS WHERE Sunrise_Sunset IS NULL \
             AND Civil_Twilight IS NULL AND Nautical_Twilight IS NULL \
             AND Astronomical_Twilight IS NULL"
        ),
        1
    );

    // Weather row N points at the period of event N
    let links: Vec<(i64, Option<i64>, Option<i64>)> = conn
        .prepare(
            "SELECT w.id, w.Day_Period_ID, e.day_period_id FROM WEATHER w \
             LEFT JOIN PERIOD_EVENTS e ON e.Event_ID = w.id ORDER BY w.id",
        )
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(links.len(), 5);
    for (id, weather_period, event_period) in &links {
        assert!(weather_period.is_some(), "weather row {} lost its period", id);
        assert_eq!(weather_period, event_period, "weather row {}", id);
    }
    let periods: Vec<i64> = links.iter().filter_map(|l| l.1).collect();
    assert_eq!(periods, vec![1, 2, 1, 3, 1]);
}

#[test]
fn test_batches_of_500() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default_for(dir.path());

    let mut csv = String::from("WEATHER_CONDITIONS\nDescription*\n");
    for i in 0..501 {
        csv.push_str(&format!("Condition {}\n", i));
    }
    let source = config.resolve(&config.paths.weather_conditions.filtered);
    fs::create_dir_all(source.parent().unwrap()).unwrap();
    fs::write(&source, csv).unwrap();

    let mut pipeline = Pipeline::new(config.clone());
    let report = pipeline
        .run_step(Step::WeatherConditions, &mut SilentUi::new())
        .unwrap();
    assert_eq!(report.outputs[0].rows, 501);

    let sql = fs::read_to_string(config.resolve(&config.paths.weather_conditions_sql)).unwrap();
    assert!(sql.starts_with("-- INSERT statements for WEATHER_CONDITIONS table\n-- Total records: 501\n"));
    assert_eq!(sql.matches("INSERT INTO WEATHER_CONDITIONS (").count(), 2);

    let db_path = dir.path().join("batches.db");
    load_sql_files(&db_path, &config, None, &mut SilentUi::new()).unwrap();
    let conn = Connection::open(&db_path).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM WEATHER_CONDITIONS"), 501);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM WEATHER_CONDITIONS_EVENTS"), 501);
}

#[test]
fn test_suite_matches_in_process_run() {
    let in_process = tempfile::tempdir().unwrap();
    let config = write_fixture(in_process.path());
    run_all(&config);

    let separate = tempfile::tempdir().unwrap();
    let suite_config = write_fixture(separate.path());
    let config_path = separate.path().join("config.json");
    fs::write(&config_path, suite_config.to_json().unwrap()).unwrap();

    SuiteRunner::with_executable(env!("CARGO_BIN_EXE_accidents-sql"), Some(config_path))
        .run(&Step::ALL)
        .expect("Suite failed");

    for table in ALL_TABLES {
        let ours = config.table_sql(table.name).unwrap();
        let theirs = suite_config.table_sql(table.name).unwrap();
        assert_eq!(
            fs::read_to_string(&ours).unwrap(),
            fs::read_to_string(&theirs).unwrap(),
            "{} differs between the in-process run and the suite",
            table.name
        );
    }
}
