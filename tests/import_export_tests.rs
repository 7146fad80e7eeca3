use chrono::NaiveDate;
use roadmap_tool::persistence::{
    PersistenceError, load_roadmap_from_csv_dir, load_roadmap_from_json, load_tasks_from_csv,
    load_workstreams_from_csv, save_roadmap_to_csv_dir, save_roadmap_to_json, save_tasks_to_csv,
};
use roadmap_tool::{Roadmap, Settings, Task, TaskStatus, TaskType, Workstream};
use std::fs;
use tempfile::{NamedTempFile, tempdir};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_sample_roadmap() -> Roadmap {
    let mut settings = Settings::with_range(d(2025, 1, 1), d(2025, 12, 31));
    settings.chart_title = "Export Roadmap".into();
    settings.chart_subtitle = Some("Testing persistence helpers".into());
    settings.include_out_of_range = true;

    let mut roadmap = Roadmap::new_with_settings(settings);
    roadmap
        .upsert_workstream(Workstream::new("Platform").with_order(2).with_color("#336699"))
        .unwrap();
    roadmap
        .upsert_workstream(Workstream::new("Finance").with_order(1))
        .unwrap();

    let mut design = Task::new("T1", "Platform", "Design, phase 1", d(2025, 1, 6), d(2025, 2, 14))
        .with_status(TaskStatus::Done);
    design.owner = Some("Dana".into());
    design.description = Some("Initial \"design\" sprint".into());
    design.hyperlink = Some("https://example.com/t1".into());
    roadmap.upsert_task(design).unwrap();

    let mut launch = Task::milestone("T2", "Platform", "Launch", d(2025, 3, 3));
    launch.color_override = Some("#ff0000".into());
    roadmap.upsert_task(launch).unwrap();

    roadmap
        .upsert_task(Task::new("T3", "Finance", "Budget", d(2025, 1, 1), d(2025, 3, 31)))
        .unwrap();
    roadmap
}

#[test]
fn json_round_trip_preserves_roadmap() {
    let roadmap = build_sample_roadmap();
    let tmp = NamedTempFile::new().unwrap();
    save_roadmap_to_json(&roadmap, tmp.path()).unwrap();
    let loaded = load_roadmap_from_json(tmp.path()).unwrap();
    assert_eq!(loaded, roadmap);
    assert_eq!(loaded.settings().chart_title, "Export Roadmap");
    assert!(loaded.settings().include_out_of_range);
}

#[test]
fn csv_round_trip_preserves_records() {
    let roadmap = build_sample_roadmap();
    let dir = tempdir().unwrap();
    save_roadmap_to_csv_dir(&roadmap, dir.path()).unwrap();

    let loaded = load_roadmap_from_csv_dir(roadmap.settings().clone(), dir.path()).unwrap();
    assert_eq!(loaded.workstreams(), roadmap.workstreams());
    assert_eq!(loaded.tasks(), roadmap.tasks());

    let t2 = loaded.find_task("T2").unwrap();
    assert_eq!(t2.task_type, TaskType::Milestone);
    assert_eq!(t2.color_override.as_deref(), Some("#ff0000"));
}

#[test]
fn csv_headers_match_template() {
    let roadmap = build_sample_roadmap();
    let dir = tempdir().unwrap();
    save_roadmap_to_csv_dir(&roadmap, dir.path()).unwrap();

    let workstreams = fs::read_to_string(dir.path().join("workstreams.csv")).unwrap();
    assert_eq!(workstreams.lines().next(), Some("workstream,order,color"));

    let tasks = fs::read_to_string(dir.path().join("tasks.csv")).unwrap();
    assert_eq!(
        tasks.lines().next(),
        Some(
            "id,workstream,title,description,start_date,end_date,status,owner,color_override,type,hyperlink"
        )
    );
    assert!(tasks.contains("2025-01-06"));
}

#[test]
fn hand_written_csv_with_blank_columns_loads() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("workstreams.csv"),
        "workstream,order,color\nIT,,\nHR,1,#00aa00\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("tasks.csv"),
        "id,workstream,title,description,start_date,end_date,status,owner,color_override,type,hyperlink\n\
         A,IT,Upgrade,,2025-02-01,2025-02-20,planned,,,,\n\
         B,HR,Review,,2025-04-01,2025-04-01,,,,milestone,\n",
    )
    .unwrap();

    let workstreams = load_workstreams_from_csv(dir.path().join("workstreams.csv")).unwrap();
    assert_eq!(workstreams[0], Workstream::new("IT"));
    assert_eq!(workstreams[1].order, Some(1));

    let tasks = load_tasks_from_csv(dir.path().join("tasks.csv")).unwrap();
    assert_eq!(tasks[0].status, Some(TaskStatus::Planned));
    assert_eq!(tasks[0].description, None);
    assert_eq!(tasks[0].task_type, TaskType::Block);
    assert_eq!(tasks[1].status, None);
    assert!(tasks[1].is_milestone());

    let roadmap = load_roadmap_from_csv_dir(Settings::default(), dir.path()).unwrap();
    let names: Vec<String> = roadmap
        .ordered_workstreams()
        .into_iter()
        .map(|ws| ws.name)
        .collect();
    assert_eq!(names, vec!["IT".to_string(), "HR".to_string()]);
}

#[test]
fn csv_with_inverted_dates_is_rejected() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        "id,workstream,title,description,start_date,end_date,status,owner,color_override,type,hyperlink\n\
         A,IT,Broken,,2025-03-10,2025-03-01,,,,,\n",
    )
    .unwrap();
    let err = load_tasks_from_csv(tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_with_bad_date_is_rejected() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        "id,workstream,title,description,start_date,end_date,status,owner,color_override,type,hyperlink\n\
         A,IT,Broken,,03/10/2025,2025-03-11,,,,,\n",
    )
    .unwrap();
    let err = load_tasks_from_csv(tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(msg) if msg.contains("invalid date")));
}

#[test]
fn saving_invalid_tasks_fails() {
    let tmp = NamedTempFile::new().unwrap();
    let tasks = vec![Task::new("", "IT", "No id", d(2025, 1, 1), d(2025, 1, 2))];
    let err = save_tasks_to_csv(&tasks, tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn json_with_unknown_workstream_is_rejected() {
    let tmp = NamedTempFile::new().unwrap();
    let json = r#"{
        "settings": {
            "chart_title": "Broken",
            "overall_start_date": "2025-01-01",
            "overall_end_date": "2025-12-31"
        },
        "workstreams": [{"name": "IT"}],
        "tasks": [{
            "id": "A",
            "workstream": "Ghost",
            "title": "Orphan",
            "start_date": "2025-02-01",
            "end_date": "2025-02-02"
        }]
    }"#;
    fs::write(tmp.path(), json).unwrap();
    let err = load_roadmap_from_json(tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(msg) if msg.contains("Ghost")));
}
